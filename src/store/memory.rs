//! Process-local installation store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{InstallationStore, StoreError};
use crate::types::{AppToken, DomainName, WebhookData};

/// Keeps installations in memory. Data is lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    installations: Arc<RwLock<HashMap<DomainName, WebhookData>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.installations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.installations.read().await.is_empty()
    }
}

impl InstallationStore for MemoryStore {
    async fn save_installation(
        &self,
        domain: &DomainName,
        _token: &AppToken,
        data: &WebhookData,
    ) -> Result<(), StoreError> {
        self.installations
            .write()
            .await
            .insert(domain.clone(), data.clone());
        Ok(())
    }

    async fn load_webhook_data(
        &self,
        domain: &DomainName,
    ) -> Result<Option<WebhookData>, StoreError> {
        Ok(self.installations.read().await.get(domain).cloned())
    }
}
