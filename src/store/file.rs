//! File-backed installation store.
//!
//! Layout: `<root>/<domain>.json`, one document per installed domain. A `:`
//! in the domain (port separator) is written as `+`, which cannot appear in a
//! valid domain, so file names stay unambiguous.
//!
//! The app token handed to [`InstallationStore::save_installation`] is not
//! written: it is only needed for the install handshake itself. Documents are
//! created readable by their owner only.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fsync::write_atomic;
use super::{InstallationStore, StoreError};
use crate::types::{AppToken, DomainName, WebhookData};

/// The document persisted for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredInstallation {
    pub domain: DomainName,
    pub webhook: WebhookData,
    pub installed_at: DateTime<Utc>,
}

/// Stores each domain's installation as a JSON file under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `domain`.
    pub fn path_for(&self, domain: &DomainName) -> PathBuf {
        self.root
            .join(format!("{}.json", domain.as_str().replace(':', "+")))
    }

    /// Loads the full stored document for `domain`, if any.
    pub async fn load(&self, domain: &DomainName) -> Result<Option<StoredInstallation>, StoreError> {
        let path = self.path_for(domain);
        run_blocking(move || load_document(&path)).await
    }
}

fn load_document(path: &Path) -> Result<Option<StoredInstallation>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Io(io::Error::other(e)))?
}

impl InstallationStore for FileStore {
    async fn save_installation(
        &self,
        domain: &DomainName,
        _token: &AppToken,
        data: &WebhookData,
    ) -> Result<(), StoreError> {
        let document = StoredInstallation {
            domain: domain.clone(),
            webhook: data.clone(),
            installed_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;
        let path = self.path_for(domain);

        debug!(domain = %domain, path = %path.display(), "Saving installation");
        run_blocking(move || write_atomic(&path, &bytes).map_err(StoreError::from)).await
    }

    async fn load_webhook_data(
        &self,
        domain: &DomainName,
    ) -> Result<Option<WebhookData>, StoreError> {
        Ok(self.load(domain).await?.map(|doc| doc.webhook))
    }
}
