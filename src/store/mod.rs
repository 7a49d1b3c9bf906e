//! Per-domain persistence and domain validation.
//!
//! The installer and the dispatch gateway never own installation data. They
//! reach it through two collaborator traits:
//!
//! - [`DomainValidator`] decides whether a domain may install or deliver at all.
//! - [`InstallationStore`] saves the [`WebhookData`] produced by an install and
//!   loads it back when a webhook arrives.
//!
//! Implementations provided here:
//! - [`MemoryStore`]: process-local, for development and tests
//! - [`FileStore`]: one JSON document per domain, written atomically
//! - [`AllowList`]: a fixed set of allowed domains

mod allow;
mod file;
mod fsync;
mod memory;

use std::future::Future;
use std::io;

use thiserror::Error;

use crate::types::{AppToken, DomainName, WebhookData};

pub use allow::AllowList;
pub use file::{FileStore, StoredInstallation};
pub use memory::MemoryStore;

/// Errors from a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decides whether requests claiming to come from a domain are trusted.
///
/// Called before an install is attempted and before a delivery's secret is
/// looked up. Returning `false` rejects the request without further work.
pub trait DomainValidator: Send + Sync {
    fn validate_domain(&self, domain: &DomainName) -> impl Future<Output = bool> + Send;
}

/// Durable storage of installation data, keyed by domain.
pub trait InstallationStore: Send + Sync {
    /// Persists the result of a successful install.
    ///
    /// Called at most once per successful install and never after a failed
    /// one. Replaces any data previously stored for the domain.
    fn save_installation(
        &self,
        domain: &DomainName,
        token: &AppToken,
        data: &WebhookData,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Loads the data saved for a domain, or `None` if it was never installed.
    fn load_webhook_data(
        &self,
        domain: &DomainName,
    ) -> impl Future<Output = Result<Option<WebhookData>, StoreError>> + Send;
}
