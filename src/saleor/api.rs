//! Collaborator traits for talking to a Saleor instance.
//!
//! The installer only needs to open a session for one domain and run GraphQL
//! operations through it. Keeping that behind traits lets tests substitute a
//! scripted session for the HTTP client.
//!
//! A session is released when it is dropped; the installer drops its session
//! before `install` returns on every path.

use std::future::Future;

use serde_json::Value;

use super::error::TransportError;
use crate::types::AppToken;

/// An authenticated session against one Saleor instance.
///
/// # Example (stand-in for testing)
///
/// ```ignore
/// struct CannedSession(Value);
///
/// impl RemoteApi for CannedSession {
///     async fn execute(&self, _operation: &str, _variables: Value) -> Result<Value, TransportError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait RemoteApi {
    /// Runs one GraphQL operation and returns its `data` object.
    fn execute(
        &self,
        operation: &str,
        variables: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Opens sessions scoped to a base URL and a bearer token.
pub trait RemoteConnector: Send + Sync {
    type Session: RemoteApi + Send + Sync;

    /// Opens a session for `base_url` (e.g. `https://shop.example`).
    fn connect(&self, base_url: &str, token: &AppToken) -> Result<Self::Session, TransportError>;
}
