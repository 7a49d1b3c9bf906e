//! Manifest endpoint.

use axum::Json;
use axum::extract::State;

use super::AppState;
use crate::saleor::RemoteConnector;
use crate::store::{DomainValidator, InstallationStore};
use crate::types::Manifest;

/// `GET /configuration/manifest`: the app manifest as camelCase JSON.
pub async fn manifest_handler<V, S, C>(State(app_state): State<AppState<V, S, C>>) -> Json<Manifest>
where
    V: DomainValidator,
    S: InstallationStore,
    C: RemoteConnector,
{
    Json(app_state.manifest().clone())
}
