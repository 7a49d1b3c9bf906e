//! Install endpoint.
//!
//! Saleor calls this once per installation with a fresh app token. The
//! handler validates the caller, runs the installer, and persists the result.
//! The signing secret is sent to Saleor and to the store, never back in the
//! response.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::{AppState, saleor_header};
use crate::install::InstallError;
use crate::saleor::RemoteConnector;
use crate::store::{DomainValidator, InstallationStore, StoreError};
use crate::types::{AppToken, DomainName, InvalidDomain, WebhookId};
use crate::webhooks::gateway::HEADER_DOMAIN;

/// Request body Saleor posts to the install endpoint.
#[derive(Debug, Deserialize)]
pub struct InstallPayload {
    pub auth_token: String,
}

/// Response body for a successful install.
#[derive(Debug, Serialize)]
pub struct InstallResponse {
    pub webhook_id: WebhookId,
}

/// Errors that end an install request.
#[derive(Debug, Error)]
pub enum InstallEndpointError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("invalid domain: {0}")]
    InvalidDomain(#[from] InvalidDomain),

    #[error("domain not allowed")]
    DomainRejected,

    #[error("missing app token")]
    EmptyToken,

    #[error("installation failed: {0}")]
    Install(#[from] InstallError),

    #[error("failed to save installation: {0}")]
    Save(#[from] StoreError),
}

impl IntoResponse for InstallEndpointError {
    fn into_response(self) -> Response {
        let status = match &self {
            InstallEndpointError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            InstallEndpointError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            InstallEndpointError::InvalidDomain(_)
            | InstallEndpointError::DomainRejected
            | InstallEndpointError::EmptyToken => StatusCode::FORBIDDEN,
            // Per-target details are logged; Saleor gets a generic message.
            InstallEndpointError::Install(_) => {
                return (StatusCode::FORBIDDEN, "Incorrect token or not enough permissions")
                    .into_response();
            }
            InstallEndpointError::Save(_) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save installation")
                    .into_response();
            }
        };

        (status, self.to_string()).into_response()
    }
}

/// Install handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers: `saleor-domain` (or legacy `x-saleor-domain`)
/// - Body: `{"auth_token": "..."}`. The token may be empty when a development
///   token is configured on the installer.
///
/// # Response
///
/// - 200 OK: `{"webhook_id": "..."}`
/// - 400 Bad Request: Missing header or malformed body
/// - 403 Forbidden: Domain invalid or not allowed, empty token, or Saleor
///   refused to create the webhooks
/// - 500 Internal Server Error: The installation could not be saved
pub async fn install_handler<V, S, C>(
    State(app_state): State<AppState<V, S, C>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InstallResponse>, InstallEndpointError>
where
    V: DomainValidator,
    S: InstallationStore,
    C: RemoteConnector,
{
    let raw_domain =
        saleor_header(&headers, HEADER_DOMAIN).ok_or(InstallEndpointError::MissingHeader(HEADER_DOMAIN))?;
    let payload: InstallPayload = serde_json::from_slice(&body)?;

    debug!(domain = %raw_domain, "Received install request");

    let domain = DomainName::parse(&raw_domain).inspect_err(|e| {
        warn!(domain = %raw_domain, error = %e, "Install from malformed domain");
    })?;

    if !app_state.validator().validate_domain(&domain).await {
        warn!(domain = %domain, "Install from rejected domain");
        return Err(InstallEndpointError::DomainRejected);
    }

    let request = app_state.install_request(domain.clone(), AppToken::new(payload.auth_token));
    let token = app_state.installer().auth_token(&request);
    if token.is_empty() {
        warn!(domain = %domain, "Install request without app token");
        return Err(InstallEndpointError::EmptyToken);
    }

    let data = app_state.installer().install(&request).await?;

    if let Err(e) = app_state.store().save_installation(&domain, token, &data).await {
        error!(domain = %domain, webhook_id = %data.webhook_id, error = %e, "Failed to save installation");
        return Err(e.into());
    }

    info!(domain = %domain, webhook_id = %data.webhook_id, "Installation saved");

    Ok(Json(InstallResponse {
        webhook_id: data.webhook_id,
    }))
}
