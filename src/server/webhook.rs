//! Webhook endpoint handler.
//!
//! Collects the Saleor headers and raw body into an [`InboundEvent`] and
//! hands it to the dispatch gateway. The gateway's outcome decides the status.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::{AppState, saleor_header};
use crate::saleor::RemoteConnector;
use crate::store::{DomainValidator, InstallationStore};
use crate::webhooks::gateway::{HEADER_DOMAIN, HEADER_EVENT, HEADER_SIGNATURE};
use crate::webhooks::{DispatchOutcome, InboundEvent};

impl IntoResponse for DispatchOutcome {
    fn into_response(self) -> Response {
        match self {
            DispatchOutcome::MissingHeader(name) => (
                StatusCode::BAD_REQUEST,
                format!("missing required header: {}", name),
            )
                .into_response(),
            DispatchOutcome::UnknownDomain => {
                (StatusCode::NOT_FOUND, "Unknown domain").into_response()
            }
            DispatchOutcome::SignatureInvalid => {
                (StatusCode::UNAUTHORIZED, "Invalid signature").into_response()
            }
            DispatchOutcome::UnknownEvent(event_type) => (
                StatusCode::NOT_FOUND,
                format!("unknown event: {}", event_type),
            )
                .into_response(),
            DispatchOutcome::InvalidPayload(e) => {
                (StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e)).into_response()
            }
            DispatchOutcome::LookupFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load webhook data").into_response()
            }
            DispatchOutcome::Dispatched(Ok(reply)) => match reply.body {
                Some(body) => (StatusCode::OK, Json(body)).into_response(),
                None => StatusCode::OK.into_response(),
            },
            DispatchOutcome::Dispatched(Err(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Handler failed").into_response()
            }
        }
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers (legacy `x-` prefixed names also accepted):
///   - `saleor-domain`: The Saleor instance sending the event
///   - `saleor-event`: Event type (e.g., "order_created")
///   - `saleor-signature`: Hex HMAC-SHA256 of the body
/// - Body: JSON event payload
///
/// # Response
///
/// - 200 OK: Handler ran; body is the handler's JSON reply, if any
/// - 400 Bad Request: Missing header or body is not JSON
/// - 401 Unauthorized: Invalid signature
/// - 404 Not Found: Unknown domain, or no handler for the event
/// - 500 Internal Server Error: Secret lookup or handler failure
///
/// # Example
///
/// ```ignore
/// POST /webhook HTTP/1.1
/// Saleor-Domain: shop.example
/// Saleor-Event: order_created
/// Saleor-Signature: 5d41402abc4b2a76b9719d911017c592...
/// Content-Type: application/json
///
/// {"order": {"id": "T3JkZXI6MQ=="}}
///
/// HTTP/1.1 200 OK
/// ```
pub async fn webhook_handler<V, S, C>(
    State(app_state): State<AppState<V, S, C>>,
    headers: HeaderMap,
    body: Bytes,
) -> DispatchOutcome
where
    V: DomainValidator,
    S: InstallationStore,
    C: RemoteConnector,
{
    let event = InboundEvent {
        domain: saleor_header(&headers, HEADER_DOMAIN),
        event_type: saleor_header(&headers, HEADER_EVENT),
        signature: saleor_header(&headers, HEADER_SIGNATURE),
        body,
    };

    app_state.gateway().handle(event).await
}
