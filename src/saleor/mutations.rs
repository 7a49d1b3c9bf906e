//! GraphQL operations the app runs against Saleor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TransportError;
use crate::types::{EventType, SigningSecret, WebhookId};

/// Creates one webhook subscription.
pub const CREATE_WEBHOOK: &str = r#"
mutation WebhookCreate($input: WebhookCreateInput!) {
    webhookCreate(input: $input) {
        webhook {
            id
        }
        errors {
            field
            message
            code
        }
    }
}
"#;

/// The `input` variable of [`CREATE_WEBHOOK`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookCreateInput {
    pub target_url: String,
    pub events: Vec<String>,
    pub name: String,
    pub secret_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl WebhookCreateInput {
    /// Builds the subscription request for one target URL.
    ///
    /// Event types are upper-cased, which is how Saleor names its
    /// `WebhookEventTypeEnum` values.
    pub fn new(
        target_url: impl Into<String>,
        events: &[EventType],
        name: impl Into<String>,
        secret: &SigningSecret,
        query: Option<String>,
    ) -> Self {
        WebhookCreateInput {
            target_url: target_url.into(),
            events: events.iter().map(EventType::to_subscription_name).collect(),
            name: name.into(),
            secret_key: secret.expose().to_string(),
            query,
        }
    }

    /// The variables object sent with [`CREATE_WEBHOOK`].
    pub fn to_variables(&self) -> Value {
        serde_json::json!({ "input": self })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookCreateData {
    webhook_create: Option<WebhookCreatePayload>,
}

#[derive(Debug, Deserialize)]
struct WebhookCreatePayload {
    webhook: Option<CreatedWebhook>,
    #[serde(default)]
    errors: Vec<MutationError>,
}

#[derive(Debug, Deserialize)]
struct CreatedWebhook {
    id: WebhookId,
}

#[derive(Debug, Deserialize)]
struct MutationError {
    field: Option<String>,
    message: Option<String>,
    code: Option<String>,
}

impl MutationError {
    fn describe(&self) -> String {
        let message = self
            .message
            .as_deref()
            .or(self.code.as_deref())
            .unwrap_or("unknown error");
        match &self.field {
            Some(field) => format!("{}: {}", field, message),
            None => message.to_string(),
        }
    }
}

/// Extracts the created webhook id from a [`CREATE_WEBHOOK`] response.
///
/// Field-level errors in `webhookCreate.errors` are reported as
/// [`TransportError::Validation`] even though the call itself succeeded.
pub fn parse_webhook_create(data: Value) -> Result<WebhookId, TransportError> {
    let data: WebhookCreateData = serde_json::from_value(data)
        .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

    let payload = data.webhook_create.ok_or_else(|| {
        TransportError::MalformedResponse("missing webhookCreate in response".to_string())
    })?;

    if !payload.errors.is_empty() {
        return Err(TransportError::Validation(
            payload.errors.iter().map(MutationError::describe).collect(),
        ));
    }

    payload
        .webhook
        .map(|w| w.id)
        .ok_or_else(|| TransportError::MalformedResponse("missing webhookCreate.webhook.id".into()))
}
