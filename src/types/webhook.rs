//! The result of a successful installation.

use serde::{Deserialize, Serialize};

use super::ids::{SigningSecret, WebhookId};

/// What the app keeps per domain after installing: the id of the webhook
/// Saleor created and the secret Saleor signs its deliveries with.
///
/// The secret serializes in full so a store can persist it; never send this
/// type back over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookData {
    pub webhook_id: WebhookId,
    pub webhook_secret_key: SigningSecret,
}

impl WebhookData {
    pub fn new(webhook_id: WebhookId, webhook_secret_key: SigningSecret) -> Self {
        WebhookData {
            webhook_id,
            webhook_secret_key,
        }
    }
}
