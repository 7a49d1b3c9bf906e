//! Authenticated dispatch of inbound Saleor webhooks.
//!
//! Each delivery runs through the same fixed sequence of checks:
//!
//! 1. All three headers (domain, event type, signature) must be present.
//! 2. The domain must parse, pass the [`DomainValidator`], and have a stored
//!    signing secret.
//! 3. The signature must verify against the raw body with that secret.
//! 4. The event type must have a registered handler.
//! 5. The body must be JSON.
//!
//! The event type is only looked at after the signature has verified, so an
//! unauthenticated caller cannot discover which events the app handles.

use std::sync::Arc;

use axum::body::Bytes;
use tracing::{debug, info, warn};

use super::registry::{EventRegistry, HandlerResult, WebhookEvent};
use super::signature::verify_signature;
use crate::store::{DomainValidator, InstallationStore, StoreError};
use crate::types::{DomainName, EventType};

/// Header carrying the Saleor domain a delivery claims to come from.
pub const HEADER_DOMAIN: &str = "saleor-domain";
/// Header carrying the event type.
pub const HEADER_EVENT: &str = "saleor-event";
/// Header carrying the hex HMAC-SHA256 of the body.
pub const HEADER_SIGNATURE: &str = "saleor-signature";

/// One webhook delivery, before any checks.
///
/// Header values are optional so that the gateway itself decides when a
/// delivery is missing one.
#[derive(Debug, Clone, Default)]
pub struct InboundEvent {
    pub domain: Option<String>,
    pub event_type: Option<String>,
    pub signature: Option<String>,
    pub body: Bytes,
}

/// Where a delivery ended up.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A required header was absent. Carries the header name.
    MissingHeader(&'static str),

    /// The domain is malformed, not allowed, or was never installed.
    UnknownDomain,

    /// The signature did not verify.
    SignatureInvalid,

    /// The delivery is authentic but no handler is registered for its event.
    UnknownEvent(EventType),

    /// The delivery is authentic and routed but the body is not JSON.
    InvalidPayload(serde_json::Error),

    /// The secret could not be loaded.
    LookupFailed(StoreError),

    /// The handler ran. Carries whatever it returned.
    Dispatched(HandlerResult),
}

/// Verifies and routes inbound deliveries.
pub struct DispatchGateway<V, S> {
    validator: Arc<V>,
    store: Arc<S>,
    registry: Arc<EventRegistry>,
}

impl<V, S> Clone for DispatchGateway<V, S> {
    fn clone(&self) -> Self {
        DispatchGateway {
            validator: Arc::clone(&self.validator),
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<V: DomainValidator, S: InstallationStore> DispatchGateway<V, S> {
    pub fn new(validator: Arc<V>, store: Arc<S>, registry: Arc<EventRegistry>) -> Self {
        DispatchGateway {
            validator,
            store,
            registry,
        }
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub async fn handle(&self, event: InboundEvent) -> DispatchOutcome {
        let InboundEvent {
            domain,
            event_type,
            signature,
            body,
        } = event;

        let Some(raw_domain) = domain else {
            return DispatchOutcome::MissingHeader(HEADER_DOMAIN);
        };
        let Some(event_type) = event_type else {
            return DispatchOutcome::MissingHeader(HEADER_EVENT);
        };
        let Some(signature) = signature else {
            return DispatchOutcome::MissingHeader(HEADER_SIGNATURE);
        };

        debug!(domain = %raw_domain, event_type = %event_type, "Received webhook");

        let domain = match DomainName::parse(&raw_domain) {
            Ok(domain) => domain,
            Err(e) => {
                warn!(domain = %raw_domain, error = %e, "Webhook from malformed domain");
                return DispatchOutcome::UnknownDomain;
            }
        };

        if !self.validator.validate_domain(&domain).await {
            warn!(domain = %domain, "Webhook from rejected domain");
            return DispatchOutcome::UnknownDomain;
        }

        let data = match self.store.load_webhook_data(&domain).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!(domain = %domain, "Webhook from domain with no installation");
                return DispatchOutcome::UnknownDomain;
            }
            Err(e) => {
                warn!(domain = %domain, error = %e, "Failed to load webhook data");
                return DispatchOutcome::LookupFailed(e);
            }
        };

        if !verify_signature(data.webhook_secret_key.as_bytes(), &body, &signature) {
            warn!(domain = %domain, "Invalid webhook signature");
            return DispatchOutcome::SignatureInvalid;
        }

        let Some(handler) = self.registry.resolve(&event_type) else {
            warn!(domain = %domain, event_type = %event_type, "No handler for event");
            return DispatchOutcome::UnknownEvent(EventType::new(event_type));
        };

        let payload = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(domain = %domain, event_type = %event_type, error = %e, "Webhook body is not JSON");
                return DispatchOutcome::InvalidPayload(e);
            }
        };

        let result = handler
            .handle(WebhookEvent {
                domain: domain.clone(),
                event_type: EventType::new(event_type.as_str()),
                payload,
            })
            .await;

        match &result {
            Ok(_) => info!(domain = %domain, event_type = %event_type, "Webhook dispatched"),
            Err(e) => warn!(domain = %domain, event_type = %event_type, error = %e, "Webhook handler failed"),
        }

        DispatchOutcome::Dispatched(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::{Value, json};

    use crate::test_utils::{RecordingStore, sign};
    use crate::webhooks::registry::{HandlerError, HandlerReply};

    const SECRET: &str = "AbCdEfGhIjKlMnOpQrSt";
    const BODY: &[u8] = br#"{"order":{"id":"T3JkZXI6MQ=="}}"#;

    type Seen = Arc<Mutex<Vec<WebhookEvent>>>;

    fn recording_registry() -> (EventRegistry, Seen) {
        let seen: Seen = Arc::default();
        let sink = Arc::clone(&seen);
        let registry = EventRegistry::builder()
            .on("order_created", move |event: WebhookEvent| {
                sink.lock().unwrap().push(event);
                async { Ok::<_, HandlerError>(HandlerReply::empty()) }
            })
            .build();
        (registry, seen)
    }

    fn gateway(store: RecordingStore, registry: EventRegistry) -> DispatchGateway<RecordingStore, RecordingStore> {
        let store = Arc::new(store);
        DispatchGateway::new(Arc::clone(&store), store, Arc::new(registry))
    }

    fn signed(domain: &str, event_type: &str, secret: &str, body: &[u8]) -> InboundEvent {
        InboundEvent {
            domain: Some(domain.to_string()),
            event_type: Some(event_type.to_string()),
            signature: Some(sign(secret, body)),
            body: Bytes::copy_from_slice(body),
        }
    }

    #[tokio::test]
    async fn dispatches_signed_event_to_handler() {
        let (registry, seen) = recording_registry();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);

        let outcome = gateway
            .handle(signed("shop.example", "order_created", SECRET, BODY))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Dispatched(Ok(_))));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].domain.as_str(), "shop.example");
        assert_eq!(seen[0].event_type.as_str(), "order_created");
        assert_eq!(seen[0].payload, json!({ "order": { "id": "T3JkZXI6MQ==" } }));
    }

    #[tokio::test]
    async fn signature_under_other_secret_is_rejected() {
        let (registry, seen) = recording_registry();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);

        let outcome = gateway
            .handle(signed("shop.example", "order_created", "ZZZZZZZZZZZZZZZZZZZZ", BODY))
            .await;

        assert!(matches!(outcome, DispatchOutcome::SignatureInvalid));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_signature_wins_over_unknown_event() {
        let (registry, _) = recording_registry();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);

        let outcome = gateway
            .handle(signed("shop.example", "no_such_event", "wrong", BODY))
            .await;

        assert!(matches!(outcome, DispatchOutcome::SignatureInvalid));
    }

    #[tokio::test]
    async fn unknown_event_after_valid_signature() {
        let (registry, seen) = recording_registry();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);

        let outcome = gateway
            .handle(signed("shop.example", "ORDER_CREATED", SECRET, BODY))
            .await;

        match outcome {
            DispatchOutcome::UnknownEvent(event_type) => {
                assert_eq!(event_type.as_str(), "ORDER_CREATED");
            }
            other => panic!("expected UnknownEvent, got {:?}", other),
        }
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_headers_are_reported_in_order() {
        let (registry, _) = recording_registry();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);
        let full = signed("shop.example", "order_created", SECRET, BODY);

        let outcome = gateway
            .handle(InboundEvent {
                domain: None,
                event_type: None,
                ..full.clone()
            })
            .await;
        assert!(matches!(outcome, DispatchOutcome::MissingHeader(HEADER_DOMAIN)));

        let outcome = gateway
            .handle(InboundEvent {
                event_type: None,
                ..full.clone()
            })
            .await;
        assert!(matches!(outcome, DispatchOutcome::MissingHeader(HEADER_EVENT)));

        let outcome = gateway
            .handle(InboundEvent {
                signature: None,
                ..full
            })
            .await;
        assert!(matches!(outcome, DispatchOutcome::MissingHeader(HEADER_SIGNATURE)));
    }

    #[tokio::test]
    async fn uninstalled_domain_is_unknown() {
        let (registry, _) = recording_registry();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);

        let outcome = gateway
            .handle(signed("other.example", "order_created", SECRET, BODY))
            .await;

        assert!(matches!(outcome, DispatchOutcome::UnknownDomain));
    }

    #[tokio::test]
    async fn rejected_or_malformed_domain_is_unknown() {
        let (registry, _) = recording_registry();
        let store = RecordingStore::new()
            .with_secret("shop.example", SECRET)
            .reject("shop.example");
        let gateway = gateway(store, registry);

        let outcome = gateway
            .handle(signed("shop.example", "order_created", SECRET, BODY))
            .await;
        assert!(matches!(outcome, DispatchOutcome::UnknownDomain));

        let outcome = gateway
            .handle(signed("../etc/passwd", "order_created", SECRET, BODY))
            .await;
        assert!(matches!(outcome, DispatchOutcome::UnknownDomain));
    }

    #[tokio::test]
    async fn domain_header_is_case_insensitive() {
        let (registry, seen) = recording_registry();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);

        let outcome = gateway
            .handle(signed("Shop.Example", "order_created", SECRET, BODY))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Dispatched(Ok(_))));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_is_lookup_failed() {
        let (registry, _) = recording_registry();
        let gateway = gateway(RecordingStore::new().failing(), registry);

        let outcome = gateway
            .handle(signed("shop.example", "order_created", SECRET, BODY))
            .await;

        assert!(matches!(outcome, DispatchOutcome::LookupFailed(_)));
    }

    #[tokio::test]
    async fn non_json_body_is_not_dispatched() {
        let (registry, seen) = recording_registry();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);

        let outcome = gateway
            .handle(signed("shop.example", "order_created", SECRET, b"not json"))
            .await;

        assert!(matches!(outcome, DispatchOutcome::InvalidPayload(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handler_result_is_passed_through() {
        let registry = EventRegistry::builder()
            .on("order_created", |event: WebhookEvent| async move {
                let id: Value = event.payload["order"]["id"].clone();
                Ok::<_, HandlerError>(HandlerReply::json(json!({ "seen": id })))
            })
            .on("order_cancelled", |_event: WebhookEvent| async {
                Err::<HandlerReply, _>(HandlerError::Failed("downstream unavailable".into()))
            })
            .build();
        let gateway = gateway(RecordingStore::new().with_secret("shop.example", SECRET), registry);

        let outcome = gateway
            .handle(signed("shop.example", "order_created", SECRET, BODY))
            .await;
        match outcome {
            DispatchOutcome::Dispatched(Ok(reply)) => {
                assert_eq!(reply.body, Some(json!({ "seen": "T3JkZXI6MQ==" })));
            }
            other => panic!("expected Dispatched(Ok), got {:?}", other),
        }

        let outcome = gateway
            .handle(signed("shop.example", "order_cancelled", SECRET, BODY))
            .await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Dispatched(Err(HandlerError::Failed(_)))
        ));
    }
}
