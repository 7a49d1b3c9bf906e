//! Event handler registry.
//!
//! The registry maps event types to application handlers. It is built once at
//! startup with [`EventRegistryBuilder`] and is immutable afterwards, so
//! concurrent deliveries can share it through an `Arc` without locking.
//!
//! Lookups are exact and case-sensitive: `order_created` and `ORDER_CREATED`
//! are different event types.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::types::{DomainName, EventType};

/// An authenticated delivery, as seen by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub domain: DomainName,
    pub event_type: EventType,
    pub payload: Value,
}

/// What a handler wants sent back to Saleor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerReply {
    /// Optional JSON body. Synchronous Saleor webhooks read their answer
    /// from here; asynchronous ones ignore it.
    pub body: Option<Value>,
}

impl HandlerReply {
    /// An empty `200 OK`.
    pub fn empty() -> Self {
        HandlerReply { body: None }
    }

    pub fn json(body: Value) -> Self {
        HandlerReply { body: Some(body) }
    }
}

/// Errors a handler can report.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The payload did not have the shape the handler expects.
    #[error("unexpected payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The handler could not complete its work.
    #[error("handler failed: {0}")]
    Failed(String),
}

pub type HandlerResult = Result<HandlerReply, HandlerError>;

/// Boxed future returned by [`EventHandler::handle`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Application logic for one event type.
///
/// Implemented for any `Fn(WebhookEvent) -> impl Future<Output = HandlerResult>`,
/// so handlers are usually plain async closures or functions.
///
/// Handlers must tolerate duplicate and out-of-order deliveries.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: WebhookEvent) -> HandlerFuture;
}

impl<F, Fut> EventHandler for F
where
    F: Fn(WebhookEvent) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, event: WebhookEvent) -> HandlerFuture {
        Box::pin(self(event))
    }
}

/// Immutable map from event type to handler.
#[derive(Clone, Default)]
pub struct EventRegistry {
    handlers: BTreeMap<EventType, Arc<dyn EventHandler>>,
}

impl EventRegistry {
    pub fn builder() -> EventRegistryBuilder {
        EventRegistryBuilder::default()
    }

    /// Returns the handler registered for exactly this event type.
    pub fn resolve(&self, event_type: &str) -> Option<&Arc<dyn EventHandler>> {
        self.handlers.get(&EventType::new(event_type))
    }

    /// Registered event types, sorted.
    pub fn event_types(&self) -> impl Iterator<Item = &EventType> {
        self.handlers.keys()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("event_types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects handlers before the registry is frozen.
#[derive(Default)]
pub struct EventRegistryBuilder {
    handlers: BTreeMap<EventType, Arc<dyn EventHandler>>,
}

impl EventRegistryBuilder {
    /// Registers `handler` for `event_type`, replacing any earlier handler.
    pub fn on(mut self, event_type: impl Into<EventType>, handler: impl EventHandler + 'static) -> Self {
        self.handlers.insert(event_type.into(), Arc::new(handler));
        self
    }

    pub fn build(self) -> EventRegistry {
        EventRegistry {
            handlers: self.handlers,
        }
    }
}
