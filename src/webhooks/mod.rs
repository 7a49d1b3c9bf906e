//! Inbound Saleor webhooks.
//!
//! - [`signature`]: HMAC-SHA256 signing and verification of raw payloads
//! - [`registry`]: the immutable map from event type to handler
//! - [`gateway`]: the per-delivery check sequence that ends in a handler call

pub mod gateway;
pub mod registry;
pub mod signature;

pub use gateway::{DispatchGateway, DispatchOutcome, InboundEvent};
pub use registry::{
    EventHandler, EventRegistry, HandlerError, HandlerReply, HandlerResult, WebhookEvent,
};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
