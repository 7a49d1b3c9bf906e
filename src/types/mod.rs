//! Core domain types shared by the installer, the dispatch gateway and the
//! HTTP layer.

pub mod ids;
pub mod manifest;
pub mod webhook;

pub use ids::{AppToken, DomainName, EventType, InvalidDomain, SigningSecret, WebhookId};
pub use manifest::Manifest;
pub use webhook::WebhookData;
