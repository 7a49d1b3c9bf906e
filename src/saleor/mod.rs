//! Saleor API transport.
//!
//! This module provides the GraphQL transport the installer uses to create
//! webhooks, behind the `RemoteConnector`/`RemoteApi` traits so the installer
//! can be tested without a network.
//!
//! Key features:
//! - One session per installation, scoped to a domain and an app token
//! - Distinguishes auth failures, HTTP failures, GraphQL errors and
//!   mutation validation errors
//! - No retries: a failed call is reported to the caller as-is

mod api;
mod client;
mod error;
pub mod mutations;

pub use api::{RemoteApi, RemoteConnector};
pub use client::{SaleorClient, SaleorConnector};
pub use error::TransportError;
pub use mutations::{CREATE_WEBHOOK, WebhookCreateInput, parse_webhook_create};
