//! Saleor App - installation handshake and signed webhook dispatch for Saleor apps.
//!
//! The library provides the pieces an app needs to be installed on a Saleor
//! instance and to receive that instance's events:
//!
//! - [`install`]: creates the app's webhooks with a fresh signing secret
//! - [`webhooks`]: verifies, routes and dispatches inbound deliveries
//! - [`server`]: the axum routes Saleor talks to
//! - [`store`]: per-domain persistence of the signing secret

pub mod config;
pub mod install;
pub mod saleor;
pub mod server;
pub mod store;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
