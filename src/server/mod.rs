//! HTTP surface of the app.
//!
//! # Endpoints
//!
//! - `GET /configuration/manifest` - The app manifest Saleor reads before installing
//! - `POST /configuration/install` - Installation handshake, called by Saleor with an app token
//! - `POST /webhook` - Signed event deliveries from installed Saleor instances
//! - `GET /health` - Returns 200 if the server is running
//!
//! Saleor sends `saleor-*` headers; the older `x-saleor-*` spellings are also
//! accepted.

use std::sync::Arc;

use axum::http::HeaderMap;
use tower_http::trace::TraceLayer;

use crate::install::{InstallRequest, Installer};
use crate::saleor::RemoteConnector;
use crate::store::{DomainValidator, InstallationStore};
use crate::types::{AppToken, DomainName, EventType, Manifest};
use crate::webhooks::{DispatchGateway, EventRegistry};

pub mod health;
pub mod install;
pub mod manifest;
pub mod webhook;

pub use health::health_handler;
pub use install::install_handler;
pub use manifest::manifest_handler;
pub use webhook::webhook_handler;

/// Where Saleor should deliver events for this app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionTarget {
    /// Public URL of this app's `/webhook` endpoint.
    pub webhook_url: String,

    /// Optional subscription query selecting the payload shape.
    pub query: Option<String>,
}

/// Shared application state, passed to handlers via axum's `State` extractor.
pub struct AppState<V, S, C> {
    inner: Arc<AppStateInner<V, S, C>>,
}

struct AppStateInner<V, S, C> {
    manifest: Manifest,
    target: SubscriptionTarget,
    installer: Installer<C>,
    validator: Arc<V>,
    store: Arc<S>,
    gateway: DispatchGateway<V, S>,
}

impl<V, S, C> Clone for AppState<V, S, C> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, S, C> AppState<V, S, C>
where
    V: DomainValidator,
    S: InstallationStore,
    C: RemoteConnector,
{
    pub fn new(
        manifest: Manifest,
        target: SubscriptionTarget,
        installer: Installer<C>,
        validator: Arc<V>,
        store: Arc<S>,
        registry: Arc<EventRegistry>,
    ) -> Self {
        let gateway = DispatchGateway::new(Arc::clone(&validator), Arc::clone(&store), registry);
        AppState {
            inner: Arc::new(AppStateInner {
                manifest,
                target,
                installer,
                validator,
                store,
                gateway,
            }),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.inner.manifest
    }

    pub fn target(&self) -> &SubscriptionTarget {
        &self.inner.target
    }

    pub fn installer(&self) -> &Installer<C> {
        &self.inner.installer
    }

    pub fn validator(&self) -> &V {
        &self.inner.validator
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn gateway(&self) -> &DispatchGateway<V, S> {
        &self.inner.gateway
    }

    /// Builds the install request for `domain`: one target, the configured
    /// webhook URL, subscribed to every registered event type.
    ///
    /// With no handlers registered the request has no targets and the
    /// installer rejects it.
    pub fn install_request(&self, domain: DomainName, token: AppToken) -> InstallRequest {
        let request = InstallRequest::new(domain, token, self.inner.manifest.name.clone());

        let events: Vec<EventType> = self.gateway().registry().event_types().cloned().collect();
        if events.is_empty() {
            return request;
        }

        let target = &self.inner.target;
        let request = request.with_target(target.webhook_url.clone(), events);
        match &target.query {
            Some(query) => request.with_subscription_query(target.webhook_url.clone(), query.clone()),
            None => request,
        }
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<V, S, C>(app_state: AppState<V, S, C>) -> axum::Router
where
    V: DomainValidator + 'static,
    S: InstallationStore + 'static,
    C: RemoteConnector + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/configuration/manifest", get(manifest_handler::<V, S, C>))
        .route("/configuration/install", post(install_handler::<V, S, C>))
        .route("/webhook", post(webhook_handler::<V, S, C>))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Reads a `saleor-*` header, falling back to its legacy `x-saleor-*` name.
pub(crate) fn saleor_header(headers: &HeaderMap, name: &'static str) -> Option<String> {
    headers
        .get(name)
        .or_else(|| headers.get(format!("x-{}", name).as_str()))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
