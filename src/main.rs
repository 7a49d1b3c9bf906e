use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saleor_app::config::{AppConfig, ENV_MANIFEST, ENV_WEBHOOK_URL};
use saleor_app::install::Installer;
use saleor_app::saleor::SaleorConnector;
use saleor_app::server::{AppState, SubscriptionTarget, build_router};
use saleor_app::store::{AllowList, FileStore};
use saleor_app::types::Manifest;
use saleor_app::webhooks::{EventRegistry, HandlerReply, HandlerResult, WebhookEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saleor_app=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let manifest_path = config
        .manifest_path
        .as_deref()
        .with_context(|| format!("{} must be set", ENV_MANIFEST))?;
    let manifest = load_manifest(manifest_path)?;
    let webhook_url = config
        .webhook_url
        .clone()
        .with_context(|| format!("{} must be set", ENV_WEBHOOK_URL))?;

    let registry = EventRegistry::builder()
        .on("order_created", log_event)
        .on("order_updated", log_event)
        .on("order_fully_paid", log_event)
        .build();

    let connector = SaleorConnector::new(&manifest.user_agent(), config.rpc_timeout)?;
    let installer = Installer::new(connector, config.installer_config());

    if config.development_auth_token.is_some() {
        warn!("Development auth token set, install request tokens will be ignored");
    }
    if config.allowed_domains.is_empty() {
        warn!("No allowed domains configured, accepting installs from any domain");
    }

    let app_state = AppState::new(
        manifest,
        SubscriptionTarget {
            webhook_url,
            query: config.subscription_query.clone(),
        },
        installer,
        Arc::new(AllowList::new(config.allowed_domains.clone())),
        Arc::new(FileStore::new(&config.data_dir)),
        Arc::new(registry),
    );

    let app = build_router(app_state);

    info!(
        addr = %config.bind,
        data_dir = %config.data_dir.display(),
        "listening"
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn load_manifest(path: &Path) -> anyhow::Result<Manifest> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse manifest {}", path.display()))
}

async fn log_event(event: WebhookEvent) -> HandlerResult {
    info!(
        domain = %event.domain,
        event_type = %event.event_type,
        "Received event"
    );
    Ok(HandlerReply::empty())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
