//! The installation handshake.
//!
//! When Saleor installs the app it hands over an app token. The installer uses
//! that token to create one webhook per target URL, all signed with a single
//! freshly generated secret, and returns the [`WebhookData`] the caller should
//! persist for the domain.
//!
//! # Failure semantics
//!
//! Every target is attempted even if an earlier one fails. The installation
//! fails if any target failed, and the error lists each failed target.
//! Webhooks that were created before the failure are *not* deleted on the
//! Saleor side; they are logged so an operator can remove them. A fresh
//! install generates a new secret, so orphaned webhooks cannot deliver events
//! the app would accept.

pub mod secret;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::saleor::{
    CREATE_WEBHOOK, RemoteApi, RemoteConnector, TransportError, WebhookCreateInput,
    parse_webhook_create,
};
use crate::types::{AppToken, DomainName, EventType, SigningSecret, WebhookData, WebhookId};

/// Default timeout for one remote call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of webhooks created concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// URL scheme used to reach a Saleor instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    /// Plain HTTP. Only for local development instances.
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn from_insecure(insecure: bool) -> Self {
        if insecure { Scheme::Http } else { Scheme::Https }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for [`Installer`].
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    pub scheme: Scheme,

    /// Upper bound on each `webhookCreate` call. A timed-out call counts as a
    /// failed target.
    pub call_timeout: Duration,

    /// Number of targets processed at once. Values below 1 are treated as 1.
    pub max_concurrency: usize,

    /// Bearer token used instead of the one in each install request. For
    /// development instances only.
    pub development_auth_token: Option<AppToken>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        InstallerConfig {
            scheme: Scheme::Https,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            development_auth_token: None,
        }
    }
}

/// One webhook to create: where Saleor should deliver and which events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub target_url: String,
    pub events: Vec<EventType>,
}

/// Everything needed to install the app on one domain.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub domain: DomainName,
    pub auth_token: AppToken,

    /// Display name given to every created webhook (the manifest name).
    pub manifest_name: String,

    /// Targets in the order they should be attempted.
    pub targets: Vec<WebhookTarget>,

    /// Optional subscription query per target URL.
    pub subscription_queries: HashMap<String, String>,
}

impl InstallRequest {
    pub fn new(domain: DomainName, auth_token: AppToken, manifest_name: impl Into<String>) -> Self {
        InstallRequest {
            domain,
            auth_token,
            manifest_name: manifest_name.into(),
            targets: Vec::new(),
            subscription_queries: HashMap::new(),
        }
    }

    /// Adds a target. Targets are attempted in insertion order.
    pub fn with_target(
        mut self,
        target_url: impl Into<String>,
        events: impl IntoIterator<Item = EventType>,
    ) -> Self {
        self.targets.push(WebhookTarget {
            target_url: target_url.into(),
            events: events.into_iter().collect(),
        });
        self
    }

    /// Attaches a subscription query to the target with this URL.
    pub fn with_subscription_query(
        mut self,
        target_url: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        self.subscription_queries
            .insert(target_url.into(), query.into());
        self
    }

    fn subscription_input(&self, target: &WebhookTarget, secret: &SigningSecret) -> WebhookCreateInput {
        WebhookCreateInput::new(
            target.target_url.clone(),
            &target.events,
            self.manifest_name.clone(),
            secret,
            self.subscription_queries.get(&target.target_url).cloned(),
        )
    }
}

/// A target whose webhook could not be created.
#[derive(Debug)]
pub struct TargetFailure {
    pub target_url: String,
    pub error: TransportError,
}

impl fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target_url, self.error)
    }
}

/// Errors that end an installation.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The request had no targets, so there is nothing to subscribe.
    #[error("no webhook targets to register for {domain}")]
    NoTargets { domain: DomainName },

    /// No session could be opened against the domain.
    #[error("unable to open a session with {domain}: {source}")]
    Connect {
        domain: DomainName,
        #[source]
        source: TransportError,
    },

    /// At least one target failed. Targets that succeeded keep their webhooks.
    #[error(
        "failed to create webhooks for {domain}: {} of {attempted} targets failed",
        .failures.len()
    )]
    WebhookCreation {
        domain: DomainName,
        attempted: usize,
        failures: Vec<TargetFailure>,
    },
}

impl InstallError {
    pub fn domain(&self) -> &DomainName {
        match self {
            InstallError::NoTargets { domain }
            | InstallError::Connect { domain, .. }
            | InstallError::WebhookCreation { domain, .. } => domain,
        }
    }

    /// The per-target causes. Empty for errors raised before any call.
    pub fn failures(&self) -> &[TargetFailure] {
        match self {
            InstallError::WebhookCreation { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Drives the installation handshake against Saleor.
#[derive(Debug, Clone)]
pub struct Installer<C> {
    connector: C,
    config: InstallerConfig,
}

impl<C: RemoteConnector> Installer<C> {
    pub fn new(connector: C, config: InstallerConfig) -> Self {
        Installer { connector, config }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// The token sessions for `request` authenticate with: the configured
    /// development token if there is one, otherwise the request's own.
    pub fn auth_token<'a>(&'a self, request: &'a InstallRequest) -> &'a AppToken {
        self.config
            .development_auth_token
            .as_ref()
            .unwrap_or(&request.auth_token)
    }

    /// Creates a webhook for every target and returns what to persist.
    ///
    /// Fails with [`InstallError::NoTargets`] before contacting Saleor if the
    /// request has no targets. Otherwise opens one session, attempts every
    /// target (up to `max_concurrency` at a time), and fails if any target
    /// failed. On success the returned id is that of the last target in
    /// request order.
    pub async fn install(&self, request: &InstallRequest) -> Result<WebhookData, InstallError> {
        let domain = &request.domain;
        if request.targets.is_empty() {
            warn!(domain = %domain, "Install requested with no webhook targets");
            return Err(InstallError::NoTargets {
                domain: domain.clone(),
            });
        }

        let secret = secret::generate();
        let base_url = format!("{}://{}", self.config.scheme, domain);

        let session = self
            .connector
            .connect(&base_url, self.auth_token(request))
            .map_err(|source| InstallError::Connect {
                domain: domain.clone(),
                source,
            })?;

        let outcomes = self.create_webhooks(&session, request, &secret).await;
        drop(session);

        let attempted = outcomes.len();
        let mut created: Vec<(String, WebhookId)> = Vec::new();
        let mut failures = Vec::new();
        for (target_url, result) in outcomes {
            match result {
                Ok(id) => created.push((target_url, id)),
                Err(error) => {
                    warn!(
                        domain = %domain,
                        target_url = %target_url,
                        error = %error,
                        "Failed to create webhook"
                    );
                    failures.push(TargetFailure { target_url, error });
                }
            }
        }

        if !failures.is_empty() {
            if failures.iter().any(|f| f.error.is_auth_failure()) {
                warn!(domain = %domain, "Saleor rejected the app token");
            }
            error!(
                domain = %domain,
                failed = failures.len(),
                attempted,
                "Unable to finish installation"
            );
            for (target_url, id) in &created {
                warn!(
                    domain = %domain,
                    target_url = %target_url,
                    webhook_id = %id,
                    "Webhook left registered after failed installation"
                );
            }
            return Err(InstallError::WebhookCreation {
                domain: domain.clone(),
                attempted,
                failures,
            });
        }

        let Some((_, webhook_id)) = created.pop() else {
            return Err(InstallError::NoTargets {
                domain: domain.clone(),
            });
        };

        info!(
            domain = %domain,
            webhook_id = %webhook_id,
            targets = attempted,
            "App installed"
        );

        Ok(WebhookData::new(webhook_id, secret))
    }

    /// Attempts every target, returning outcomes in request order.
    async fn create_webhooks(
        &self,
        session: &C::Session,
        request: &InstallRequest,
        secret: &SigningSecret,
    ) -> Vec<(String, Result<WebhookId, TransportError>)> {
        let calls: Vec<_> = request
            .targets
            .iter()
            .map(|target| {
                let input = request.subscription_input(target, secret);
                self.create_webhook(session, input)
            })
            .collect();

        stream::iter(calls)
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await
    }

    async fn create_webhook(
        &self,
        session: &C::Session,
        input: WebhookCreateInput,
    ) -> (String, Result<WebhookId, TransportError>) {
        debug!(target_url = %input.target_url, events = ?input.events, "Creating webhook");

        let timeout = self.config.call_timeout;
        let call = session.execute(CREATE_WEBHOOK, input.to_variables());
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(data)) => parse_webhook_create(data),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::Timeout(timeout)),
        };

        (input.target_url, result)
    }
}
