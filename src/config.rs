//! Runtime configuration read from `SALEOR_APP_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::install::{DEFAULT_CALL_TIMEOUT, DEFAULT_MAX_CONCURRENCY, InstallerConfig, Scheme};
use crate::types::{AppToken, DomainName, InvalidDomain};

pub const ENV_BIND: &str = "SALEOR_APP_BIND";
pub const ENV_MANIFEST: &str = "SALEOR_APP_MANIFEST";
pub const ENV_WEBHOOK_URL: &str = "SALEOR_APP_WEBHOOK_URL";
pub const ENV_SUBSCRIPTION_QUERY: &str = "SALEOR_APP_SUBSCRIPTION_QUERY";
pub const ENV_DATA_DIR: &str = "SALEOR_APP_DATA_DIR";
pub const ENV_ALLOWED_DOMAINS: &str = "SALEOR_APP_ALLOWED_DOMAINS";
pub const ENV_INSECURE_HTTP: &str = "SALEOR_APP_INSECURE_HTTP";
pub const ENV_RPC_TIMEOUT_SECS: &str = "SALEOR_APP_RPC_TIMEOUT_SECS";
pub const ENV_INSTALL_CONCURRENCY: &str = "SALEOR_APP_INSTALL_CONCURRENCY";
pub const ENV_DEV_AUTH_TOKEN: &str = "SALEOR_APP_DEV_AUTH_TOKEN";

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_DATA_DIR: &str = "./data";

/// Errors from configuration values that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a socket address: {value:?}")]
    InvalidBind { var: &'static str, value: String },

    #[error("{var} contains an invalid domain {value:?}: {source}")]
    InvalidDomain {
        var: &'static str,
        value: String,
        #[source]
        source: InvalidDomain,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,

    /// Path of the manifest JSON document.
    pub manifest_path: Option<PathBuf>,

    /// Public URL of this app's `/webhook` endpoint, registered with Saleor
    /// as the delivery target.
    pub webhook_url: Option<String>,

    pub subscription_query: Option<String>,

    /// Where [`crate::store::FileStore`] keeps installations.
    pub data_dir: PathBuf,

    /// Domains allowed to install and deliver. Empty allows all.
    pub allowed_domains: Vec<DomainName>,

    /// Reach Saleor over `http://` instead of `https://`.
    pub insecure_http: bool,

    pub rpc_timeout: Duration,
    pub install_concurrency: usize,

    /// Token used instead of the one Saleor sends on install. Development
    /// instances only.
    pub development_auth_token: Option<AppToken>,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    ///
    /// Unparseable numeric values fall back to their defaults with a warning.
    /// An unparseable bind address or allowed domain is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_str = non_empty(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind {
                var: ENV_BIND,
                value: bind_str.clone(),
            })?;

        let allowed_domains = match non_empty(ENV_ALLOWED_DOMAINS) {
            Some(list) => parse_domain_list(&list)?,
            None => Vec::new(),
        };

        let rpc_timeout = parse_number(&non_empty, ENV_RPC_TIMEOUT_SECS)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CALL_TIMEOUT);

        let install_concurrency = parse_number(&non_empty, ENV_INSTALL_CONCURRENCY)
            .map(|n| n as usize)
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_CONCURRENCY);

        Ok(AppConfig {
            bind,
            manifest_path: non_empty(ENV_MANIFEST).map(PathBuf::from),
            webhook_url: non_empty(ENV_WEBHOOK_URL),
            subscription_query: non_empty(ENV_SUBSCRIPTION_QUERY),
            data_dir: non_empty(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            allowed_domains,
            insecure_http: non_empty(ENV_INSECURE_HTTP)
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            rpc_timeout,
            install_concurrency,
            development_auth_token: non_empty(ENV_DEV_AUTH_TOKEN).map(AppToken::new),
        })
    }

    pub fn installer_config(&self) -> InstallerConfig {
        InstallerConfig {
            scheme: Scheme::from_insecure(self.insecure_http),
            call_timeout: self.rpc_timeout,
            max_concurrency: self.install_concurrency,
            development_auth_token: self.development_auth_token.clone(),
        }
    }
}

fn parse_domain_list(list: &str) -> Result<Vec<DomainName>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            DomainName::parse(s).map_err(|source| ConfigError::InvalidDomain {
                var: ENV_ALLOWED_DOMAINS,
                value: s.to_string(),
                source,
            })
        })
        .collect()
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<u64> {
    let value = lookup(var)?;
    match value.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(var, value = %value, "Ignoring unparseable number, using default");
            None
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
