//! Newtype wrappers for the identifiers and credentials exchanged with Saleor.
//!
//! These types keep tenant keys, bearer tokens and signing secrets from being
//! mixed up, and keep the credential-bearing ones out of logs: `AppToken` and
//! `SigningSecret` redact themselves in `Debug` and do not implement `Display`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a host name (RFC 1035), plus room for a `:port` suffix.
const MAX_DOMAIN_LEN: usize = 253 + 6;

/// Error returned when a string is not an acceptable Saleor domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDomain {
    #[error("domain is empty")]
    Empty,

    #[error("domain is longer than {MAX_DOMAIN_LEN} bytes")]
    TooLong,

    #[error("domain contains invalid character {0:?}")]
    InvalidChar(char),

    #[error("domain contains an empty label")]
    EmptyLabel,

    #[error("domain has an invalid port: {0:?}")]
    InvalidPort(String),
}

/// The host (and optional port) of one Saleor instance.
///
/// This is the tenant key for everything the app stores. Parsing lower-cases
/// the value and rejects anything that could escape a URL authority or a file
/// name: path separators, whitespace, empty labels (`a..b`), and non-numeric
/// ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Parses and normalizes a domain.
    pub fn parse(s: impl AsRef<str>) -> Result<Self, InvalidDomain> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err(InvalidDomain::Empty);
        }
        if s.len() > MAX_DOMAIN_LEN {
            return Err(InvalidDomain::TooLong);
        }

        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (s, None),
        };

        if let Some(port) = port {
            if port.parse::<u16>().is_err() {
                return Err(InvalidDomain::InvalidPort(port.to_string()));
            }
        }

        if let Some(c) = host
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')))
        {
            return Err(InvalidDomain::InvalidChar(c));
        }

        if host.split('.').any(str::is_empty) {
            return Err(InvalidDomain::EmptyLabel);
        }

        Ok(DomainName(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DomainName {
    type Error = InvalidDomain;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DomainName::parse(s)
    }
}

impl From<DomainName> for String {
    fn from(domain: DomainName) -> Self {
        domain.0
    }
}

/// Bearer token issued by Saleor when the app is installed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppToken(String);

impl AppToken {
    pub fn new(token: impl Into<String>) -> Self {
        AppToken(token.into())
    }

    /// Exposes the raw token for use as a credential.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AppToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppToken(<redacted>)")
    }
}

/// Shared secret Saleor uses to sign webhook payloads for one domain.
///
/// Created by [`crate::install::secret::generate`] during installation and
/// read back from storage when verifying deliveries.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        SigningSecret(secret.into())
    }

    /// Exposes the raw secret for HMAC keying or transmission to Saleor.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// A Saleor webhook event type, e.g. `order_created`.
///
/// Routing compares event types exactly. Saleor expects upper-case enum
/// names when subscribing, see [`EventType::to_subscription_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub fn new(s: impl Into<String>) -> Self {
        EventType(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The upper-cased name sent in a `webhookCreate` mutation.
    pub fn to_subscription_name(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        EventType(s.to_string())
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        EventType(s)
    }
}

/// Identifier Saleor assigns to a created webhook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookId(pub String);

impl WebhookId {
    pub fn new(s: impl Into<String>) -> Self {
        WebhookId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebhookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
