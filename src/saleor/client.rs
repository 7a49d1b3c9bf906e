//! reqwest-based GraphQL client scoped to one Saleor instance.
//!
//! `SaleorConnector` holds the shared HTTP client; each call to
//! [`RemoteConnector::connect`] produces a `SaleorClient` bound to one base URL
//! and one app token.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::api::{RemoteApi, RemoteConnector};
use super::error::TransportError;
use crate::types::AppToken;

/// Maximum number of response body bytes echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// Builds [`SaleorClient`] sessions that share one connection pool.
#[derive(Clone)]
pub struct SaleorConnector {
    http: reqwest::Client,
}

impl SaleorConnector {
    /// Creates a connector that identifies itself with `user_agent`.
    pub fn new(user_agent: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(user_agent)
            .map_err(|e| TransportError::InvalidConfig(format!("user agent: {}", e)))?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self { http })
    }

    /// Wraps a pre-configured reqwest client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl RemoteConnector for SaleorConnector {
    type Session = SaleorClient;

    fn connect(&self, base_url: &str, token: &AppToken) -> Result<SaleorClient, TransportError> {
        SaleorClient::new(self.http.clone(), base_url, token.clone())
    }
}

impl std::fmt::Debug for SaleorConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleorConnector").finish_non_exhaustive()
    }
}

/// A GraphQL session against one Saleor instance.
pub struct SaleorClient {
    http: reqwest::Client,
    endpoint: Url,
    token: AppToken,
}

impl SaleorClient {
    /// Creates a session posting to `{base_url}/graphql/`.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        token: AppToken,
    ) -> Result<Self, TransportError> {
        let endpoint = graphql_endpoint(base_url)?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    /// Returns the GraphQL endpoint this session posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl std::fmt::Debug for SaleorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleorClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

/// The GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl RemoteApi for SaleorClient {
    async fn execute(&self, operation: &str, variables: Value) -> Result<Value, TransportError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.token.expose()))
            .json(&serde_json::json!({
                "query": operation,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status();
        debug!(endpoint = %self.endpoint, status = status.as_u16(), "Saleor responded");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::Unauthorized(status.as_u16()));
        }

        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        decode_graphql_response(&body)
    }
}

/// Turns a GraphQL response body into its `data` object.
fn decode_graphql_response(body: &[u8]) -> Result<Value, TransportError> {
    let envelope: GraphQlResponse = serde_json::from_slice(body)
        .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

    if !envelope.errors.is_empty() {
        return Err(TransportError::GraphQl(
            envelope.errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    envelope
        .data
        .ok_or_else(|| TransportError::MalformedResponse("response has no data".into()))
}

fn graphql_endpoint(base_url: &str) -> Result<Url, TransportError> {
    let base = Url::parse(base_url)
        .map_err(|e| TransportError::InvalidConfig(format!("{}: {}", base_url, e)))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(TransportError::InvalidConfig(format!(
            "unsupported scheme {}",
            base.scheme()
        )));
    }
    base.join("/graphql/")
        .map_err(|e| TransportError::InvalidConfig(e.to_string()))
}

fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}
