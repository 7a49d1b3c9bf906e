//! Shared test doubles for the collaborator traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use crate::saleor::{RemoteApi, RemoteConnector, TransportError};
use crate::store::{DomainValidator, InstallationStore, StoreError};
use crate::types::{AppToken, DomainName, Manifest, SigningSecret, WebhookData, WebhookId};
use crate::webhooks::{compute_signature, format_signature_header};

/// How the fake Saleor answers a `webhookCreate` for one target URL.
#[derive(Debug, Clone)]
pub enum Scripted {
    Created(&'static str),
    ValidationError(&'static str, &'static str),
    GraphQlError(&'static str),
    Unauthorized,
    Hang,
}

#[derive(Default)]
struct FakeState {
    responses: HashMap<String, Scripted>,
    refuse: bool,
    latency: Option<Duration>,
    connections: Mutex<Vec<(String, String)>>,
    calls: Mutex<Vec<Value>>,
    open_sessions: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// A scripted stand-in for Saleor. Clones share recorded state.
#[derive(Clone, Default)]
pub struct FakeConnector {
    state: Arc<FakeState>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn configure(mut self, f: impl FnOnce(&mut FakeState)) -> Self {
        let state = Arc::get_mut(&mut self.state).expect("configure before cloning");
        f(state);
        self
    }

    pub fn respond(self, target_url: &str, scripted: Scripted) -> Self {
        let target_url = target_url.to_string();
        self.configure(|s| {
            s.responses.insert(target_url, scripted);
        })
    }

    pub fn refuse_connections(self) -> Self {
        self.configure(|s| s.refuse = true)
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.configure(|s| s.latency = Some(latency))
    }

    /// `(base_url, token)` for every session opened.
    pub fn connections(&self) -> Vec<(String, String)> {
        self.state.connections.lock().unwrap().clone()
    }

    /// The `variables` of every call made, in call order.
    pub fn calls(&self) -> Vec<Value> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.state.open_sessions.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

impl RemoteConnector for FakeConnector {
    type Session = FakeSession;

    fn connect(&self, base_url: &str, token: &AppToken) -> Result<FakeSession, TransportError> {
        if self.state.refuse {
            return Err(TransportError::InvalidConfig("connection refused".into()));
        }
        self.state
            .connections
            .lock()
            .unwrap()
            .push((base_url.to_string(), token.expose().to_string()));
        self.state.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct FakeSession {
    state: Arc<FakeState>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RemoteApi for FakeSession {
    async fn execute(&self, _operation: &str, variables: Value) -> Result<Value, TransportError> {
        let target_url = variables["input"]["targetUrl"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        self.state.calls.lock().unwrap().push(variables);

        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.state.latency {
            tokio::time::sleep(latency).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.state.responses.get(&target_url).cloned() {
            Some(Scripted::Created(id)) => Ok(json!({
                "webhookCreate": { "webhook": { "id": id }, "errors": [] }
            })),
            Some(Scripted::ValidationError(field, message)) => Ok(json!({
                "webhookCreate": {
                    "webhook": null,
                    "errors": [{ "field": field, "message": message, "code": "INVALID" }]
                }
            })),
            Some(Scripted::GraphQlError(message)) => {
                Err(TransportError::GraphQl(vec![message.to_string()]))
            }
            Some(Scripted::Unauthorized) => Err(TransportError::Unauthorized(401)),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(TransportError::MalformedResponse(format!(
                "no scripted response for {}",
                target_url
            ))),
        }
    }
}

/// An in-memory store that records every save and can be made to fail.
#[derive(Clone, Default)]
pub struct RecordingStore {
    data: Arc<Mutex<HashMap<DomainName, WebhookData>>>,
    saves: Arc<Mutex<Vec<(DomainName, String, WebhookData)>>>,
    rejected: Arc<Mutex<Vec<DomainName>>>,
    fail_io: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, domain: &str, secret: &str) -> Self {
        let domain = DomainName::parse(domain).unwrap();
        self.data.lock().unwrap().insert(
            domain,
            WebhookData::new(WebhookId::new("webhook-1"), SigningSecret::new(secret)),
        );
        self
    }

    /// Makes `validate_domain` reject this domain.
    pub fn reject(self, domain: &str) -> Self {
        self.rejected
            .lock()
            .unwrap()
            .push(DomainName::parse(domain).unwrap());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_io = true;
        self
    }

    /// `(domain, token, data)` for every successful save.
    pub fn saves(&self) -> Vec<(DomainName, String, WebhookData)> {
        self.saves.lock().unwrap().clone()
    }
}

impl DomainValidator for RecordingStore {
    async fn validate_domain(&self, domain: &DomainName) -> bool {
        !self.rejected.lock().unwrap().contains(domain)
    }
}

impl InstallationStore for RecordingStore {
    async fn save_installation(
        &self,
        domain: &DomainName,
        token: &AppToken,
        data: &WebhookData,
    ) -> Result<(), StoreError> {
        if self.fail_io {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.saves
            .lock()
            .unwrap()
            .push((domain.clone(), token.expose().to_string(), data.clone()));
        self.data
            .lock()
            .unwrap()
            .insert(domain.clone(), data.clone());
        Ok(())
    }

    async fn load_webhook_data(
        &self,
        domain: &DomainName,
    ) -> Result<Option<WebhookData>, StoreError> {
        if self.fail_io {
            return Err(StoreError::Io(std::io::Error::other("disk unavailable")));
        }
        Ok(self.data.lock().unwrap().get(domain).cloned())
    }
}

/// Signs `body` the way Saleor does.
pub fn sign(secret: &str, body: &[u8]) -> String {
    format_signature_header(&compute_signature(secret.as_bytes(), body))
}

/// A manifest with a few optional fields set and the rest left out.
pub fn test_manifest() -> Manifest {
    Manifest {
        id: "example.app".into(),
        version: "1.0.0".into(),
        name: "Example App".into(),
        about: None,
        permissions: vec!["MANAGE_ORDERS".into()],
        app_url: "https://app.example/".into(),
        configuration_url: None,
        token_target_url: "https://app.example/configuration/install".into(),
        data_privacy: None,
        data_privacy_url: None,
        homepage_url: Some("https://app.example/home".into()),
        support_url: None,
    }
}
