//! Common test helpers for server tests.

use crate::backend::StoreBackend;
use crate::config::ServerConfig;
use crate::email::{EmailError, EmailProvider, OutgoingEmail};
use crate::notify::RetryPolicy;
use crate::server::{CreateSowRequest, SowServer};
use async_trait::async_trait;
use serde_json::json;
use sow_storage::{SowData, Store};
use sow_store_sqlite::SqliteStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const APP_URL: &str = "https://sow.example.com";
pub const PROVIDER_EMAIL: &str = "team@arcodic.test";

/// Email provider that records what it was asked to send.
///
/// `fail_first` sends fail before it starts succeeding; `u32::MAX` fails forever.
pub struct RecordingEmailProvider {
    sent: Mutex<Vec<OutgoingEmail>>,
    attempts: Mutex<u32>,
    fail_first: u32,
}

impl RecordingEmailProvider {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    pub fn failing() -> Self {
        Self::failing_first(u32::MAX)
    }

    pub fn failing_first(fail_first: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            fail_first,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<OutgoingEmail> {
        self.sent().into_iter().filter(|e| e.to == to).collect()
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl EmailProvider for RecordingEmailProvider {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if attempt <= self.fail_first {
            return Err(EmailError::SendFailed("mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        app_base_url: APP_URL.to_string(),
        provider_email: Some(PROVIDER_EMAIL.to_string()),
        ..ServerConfig::default()
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_backoff: Duration::from_millis(1),
    }
}

/// Build a server over `store` that mails through `provider`.
pub fn server_with(
    store: Arc<dyn Store>,
    config: ServerConfig,
    provider: Arc<RecordingEmailProvider>,
) -> SowServer {
    let provider: Arc<dyn EmailProvider> = provider;
    let mut server = SowServer::new(store, config, Some(provider));
    server.notifier = server.notifier.clone().with_retry(fast_retry());
    server
}

/// Test helper: SowServer over in-memory SQLite with a recording provider
pub async fn create_test_server() -> (SowServer, Arc<RecordingEmailProvider>) {
    create_test_server_with(RecordingEmailProvider::new()).await
}

pub async fn create_test_server_with(
    provider: RecordingEmailProvider,
) -> (SowServer, Arc<RecordingEmailProvider>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let provider = Arc::new(provider);
    let server = server_with(
        Arc::new(StoreBackend::Sqlite(store)),
        test_config(),
        provider.clone(),
    );
    (server, provider)
}

pub fn acme_data() -> SowData {
    serde_json::from_value(json!({
        "client": { "name": "Acme Corp", "contact": "Jane Doe", "email": "jane@acme.com" },
        "project": { "title": "Website", "description": "Marketing site rebuild" },
        "scope": { "pages": ["Home", "About"], "features": ["CMS"], "integrations": [] },
        "timeline": [{ "desc": "Design", "date": "2026-01-15" }],
        "pricing": { "total": 5000, "currency": "USD", "deposit": "50%", "revisions": 2 }
    }))
    .unwrap()
}

pub fn acme_request() -> CreateSowRequest {
    CreateSowRequest {
        client_name: "Acme Corp".to_string(),
        client_email: "jane@acme.com".to_string(),
        provider_signature: "A. Arcodic".to_string(),
        data: acme_data(),
    }
}

pub fn request_for(client_name: &str, client_email: &str, title: &str) -> CreateSowRequest {
    CreateSowRequest {
        client_name: client_name.to_string(),
        client_email: client_email.to_string(),
        provider_signature: "A. Arcodic".to_string(),
        data: serde_json::from_value(json!({ "project": { "title": title } })).unwrap(),
    }
}
