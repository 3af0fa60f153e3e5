#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;

use wiremock::MockServer;

use lendkit::auth::{Credentials, TokenStore};
use lendkit::client::ApiClient;
use lendkit::error::LendkitError;

#[derive(Default)]
pub struct InMemoryTokenStore {
    credentials: Mutex<Option<Credentials>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(access: &str, refresh: &str) -> Arc<Self> {
        let store = Self::new();
        *store.credentials.lock().expect("store lock poisoned") =
            Some(Credentials::new(access, refresh));
        Arc::new(store)
    }

    pub fn get(&self) -> Option<Credentials> {
        self.credentials
            .lock()
            .expect("store lock poisoned")
            .clone()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<Credentials>, LendkitError> {
        Ok(self.get())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), LendkitError> {
        *self.credentials.lock().expect("store lock poisoned") = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), LendkitError> {
        *self.credentials.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// Client wired to a mock server, using a fresh (unshared) transport.
pub fn mock_client(server: &MockServer, store: Arc<InMemoryTokenStore>) -> ApiClient {
    let store: Arc<dyn TokenStore> = store;
    ApiClient::with_http_client(reqwest::Client::new(), server.uri(), store)
}
