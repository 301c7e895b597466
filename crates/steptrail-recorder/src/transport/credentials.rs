//! In-memory credential store.

use async_trait::async_trait;
use steptrail_protocols::{CredentialStore, Credentials};
use tokio::sync::RwLock;

/// Credentials held for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            credentials: RwLock::new(credentials),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Option<Credentials> {
        self.credentials.read().await.clone()
    }

    async fn store_access_token(&self, access_token: &str) {
        let mut credentials = self.credentials.write().await;
        match credentials.as_mut() {
            Some(existing) => existing.access_token = access_token.to_string(),
            None => *credentials = Some(Credentials::new(access_token, None)),
        }
    }

    async fn clear(&self) {
        *self.credentials.write().await = None;
    }
}
