//! In-memory stores with the same contract as the filesystem ones.

use std::collections::HashMap;

use async_trait::async_trait;
use cipherpost_core::{Credential, CredentialStore, Envelope, Error, MessageStore, Result, Uuid};
use tokio::sync::RwLock;

/// Credentials held in registration order.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<Vec<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn exists(&self, username: &str) -> Result<bool> {
        Ok(self
            .credentials
            .read()
            .await
            .iter()
            .any(|c| c.username == username))
    }

    async fn put(&self, credential: &Credential) -> Result<()> {
        credential.validate()?;
        let mut credentials = self.credentials.write().await;
        if credentials.iter().any(|c| c.username == credential.username) {
            return Err(Error::AlreadyExists(credential.username.clone()));
        }
        credentials.push(credential.clone());
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Credential> {
        self.credentials
            .read()
            .await
            .iter()
            .find(|c| c.username == username)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user {}", username)))
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .credentials
            .read()
            .await
            .iter()
            .map(|c| c.username.clone())
            .collect())
    }
}

/// Envelopes keyed by id.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    envelopes: RwLock<HashMap<Uuid, Envelope>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn put(&self, envelope: &Envelope) -> Result<Uuid> {
        envelope.validate()?;
        let mut envelopes = self.envelopes.write().await;
        if envelopes.contains_key(&envelope.id) {
            return Err(Error::AlreadyExists(format!("envelope {}", envelope.id)));
        }
        envelopes.insert(envelope.id, envelope.clone());
        Ok(envelope.id)
    }

    async fn get(&self, id: Uuid) -> Result<Envelope> {
        self.envelopes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("envelope {}", id)))
    }

    async fn list_for(&self, recipient: &str) -> Result<Vec<Envelope>> {
        let mut envelopes: Vec<Envelope> = self
            .envelopes
            .read()
            .await
            .values()
            .filter(|e| e.recipient == recipient)
            .cloned()
            .collect();
        envelopes.sort_by(Envelope::chronological);
        Ok(envelopes)
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        self.envelopes
            .write()
            .await
            .get_mut(&id)
            .map(|e| e.read = true)
            .ok_or_else(|| Error::NotFound(format!("envelope {}", id)))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.envelopes.read().await.len())
    }
}
