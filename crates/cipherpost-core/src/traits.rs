//! Store traits.
//!
//! The messenger is generic over these so the same orchestration runs against
//! the filesystem layout in production and in-memory maps in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Credential, Envelope};

// =============================================================================
// CREDENTIAL STORE
// =============================================================================

/// username -> credential directory.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Check whether a username is registered.
    async fn exists(&self, username: &str) -> Result<bool>;

    /// Register a credential.
    ///
    /// Fails with `AlreadyExists` if the username is taken; the existing
    /// credential is left untouched.
    async fn put(&self, credential: &Credential) -> Result<()>;

    /// Fetch a credential, `NotFound` if the username is unknown.
    async fn get(&self, username: &str) -> Result<Credential>;

    /// All registered usernames in registration order.
    async fn list(&self) -> Result<Vec<String>>;
}

// =============================================================================
// MESSAGE STORE
// =============================================================================

/// Append-only envelope store.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new envelope and return its id.
    async fn put(&self, envelope: &Envelope) -> Result<Uuid>;

    /// Fetch an envelope, `NotFound` if the id is unknown.
    async fn get(&self, id: Uuid) -> Result<Envelope>;

    /// Envelopes addressed to `recipient`, oldest first.
    async fn list_for(&self, recipient: &str) -> Result<Vec<Envelope>>;

    /// Set the read flag. Setting it on an already-read envelope is a no-op.
    async fn mark_read(&self, id: Uuid) -> Result<()>;

    /// Total number of stored envelopes.
    async fn count(&self) -> Result<usize>;
}
