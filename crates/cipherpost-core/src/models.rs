//! Persisted records: credentials and message envelopes.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use cipherpost_crypto::{base64_decode, import_public, LockedPrivateKey, SealedMessage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::MAX_USERNAME_LEN;
use crate::error::{Error, Result};

/// Check that a username is usable as an index key and a file name.
///
/// Accepts 1 to 64 characters from `[A-Za-z0-9_.-]`, excluding the names
/// `.` and `..`.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::InvalidInput("username must not be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(Error::InvalidInput(format!(
            "username exceeds {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if username == "." || username == ".." {
        return Err(Error::InvalidInput(format!(
            "username {:?} is reserved",
            username
        )));
    }
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(Error::InvalidInput(format!(
            "username contains invalid character {:?}",
            c
        )));
    }
    Ok(())
}

// =============================================================================
// CREDENTIAL
// =============================================================================

/// A registered user: public key plus passphrase-locked private key.
///
/// Created once at registration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    /// SubjectPublicKeyInfo PEM.
    pub public_key_pem: String,
    /// Locked private key PEM container.
    pub locked_private_key_pem: String,
}

impl Credential {
    pub fn new(
        username: impl Into<String>,
        public_key_pem: impl Into<String>,
        locked_private_key_pem: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            public_key_pem: public_key_pem.into(),
            locked_private_key_pem: locked_private_key_pem.into(),
        }
    }

    /// Check the username and that both key blobs parse.
    ///
    /// Parsing the locked key only checks the armor and container framing;
    /// nothing short of the passphrase can verify its contents.
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username).map_err(|e| Error::InvalidRecord(e.to_string()))?;
        import_public(&self.public_key_pem).map_err(|e| {
            Error::InvalidRecord(format!("public key of {}: {}", self.username, e))
        })?;
        LockedPrivateKey::from_pem(&self.locked_private_key_pem).map_err(|e| {
            Error::InvalidRecord(format!("private key of {}: {}", self.username, e))
        })?;
        Ok(())
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// One stored message.
///
/// Everything except `read` is fixed at send time. `read` flips to true on the
/// first successful decrypt by the recipient and never flips back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    pub sender: String,
    pub recipient: String,
    /// Base64 of nonce || AES-256-GCM ciphertext.
    pub encrypted_message: String,
    /// Base64 of the wrapped content key.
    pub encrypted_key: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(default)]
    pub read: bool,
}

impl Envelope {
    /// Create an unread envelope stamped with the current time.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, sealed: SealedMessage) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender: sender.into(),
            recipient: recipient.into(),
            encrypted_message: sealed.ciphertext,
            encrypted_key: sealed.wrapped_key,
            timestamp: unix_seconds(Utc::now()),
            read: false,
        }
    }

    /// Parse and validate a persisted record.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_slice(bytes).map_err(|e| Error::InvalidRecord(e.to_string()))?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Reject records that could not have been produced by `send`.
    pub fn validate(&self) -> Result<()> {
        if self.sender.is_empty() {
            return Err(Error::InvalidRecord(format!("envelope {}: empty sender", self.id)));
        }
        if self.recipient.is_empty() {
            return Err(Error::InvalidRecord(format!(
                "envelope {}: empty recipient",
                self.id
            )));
        }
        if !self.timestamp.is_finite() || self.timestamp < 0.0 {
            return Err(Error::InvalidRecord(format!(
                "envelope {}: timestamp {} out of range",
                self.id, self.timestamp
            )));
        }
        for (field, value) in [
            ("encrypted_message", &self.encrypted_message),
            ("encrypted_key", &self.encrypted_key),
        ] {
            base64_decode(value).map_err(|_| {
                Error::InvalidRecord(format!("envelope {}: {} is not base64", self.id, field))
            })?;
        }
        Ok(())
    }

    /// The ciphertext pair for decryption.
    pub fn sealed(&self) -> SealedMessage {
        SealedMessage::new(self.encrypted_key.clone(), self.encrypted_message.clone())
    }

    /// The send time as a UTC datetime.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        from_unix_seconds(self.timestamp)
    }

    /// Chronological order, ties broken by id.
    pub fn chronological(a: &Envelope, b: &Envelope) -> Ordering {
        a.timestamp
            .total_cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Inbox listing entry; carries no ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSummary {
    pub id: Uuid,
    pub sender: String,
    pub timestamp: f64,
    pub read: bool,
}

impl From<&Envelope> for EnvelopeSummary {
    fn from(envelope: &Envelope) -> Self {
        Self {
            id: envelope.id,
            sender: envelope.sender.clone(),
            timestamp: envelope.timestamp,
            read: envelope.read,
        }
    }
}

impl EnvelopeSummary {
    /// The send time as a UTC datetime.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        from_unix_seconds(self.timestamp)
    }
}

fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

fn from_unix_seconds(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((ts * 1_000_000.0).round() as i64)
}
