//! Error types for cipherpost.

use cipherpost_crypto::CryptoError;
use thiserror::Error;

/// Result type alias using cipherpost's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cipherpost operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Key generation failed (entropy source exhausted)
    #[error("Key generation failed: {0}")]
    KeyGenerationFailure(String),

    /// Unknown user or wrong passphrase; the two are never distinguished
    #[error("Authentication failed")]
    AuthenticationFailure,

    /// Send aborted because the recipient has no registered key
    #[error("Recipient key not found: {0}")]
    RecipientKeyNotFound(String),

    /// Envelope could not be decrypted with the session key
    #[error("Message could not be decrypted")]
    DecryptFailure,

    /// Record already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisted record failed validation
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation requires a logged-in session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Store I/O failed; propagated unchanged
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::KeyGeneration(msg) => Error::KeyGenerationFailure(msg),
            CryptoError::Authentication => Error::AuthenticationFailure,
            CryptoError::Decryption => Error::DecryptFailure,
            CryptoError::PassphraseTooShort(min) => Error::InvalidInput(format!(
                "Passphrase too short (minimum {} characters required)",
                min
            )),
            CryptoError::InvalidKey(msg) | CryptoError::InvalidFormat(msg) => {
                Error::InvalidRecord(msg)
            }
            CryptoError::Encryption(msg) | CryptoError::KeyDerivation(msg) => {
                Error::Internal(msg)
            }
        }
    }
}
