//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
///
/// `Authentication` and `Decryption` are deliberately unit variants: callers
/// cannot learn which internal step rejected a passphrase or a ciphertext.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The entropy source could not produce key material.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Wrong passphrase or damaged locked private key.
    #[error("Authentication failed - wrong passphrase or damaged key container")]
    Authentication,

    /// Wrong private key, tampered envelope, or undecodable plaintext.
    #[error("Decryption failed")]
    Decryption,

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Malformed or unusable key material.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid encoding or container format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Passphrase shorter than the configured policy allows.
    #[error("Passphrase too short (minimum {0} characters required)")]
    PassphraseTooShort(usize),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
