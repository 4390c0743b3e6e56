//! Passphrase key derivation using Argon2id.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Salt length for passphrase derivation.
pub const SALT_LEN: usize = 32;

/// Largest Argon2id memory cost accepted for locking or unlocking (1 GiB).
pub const MAX_MEMORY_KIB: u32 = 1024 * 1024;

/// Largest Argon2id iteration count accepted for locking or unlocking.
pub const MAX_ITERATIONS: u32 = 64;

/// Argon2id parameters.
///
/// Stored alongside every locked private key so a key locked under one set
/// of parameters keeps unlocking after the defaults change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParams {
    /// Argon2 m_cost in KiB.
    pub memory_kib: u32,
    /// Argon2 t_cost.
    pub iterations: u32,
    /// Argon2 lanes.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Check the parameters against Argon2's own limits and the caps that
    /// unlock enforces on untrusted container headers.
    pub fn validate(&self) -> CryptoResult<()> {
        if self.memory_kib > MAX_MEMORY_KIB {
            return Err(CryptoError::KeyDerivation(format!(
                "memory_kib {} exceeds {}",
                self.memory_kib, MAX_MEMORY_KIB
            )));
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(CryptoError::KeyDerivation(format!(
                "iterations {} exceeds {}",
                self.iterations, MAX_ITERATIONS
            )));
        }
        self.to_argon2().map(|_| ())
    }

    fn to_argon2(&self) -> CryptoResult<Params> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, Some(32))
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
    }
}

/// Key wrapper with automatic zeroization on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; 32],
}

impl DerivedKey {
    /// Create a new derived key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { key: bytes }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key from passphrase using Argon2id.
///
/// Passphrase policy is not enforced here; unlock must accept whatever
/// passphrase a key was locked under.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> CryptoResult<DerivedKey> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey { key })
}

/// Validate passphrase length against a minimum character count.
///
/// An empty passphrase is always rejected.
pub fn validate_passphrase(passphrase: &str, min_len: usize) -> CryptoResult<()> {
    let min_len = min_len.max(1);
    if passphrase.chars().count() < min_len {
        return Err(CryptoError::PassphraseTooShort(min_len));
    }
    Ok(())
}
