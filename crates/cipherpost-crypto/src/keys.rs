//! X25519 keypair generation and public key interchange.
//!
//! This module provides:
//! - Keypair generation using X25519 (Curve25519)
//! - Public key export/import as PEM-encoded SubjectPublicKeyInfo (RFC 8410)
//! - Short fingerprints for showing keys to humans
//!
//! # Security
//!
//! - Private keys are zeroized on drop
//! - Random number generation uses the OS-seeded ChaCha-based thread RNG

use x25519_dalek::{PublicKey as X25519Public, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::try_generate_random;
use crate::error::{CryptoError, CryptoResult};
use crate::format::{pem_decode, pem_encode, PEM_PUBLIC_KEY};

/// Key length for both halves of an X25519 keypair.
pub const KEY_LEN: usize = 32;

/// DER prefix of an X25519 SubjectPublicKeyInfo:
/// SEQUENCE { SEQUENCE { OID 1.3.101.110 }, BIT STRING (0 unused bits) }.
const X25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];

/// X25519 public key (32 bytes).
///
/// Public keys can be freely shared and are used by senders to encrypt
/// data that only the corresponding private key holder can decrypt.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
    /// Create a public key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Convert to the x25519-dalek public key type.
    pub(crate) fn to_x25519(&self) -> X25519Public {
        X25519Public::from(self.0)
    }

    /// DER-encoded SubjectPublicKeyInfo.
    pub fn to_spki_der(&self) -> Vec<u8> {
        let mut der = Vec::with_capacity(X25519_SPKI_PREFIX.len() + KEY_LEN);
        der.extend_from_slice(&X25519_SPKI_PREFIX);
        der.extend_from_slice(&self.0);
        der
    }

    /// Parse a DER-encoded X25519 SubjectPublicKeyInfo.
    pub fn from_spki_der(der: &[u8]) -> CryptoResult<Self> {
        if der.len() != X25519_SPKI_PREFIX.len() + KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "Expected {} byte SubjectPublicKeyInfo, got {}",
                X25519_SPKI_PREFIX.len() + KEY_LEN,
                der.len()
            )));
        }
        let (prefix, key) = der.split_at(X25519_SPKI_PREFIX.len());
        if prefix != X25519_SPKI_PREFIX {
            return Err(CryptoError::InvalidKey(
                "Not an X25519 SubjectPublicKeyInfo".to_string(),
            ));
        }
        let mut arr = [0u8; KEY_LEN];
        arr.copy_from_slice(key);
        Ok(Self(arr))
    }

    /// Short human-comparable fingerprint (first 16 bytes of BLAKE3, hex).
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.to_spki_der());
        hex::encode(&hash.as_bytes()[..16])
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

/// X25519 private key (32 bytes) with automatic zeroization.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; KEY_LEN]);

impl PrivateKey {
    /// Create a private key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the private key.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Convert to the x25519-dalek static secret type.
    pub(crate) fn to_x25519(&self) -> StaticSecret {
        StaticSecret::from(self.0)
    }

    /// Derive the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        let secret = self.to_x25519();
        let public = X25519Public::from(&secret);
        PublicKey(*public.as_bytes())
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// X25519 keypair.
pub struct Keypair {
    /// The public key (can be shared).
    pub public: PublicKey,
    /// The private key (must be kept secret).
    pub private: PrivateKey,
}

impl Keypair {
    /// Generate a new random keypair.
    ///
    /// # Panics
    ///
    /// Panics if the OS entropy source fails; use [`Keypair::try_generate`]
    /// to handle that case.
    pub fn generate() -> Self {
        match Self::try_generate() {
            Ok(keypair) => keypair,
            Err(e) => panic!("{}", e),
        }
    }

    /// Generate a new random keypair, surfacing entropy failures.
    pub fn try_generate() -> CryptoResult<Self> {
        let mut secret_bytes: [u8; KEY_LEN] = try_generate_random()?;

        let secret = StaticSecret::from(secret_bytes);
        let public = X25519Public::from(&secret);

        secret_bytes.zeroize();

        Ok(Self {
            public: PublicKey(*public.as_bytes()),
            private: PrivateKey(secret.to_bytes()),
        })
    }

    /// Create a keypair from an existing private key.
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { public, private }
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Export a public key as a PEM-encoded SubjectPublicKeyInfo.
pub fn export_public(key: &PublicKey) -> String {
    pem_encode(PEM_PUBLIC_KEY, &key.to_spki_der())
}

/// Import a public key from a PEM-encoded SubjectPublicKeyInfo.
pub fn import_public(pem: &str) -> CryptoResult<PublicKey> {
    let der = pem_decode(PEM_PUBLIC_KEY, pem)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    PublicKey::from_spki_der(&der)
}
