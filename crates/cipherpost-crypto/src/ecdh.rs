//! X25519 key agreement for wrapping content keys.
//!
//! # Protocol
//!
//! Wrapping (sender):
//! 1. Generate an ephemeral keypair
//! 2. shared_secret = ECDH(ephemeral_private, recipient_public)
//! 3. KEK = HKDF-SHA256(salt = ephemeral_public || recipient_public, ikm = shared_secret)
//!
//! Unwrapping (recipient):
//! 1. shared_secret = ECDH(recipient_private, ephemeral_public)
//! 2. Same HKDF inputs yield the same KEK
//!
//! Low-order public keys produce a non-contributory shared secret and are
//! rejected before any key is derived.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{PrivateKey, PublicKey};

/// Shared secret from ECDH (32 bytes).
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Get the raw bytes of the shared secret.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Key-encryption key derived via HKDF.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyEncryptionKey([u8; 32]);

impl KeyEncryptionKey {
    /// Get the raw bytes of the derived key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for KeyEncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEncryptionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Domain separation context for HKDF.
const HKDF_INFO_KEK: &[u8] = b"cipherpost-envelope-kek-v1";

/// Perform X25519 Diffie-Hellman key exchange.
///
/// Fails with `InvalidKey` when `their_public` is a low-order point.
pub fn ecdh(our_private: &PrivateKey, their_public: &PublicKey) -> CryptoResult<SharedSecret> {
    let secret = our_private.to_x25519();
    let shared = secret.diffie_hellman(&their_public.to_x25519());
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidKey(
            "Public key is a low-order point".to_string(),
        ));
    }
    Ok(SharedSecret(*shared.as_bytes()))
}

fn derive_kek(
    shared: &SharedSecret,
    ephemeral_public: &PublicKey,
    recipient_public: &PublicKey,
) -> CryptoResult<KeyEncryptionKey> {
    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(ephemeral_public.as_bytes());
    salt[32..].copy_from_slice(recipient_public.as_bytes());

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared.as_bytes());
    let mut key = [0u8; 32];
    hkdf.expand(HKDF_INFO_KEK, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(KeyEncryptionKey(key))
}

/// Derive the KEK on the sending side.
pub fn derive_kek_for_wrap(
    ephemeral_private: &PrivateKey,
    ephemeral_public: &PublicKey,
    recipient_public: &PublicKey,
) -> CryptoResult<KeyEncryptionKey> {
    let shared = ecdh(ephemeral_private, recipient_public)?;
    derive_kek(&shared, ephemeral_public, recipient_public)
}

/// Derive the KEK on the receiving side.
pub fn derive_kek_for_unwrap(
    recipient_private: &PrivateKey,
    ephemeral_public: &PublicKey,
) -> CryptoResult<KeyEncryptionKey> {
    let shared = ecdh(recipient_private, ephemeral_public)?;
    derive_kek(&shared, ephemeral_public, &recipient_private.public_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;

    #[test]
    fn test_ecdh_shared_secret() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        let shared_alice = ecdh(&alice.private, &bob.public).unwrap();
        let shared_bob = ecdh(&bob.private, &alice.public).unwrap();

        assert_eq!(shared_alice.as_bytes(), shared_bob.as_bytes());
    }

    #[test]
    fn test_ecdh_rejects_low_order_point() {
        let alice = Keypair::generate();
        let zero = PublicKey::from_bytes([0u8; 32]);
        assert!(matches!(
            ecdh(&alice.private, &zero),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_kek_symmetric() {
        let recipient = Keypair::generate();
        let ephemeral = Keypair::generate();

        let kek_sender =
            derive_kek_for_wrap(&ephemeral.private, &ephemeral.public, &recipient.public).unwrap();
        let kek_recipient = derive_kek_for_unwrap(&recipient.private, &ephemeral.public).unwrap();

        assert_eq!(kek_sender.as_bytes(), kek_recipient.as_bytes());
    }

    #[test]
    fn test_kek_bound_to_recipient() {
        let recipient = Keypair::generate();
        let other = Keypair::generate();
        let ephemeral = Keypair::generate();

        let kek =
            derive_kek_for_wrap(&ephemeral.private, &ephemeral.public, &recipient.public).unwrap();
        let wrong = derive_kek_for_unwrap(&other.private, &ephemeral.public).unwrap();

        assert_ne!(kek.as_bytes(), wrong.as_bytes());
    }

    #[test]
    fn test_different_ephemeral_different_kek() {
        let recipient = Keypair::generate();
        let e1 = Keypair::generate();
        let e2 = Keypair::generate();

        let kek1 = derive_kek_for_wrap(&e1.private, &e1.public, &recipient.public).unwrap();
        let kek2 = derive_kek_for_wrap(&e2.private, &e2.public, &recipient.public).unwrap();

        assert_ne!(kek1.as_bytes(), kek2.as_bytes());
    }

    #[test]
    fn test_secrets_debug_redacted() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let shared = ecdh(&alice.private, &bob.public).unwrap();
        assert!(format!("{:?}", shared).contains("REDACTED"));

        let kek = derive_kek_for_unwrap(&alice.private, &bob.public).unwrap();
        assert!(format!("{:?}", kek).contains("REDACTED"));
    }
}
