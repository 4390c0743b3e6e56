//! Hybrid encryption of message bodies for a single recipient.
//!
//! # Encryption Flow
//!
//! 1. Generate a random 256-bit content key and a random 128-bit nonce
//! 2. Encrypt the plaintext with AES-256-GCM; prefix the nonce
//! 3. Wrap the content key for the recipient: ephemeral X25519 agreement,
//!    HKDF-SHA256 KEK, AES-256-GCM
//! 4. Base64 both parts
//!
//! # Wire Layout
//!
//! ```text
//! wrapped_key: ephemeral_pubkey (32) | wrap_nonce (12) | sealed content key (32 + 16)
//! ciphertext:  body_nonce (16)       | AES-256-GCM ciphertext + tag (16)
//! ```
//!
//! # Decryption Flow
//!
//! 1. Derive the KEK from our private key and the ephemeral public key
//! 2. Unwrap the content key
//! 3. Split the nonce prefix and decrypt the body
//!
//! Every failure is reported as the single `CryptoError::Decryption`. The body
//! is decrypted (under a throwaway key) even when unwrapping fails, so a wrong
//! key and a tampered body cost roughly the same time.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::cipher::{
    aes_gcm_decrypt, aes_gcm_encrypt, generate_nonce, generate_random, open_body, seal_body,
    try_generate_random, BODY_NONCE_LEN, TAG_LEN, WRAP_NONCE_LEN,
};
use crate::ecdh::{derive_kek_for_unwrap, derive_kek_for_wrap};
use crate::error::{CryptoError, CryptoResult};
use crate::format::{base64_decode, base64_encode};
use crate::keys::{Keypair, PrivateKey, PublicKey, KEY_LEN};

/// Content key length (AES-256).
pub const CONTENT_KEY_LEN: usize = 32;

/// Length of a decoded wrapped key.
pub const WRAPPED_KEY_LEN: usize = KEY_LEN + WRAP_NONCE_LEN + CONTENT_KEY_LEN + TAG_LEN;

/// A message encrypted for one recipient, both parts base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedMessage {
    /// Content key wrapped for the recipient.
    pub wrapped_key: String,
    /// Nonce-prefixed AES-256-GCM ciphertext.
    pub ciphertext: String,
}

impl SealedMessage {
    /// Reassemble a sealed message from its stored parts.
    pub fn new(wrapped_key: impl Into<String>, ciphertext: impl Into<String>) -> Self {
        Self {
            wrapped_key: wrapped_key.into(),
            ciphertext: ciphertext.into(),
        }
    }
}

/// Encrypt a plaintext of any length for `recipient`.
///
/// A fresh content key, body nonce and ephemeral keypair are drawn on every
/// call, so encrypting the same input twice never yields the same output.
///
/// # Example
///
/// ```rust
/// use cipherpost_crypto::{decrypt, encrypt, Keypair};
///
/// let bob = Keypair::generate();
/// let sealed = encrypt(b"hello bob", &bob.public).unwrap();
/// assert_eq!(decrypt(&sealed, &bob.private).unwrap(), b"hello bob");
/// ```
pub fn encrypt(plaintext: &[u8], recipient: &PublicKey) -> CryptoResult<SealedMessage> {
    let content_key: Zeroizing<[u8; CONTENT_KEY_LEN]> = Zeroizing::new(try_generate_random()?);
    let body_nonce: [u8; BODY_NONCE_LEN] = try_generate_random()?;

    let sealed_body = seal_body(&content_key, &body_nonce, plaintext)?;
    let mut body = Vec::with_capacity(BODY_NONCE_LEN + sealed_body.len());
    body.extend_from_slice(&body_nonce);
    body.extend_from_slice(&sealed_body);

    let wrapped = wrap_content_key(&content_key, recipient)?;

    Ok(SealedMessage {
        wrapped_key: base64_encode(&wrapped),
        ciphertext: base64_encode(&body),
    })
}

/// Decrypt a sealed message with the recipient's private key.
pub fn decrypt(sealed: &SealedMessage, private_key: &PrivateKey) -> CryptoResult<Vec<u8>> {
    try_decrypt(sealed, private_key).map_err(|_| CryptoError::Decryption)
}

/// Decrypt a sealed message and require the plaintext to be UTF-8 text.
pub fn decrypt_text(sealed: &SealedMessage, private_key: &PrivateKey) -> CryptoResult<String> {
    let plaintext = decrypt(sealed, private_key)?;
    String::from_utf8(plaintext).map_err(|e| {
        let mut bytes = e.into_bytes();
        zeroize::Zeroize::zeroize(&mut bytes);
        CryptoError::Decryption
    })
}

fn wrap_content_key(
    content_key: &[u8; CONTENT_KEY_LEN],
    recipient: &PublicKey,
) -> CryptoResult<Vec<u8>> {
    let ephemeral = Keypair::try_generate()?;
    let kek = derive_kek_for_wrap(&ephemeral.private, &ephemeral.public, recipient)?;

    let wrap_nonce = generate_nonce();
    let sealed_key = aes_gcm_encrypt(kek.as_bytes(), &wrap_nonce, content_key, &[])?;

    let mut wrapped = Vec::with_capacity(WRAPPED_KEY_LEN);
    wrapped.extend_from_slice(ephemeral.public.as_bytes());
    wrapped.extend_from_slice(&wrap_nonce);
    wrapped.extend_from_slice(&sealed_key);
    Ok(wrapped)
}

fn unwrap_content_key(
    wrapped: &[u8],
    private_key: &PrivateKey,
) -> CryptoResult<Zeroizing<[u8; CONTENT_KEY_LEN]>> {
    if wrapped.len() != WRAPPED_KEY_LEN {
        return Err(CryptoError::Decryption);
    }
    let (ephemeral, rest) = wrapped.split_at(KEY_LEN);
    let (nonce, sealed_key) = rest.split_at(WRAP_NONCE_LEN);

    let ephemeral: [u8; KEY_LEN] = ephemeral.try_into().map_err(|_| CryptoError::Decryption)?;
    let nonce: [u8; WRAP_NONCE_LEN] = nonce.try_into().map_err(|_| CryptoError::Decryption)?;

    let kek = derive_kek_for_unwrap(private_key, &PublicKey::from_bytes(ephemeral))?;
    let key_bytes = Zeroizing::new(aes_gcm_decrypt(kek.as_bytes(), &nonce, sealed_key, &[])?);

    let content_key: [u8; CONTENT_KEY_LEN] = key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Decryption)?;
    Ok(Zeroizing::new(content_key))
}

fn try_decrypt(sealed: &SealedMessage, private_key: &PrivateKey) -> CryptoResult<Vec<u8>> {
    let wrapped = base64_decode(&sealed.wrapped_key)?;
    let body = base64_decode(&sealed.ciphertext)?;

    if body.len() < BODY_NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Decryption);
    }
    let (nonce, ciphertext) = body.split_at(BODY_NONCE_LEN);
    let nonce: [u8; BODY_NONCE_LEN] = nonce.try_into().map_err(|_| CryptoError::Decryption)?;

    let unwrapped = unwrap_content_key(&wrapped, private_key);
    let decoy: Zeroizing<[u8; CONTENT_KEY_LEN]> = Zeroizing::new(generate_random());
    let key: &[u8; CONTENT_KEY_LEN] = match &unwrapped {
        Ok(k) => &**k,
        Err(_) => &*decoy,
    };

    let opened = open_body(key, &nonce, ciphertext);
    unwrapped?;
    opened
}
