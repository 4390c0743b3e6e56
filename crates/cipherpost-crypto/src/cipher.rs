//! AES-256-GCM cipher operations.
//!
//! Two nonce widths are in use:
//! - 96-bit nonces for key wrapping and private-key locking, where every key
//!   encrypts exactly one message.
//! - 128-bit nonces for message bodies (`Aes256Gcm128`).

use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit, Payload},
    aes::Aes256,
    Aes256Gcm, AesGcm, Nonce,
};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// AES-256-GCM with a 128-bit nonce.
pub type Aes256Gcm128 = AesGcm<Aes256, U16>;

/// Nonce length for key wrapping and locking.
pub const WRAP_NONCE_LEN: usize = 12;

/// Nonce length for message bodies.
pub const BODY_NONCE_LEN: usize = 16;

/// GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Fallible variant of [`generate_random`] for key generation paths.
pub fn try_generate_random<const N: usize>() -> CryptoResult<[u8; N]> {
    let mut bytes = [0u8; N];
    rand::thread_rng()
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    Ok(bytes)
}

/// Generate a random salt (32 bytes).
pub fn generate_salt() -> [u8; 32] {
    generate_random()
}

/// Generate a random 96-bit nonce.
pub fn generate_nonce() -> [u8; WRAP_NONCE_LEN] {
    generate_random()
}

/// Encrypt plaintext with AES-256-GCM (96-bit nonce).
///
/// `aad` is authenticated but not encrypted. Returns ciphertext with appended
/// authentication tag (16 bytes).
pub fn aes_gcm_encrypt(
    key: &[u8; 32],
    nonce: &[u8; WRAP_NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::Encryption(e.to_string()))?;

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))
}

/// Decrypt ciphertext with AES-256-GCM (96-bit nonce).
///
/// Any failure, including a tag mismatch, is reported as `Decryption`.
pub fn aes_gcm_decrypt(
    key: &[u8; 32],
    nonce: &[u8; WRAP_NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::Decryption)?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Decryption)
}

/// Encrypt a message body with AES-256-GCM (128-bit nonce).
pub fn seal_body(
    key: &[u8; 32],
    nonce: &[u8; BODY_NONCE_LEN],
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher =
        Aes256Gcm128::new_from_slice(key).map_err(|e| CryptoError::Encryption(e.to_string()))?;

    cipher
        .encrypt(Nonce::<U16>::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))
}

/// Decrypt a message body sealed by [`seal_body`].
pub fn open_body(
    key: &[u8; 32],
    nonce: &[u8; BODY_NONCE_LEN],
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm128::new_from_slice(key).map_err(|_| CryptoError::Decryption)?;

    cipher
        .decrypt(Nonce::<U16>::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}
