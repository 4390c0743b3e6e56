//! # cipherpost-crypto
//!
//! Key custody and hybrid encryption for cipherpost.
//!
//! Every user owns one X25519 keypair. The public half is published as a PEM
//! SubjectPublicKeyInfo; the private half is stored locked under the user's
//! passphrase. Messages are encrypted with a fresh AES-256 content key which
//! is then wrapped for the recipient.
//!
//! ## Cryptographic Primitives
//!
//! - **Key agreement**: X25519 (Curve25519 ECDH), ephemeral per message
//! - **Symmetric cipher**: AES-256-GCM (AEAD), 128-bit nonces for bodies
//! - **Key derivation**: HKDF-SHA256 (content key wrapping), Argon2id (passphrases)
//! - **Random generation**: ChaCha-based CSPRNG seeded from the OS
//!
//! All functions here are synchronous and free of shared state.
//!
//! ## Examples
//!
//! ### Register: generate and lock a keypair
//!
//! ```rust
//! use cipherpost_crypto::{export_public, lock, KdfParams, Keypair};
//!
//! let keypair = Keypair::generate();
//! let public_pem = export_public(&keypair.public);
//! # let params = KdfParams { memory_kib: 1024, iterations: 1, parallelism: 1 };
//! let locked = lock(&keypair.private, "p1", &params).unwrap();
//! let private_pem = locked.to_pem();
//! # assert!(public_pem.contains("PUBLIC KEY"));
//! # assert!(private_pem.contains("ENCRYPTED PRIVATE KEY"));
//! ```
//!
//! ### Send and read
//!
//! ```rust
//! use cipherpost_crypto::{decrypt_text, encrypt, Keypair};
//!
//! let bob = Keypair::generate();
//! let sealed = encrypt("hello bob".as_bytes(), &bob.public).unwrap();
//! assert_eq!(decrypt_text(&sealed, &bob.private).unwrap(), "hello bob");
//! ```

pub mod cipher;
pub mod ecdh;
pub mod error;
pub mod format;
pub mod hybrid;
pub mod kdf;
pub mod key_storage;
pub mod keys;

// Re-export commonly used types
pub use error::{CryptoError, CryptoResult};
pub use format::{base64_decode, base64_encode};
pub use hybrid::{decrypt, decrypt_text, encrypt, SealedMessage};
pub use kdf::{validate_passphrase, KdfParams};
pub use key_storage::{lock, unlock, unlock_pem, LockedPrivateKey};
pub use keys::{export_public, import_public, Keypair, PrivateKey, PublicKey};
