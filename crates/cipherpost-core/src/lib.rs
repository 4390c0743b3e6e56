//! # cipherpost-core
//!
//! Core types, traits, and configuration for cipherpost.
//!
//! This crate provides:
//! - Persisted record types ([`Credential`], [`Envelope`])
//! - Store traits implemented by `cipherpost-store`
//! - The shared error type
//! - Environment-driven configuration and default constants
//!
//! ## Log Level Contract
//!
//! Events carry snake_case fields (`subsystem`, `component`, `op`,
//! `username`, `envelope_id`, `duration_ms`, ...).
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Store corruption or I/O failure that aborts an operation |
//! | WARN  | Rejected record, failed authentication, failed decryption |
//! | INFO  | Lifecycle events (registration, login, send, read) |
//! | DEBUG | Store reads/writes, intermediate decisions |
//! | TRACE | Per-file iteration while scanning the message directory |
//!
//! Passphrases, private keys, content keys and plaintext are never logged.

pub mod config;
pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types
pub use config::MessengerConfig;
pub use error::{Error, Result};
pub use models::{validate_username, Credential, Envelope, EnvelopeSummary};
pub use traits::{CredentialStore, MessageStore};

// Re-export external types used in public API
pub use uuid::Uuid;
