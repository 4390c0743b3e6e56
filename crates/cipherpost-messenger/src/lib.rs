//! # cipherpost-messenger
//!
//! Store-and-forward encrypted messaging.
//!
//! Users register with a passphrase-locked X25519 keypair; messages are
//! hybrid-encrypted for the recipient's public key and stored until the
//! recipient logs in and reads them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cipherpost_messenger::open;
//! use cipherpost_core::MessengerConfig;
//!
//! let messenger = open(MessengerConfig::from_env()?).await?;
//! messenger.register("alice", "p1").await?;
//! messenger.register("bob", "p2").await?;
//!
//! let alice = messenger.login("alice", "p1").await?;
//! messenger.send(&alice, "bob", "hello bob").await?;
//!
//! let bob = messenger.login("bob", "p2").await?;
//! let inbox = messenger.inbox(&bob).await?;
//! let text = messenger.read(&bob, inbox[0].id).await?;
//! ```

pub mod service;
pub mod session;

pub use service::Messenger;
pub use session::{Session, SessionState};

use cipherpost_core::{MessengerConfig, Result};
use cipherpost_store::{DataLayout, FsCredentialStore, FsMessageStore};

/// Messenger backed by the on-disk layout.
pub type FsMessenger = Messenger<FsCredentialStore, FsMessageStore>;

/// Open (initializing if needed) the data directory named by `config`.
pub async fn open(config: MessengerConfig) -> Result<FsMessenger> {
    let (credentials, messages) = cipherpost_store::open(DataLayout::new(&config.data_dir)).await?;
    Ok(Messenger::new(credentials, messages, config))
}
