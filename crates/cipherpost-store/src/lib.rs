//! # cipherpost-store
//!
//! Persistence for cipherpost credentials and envelopes.
//!
//! This crate provides:
//! - [`DataLayout`]: the on-disk directory structure and its initialization
//! - [`FsCredentialStore`] / [`FsMessageStore`]: JSON and PEM files with
//!   atomic writes
//! - [`MemoryCredentialStore`] / [`MemoryMessageStore`]: in-process maps with
//!   the same contract
//!
//! ## Example
//!
//! ```rust,ignore
//! use cipherpost_store::{DataLayout, FsCredentialStore, FsMessageStore};
//!
//! let layout = DataLayout::new("./cipherpost-data");
//! layout.initialize().await?;
//! let credentials = FsCredentialStore::new(layout.clone());
//! let messages = FsMessageStore::new(layout);
//! ```

pub mod credentials;
mod fs_util;
pub mod layout;
pub mod memory;
pub mod messages;

pub use credentials::FsCredentialStore;
pub use layout::{DataLayout, UserEntry, UsersIndex};
pub use memory::{MemoryCredentialStore, MemoryMessageStore};
pub use messages::FsMessageStore;

/// Filesystem stores for a data directory, after initializing its layout.
pub async fn open(
    layout: DataLayout,
) -> cipherpost_core::Result<(FsCredentialStore, FsMessageStore)> {
    layout.initialize().await?;
    Ok((
        FsCredentialStore::new(layout.clone()),
        FsMessageStore::new(layout),
    ))
}
