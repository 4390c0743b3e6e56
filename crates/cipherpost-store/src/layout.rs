//! On-disk layout of a cipherpost data directory.
//!
//! ```text
//! <data_dir>/
//!   config/users.json          user index
//!   config/users.json.lock     serializes index rewrites across processes
//!   keys/public/<user>.pem     SubjectPublicKeyInfo PEM
//!   keys/private/<user>.pem    locked private key PEM
//!   messages/<uuid>.json       one envelope per file
//! ```

use std::path::{Component, Path, PathBuf};

use cipherpost_core::defaults;
use cipherpost_core::{Error, Result, Uuid};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::fs_util::{write_new, MODE_PUBLIC};

/// Paths derived from a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(defaults::CONFIG_DIR)
    }

    pub fn public_keys_dir(&self) -> PathBuf {
        self.root.join(defaults::PUBLIC_KEYS_DIR)
    }

    pub fn private_keys_dir(&self) -> PathBuf {
        self.root.join(defaults::PRIVATE_KEYS_DIR)
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.root.join(defaults::MESSAGES_DIR)
    }

    pub fn users_index(&self) -> PathBuf {
        self.config_dir().join(defaults::USERS_INDEX_FILE)
    }

    pub fn users_index_lock(&self) -> PathBuf {
        self.config_dir()
            .join(format!("{}.lock", defaults::USERS_INDEX_FILE))
    }

    /// Index-relative path of a user's public key.
    pub fn public_key_rel(username: &str) -> String {
        format!("{}/{}.pem", defaults::PUBLIC_KEYS_DIR, username)
    }

    /// Index-relative path of a user's locked private key.
    pub fn private_key_rel(username: &str) -> String {
        format!("{}/{}.pem", defaults::PRIVATE_KEYS_DIR, username)
    }

    pub fn message_path(&self, id: Uuid) -> PathBuf {
        self.messages_dir().join(format!("{}.json", id.as_hyphenated()))
    }

    /// Resolve a path read from the user index.
    ///
    /// Only relative paths that stay inside the data directory are accepted.
    pub fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let rel_path = Path::new(rel);
        if rel.is_empty()
            || rel_path
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::InvalidRecord(format!(
                "index path {:?} escapes the data directory",
                rel
            )));
        }
        Ok(self.root.join(rel_path))
    }

    /// Create the directory tree and an empty user index if absent.
    ///
    /// Safe to call on an already initialized directory; existing data is
    /// never touched.
    pub async fn initialize(&self) -> Result<()> {
        for dir in [
            self.config_dir(),
            self.public_keys_dir(),
            self.private_keys_dir(),
            self.messages_dir(),
        ] {
            fs::create_dir_all(&dir).await?;
        }

        let index = self.users_index();
        let empty = serde_json::to_vec_pretty(&UsersIndex::default())?;
        if write_new(&index, &empty, MODE_PUBLIC)? {
            info!(data_dir = %self.root.display(), "layout: initialized data directory");
        } else {
            debug!(path = %index.display(), "layout: user index present");
        }
        Ok(())
    }
}

/// `config/users.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersIndex {
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// One registered user in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub public_key_path: String,
    pub private_key_path: String,
}

impl UsersIndex {
    pub fn find(&self, username: &str) -> Option<&UserEntry> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Parse and validate the index file contents.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let index: UsersIndex = serde_json::from_slice(bytes)
            .map_err(|e| Error::InvalidRecord(format!("user index: {}", e)))?;

        for (i, entry) in index.users.iter().enumerate() {
            cipherpost_core::validate_username(&entry.username)
                .map_err(|e| Error::InvalidRecord(format!("user index: {}", e)))?;
            if index.users[..i].iter().any(|u| u.username == entry.username) {
                return Err(Error::InvalidRecord(format!(
                    "user index: duplicate username {}",
                    entry.username
                )));
            }
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = DataLayout::new("/data");
        assert_eq!(layout.config_dir(), PathBuf::from("/data/config"));
        assert_eq!(layout.public_keys_dir(), PathBuf::from("/data/keys/public"));
        assert_eq!(layout.private_keys_dir(), PathBuf::from("/data/keys/private"));
        assert_eq!(layout.messages_dir(), PathBuf::from("/data/messages"));
        assert_eq!(layout.users_index(), PathBuf::from("/data/config/users.json"));
        assert_eq!(
            layout.users_index_lock(),
            PathBuf::from("/data/config/users.json.lock")
        );
        assert_eq!(DataLayout::public_key_rel("alice"), "keys/public/alice.pem");
        assert_eq!(DataLayout::private_key_rel("alice"), "keys/private/alice.pem");

        let id = Uuid::nil();
        assert_eq!(
            layout.message_path(id),
            PathBuf::from("/data/messages/00000000-0000-0000-0000-000000000000.json")
        );
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let layout = DataLayout::new("/data");
        assert_eq!(
            layout.resolve("keys/public/alice.pem").unwrap(),
            PathBuf::from("/data/keys/public/alice.pem")
        );
        for bad in ["", "/etc/passwd", "../outside.pem", "keys/../../x", "./keys/a.pem"] {
            assert!(
                matches!(layout.resolve(bad), Err(Error::InvalidRecord(_))),
                "{:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());

        layout.initialize().await.unwrap();
        assert!(layout.messages_dir().is_dir());
        assert!(layout.public_keys_dir().is_dir());
        assert!(layout.private_keys_dir().is_dir());

        let index = fs::read(layout.users_index()).await.unwrap();
        assert_eq!(UsersIndex::from_json(&index).unwrap(), UsersIndex::default());

        // Existing index content survives a second initialize
        let populated = br#"{"users":[{"username":"alice","public_key_path":"keys/public/alice.pem","private_key_path":"keys/private/alice.pem"}]}"#;
        fs::write(layout.users_index(), populated).await.unwrap();
        layout.initialize().await.unwrap();
        assert_eq!(fs::read(layout.users_index()).await.unwrap(), populated);
    }

    #[test]
    fn test_index_rejects_bad_entries() {
        let dup = br#"{"users":[
            {"username":"alice","public_key_path":"a","private_key_path":"b"},
            {"username":"alice","public_key_path":"c","private_key_path":"d"}]}"#;
        assert!(matches!(UsersIndex::from_json(dup), Err(Error::InvalidRecord(_))));

        let bad_name = br#"{"users":[{"username":"a/b","public_key_path":"a","private_key_path":"b"}]}"#;
        assert!(matches!(
            UsersIndex::from_json(bad_name),
            Err(Error::InvalidRecord(_))
        ));

        let missing = br#"{"users":[{"username":"alice"}]}"#;
        assert!(matches!(
            UsersIndex::from_json(missing),
            Err(Error::InvalidRecord(_))
        ));

        assert_eq!(UsersIndex::from_json(b"{}").unwrap(), UsersIndex::default());
    }
}
