//! Filesystem credential store.

use std::io::ErrorKind;

use async_trait::async_trait;
use cipherpost_core::{Credential, CredentialStore, Error, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::fs_util::{write_atomic, FileLock, MODE_PRIVATE, MODE_PUBLIC};
use crate::layout::{DataLayout, UserEntry, UsersIndex};

/// Credentials kept as PEM files under `keys/`, published through
/// `config/users.json`.
///
/// Key files are written before the index entry that points at them, so a
/// crash mid-registration leaves at worst unreferenced key files and never an
/// index entry without keys. Index rewrites are serialized by an in-process
/// mutex and by `config/users.json.lock`, which also covers other processes
/// and other store instances on the same directory.
pub struct FsCredentialStore {
    layout: DataLayout,
    index_lock: Mutex<()>,
}

impl FsCredentialStore {
    pub fn new(layout: DataLayout) -> Self {
        Self {
            layout,
            index_lock: Mutex::new(()),
        }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    async fn load_index(&self) -> Result<UsersIndex> {
        let path = self.layout.users_index();
        match fs::read(&path).await {
            Ok(bytes) => UsersIndex::from_json(&bytes).map_err(|e| {
                warn!(path = %path.display(), error = %e, "credentials: rejected user index");
                e
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "credentials: no user index yet");
                Ok(UsersIndex::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_key_file(&self, username: &str, rel: &str) -> Result<String> {
        let path = self.layout.resolve(rel)?;
        match fs::read_to_string(&path).await {
            Ok(pem) => Ok(pem),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    username = username,
                    path = %path.display(),
                    "credentials: indexed key file missing"
                );
                Err(Error::InvalidRecord(format!(
                    "key file {} for {} is missing",
                    rel, username
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CredentialStore for FsCredentialStore {
    async fn exists(&self, username: &str) -> Result<bool> {
        Ok(self.load_index().await?.find(username).is_some())
    }

    async fn put(&self, credential: &Credential) -> Result<()> {
        credential.validate()?;
        let username = credential.username.as_str();

        let _guard = self.index_lock.lock().await;
        let _file_lock = FileLock::acquire(&self.layout.users_index_lock()).await?;
        let mut index = self.load_index().await?;
        if index.find(username).is_some() {
            return Err(Error::AlreadyExists(username.to_string()));
        }

        let entry = UserEntry {
            username: username.to_string(),
            public_key_path: DataLayout::public_key_rel(username),
            private_key_path: DataLayout::private_key_rel(username),
        };

        write_atomic(
            &self.layout.resolve(&entry.public_key_path)?,
            credential.public_key_pem.as_bytes(),
            MODE_PUBLIC,
        )?;
        write_atomic(
            &self.layout.resolve(&entry.private_key_path)?,
            credential.locked_private_key_pem.as_bytes(),
            MODE_PRIVATE,
        )?;

        index.users.push(entry);
        let bytes = serde_json::to_vec_pretty(&index)?;
        write_atomic(&self.layout.users_index(), &bytes, MODE_PUBLIC)?;

        info!(
            subsystem = "store",
            component = "credentials",
            op = "put",
            username = username,
            "credential stored"
        );
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Credential> {
        let index = self.load_index().await?;
        let entry = index
            .find(username)
            .ok_or_else(|| Error::NotFound(format!("user {}", username)))?;

        let credential = Credential::new(
            username,
            self.read_key_file(username, &entry.public_key_path).await?,
            self.read_key_file(username, &entry.private_key_path).await?,
        );
        credential.validate().map_err(|e| {
            warn!(username = username, error = %e, "credentials: rejected stored credential");
            e
        })?;
        Ok(credential)
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .load_index()
            .await?
            .users
            .into_iter()
            .map(|u| u.username)
            .collect())
    }
}
