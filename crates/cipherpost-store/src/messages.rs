//! Filesystem message store.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use cipherpost_core::{Envelope, Error, MessageStore, Result, Uuid};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::fs_util::{write_atomic, write_new, MODE_PUBLIC};
use crate::layout::DataLayout;

/// One `messages/<uuid>.json` file per envelope.
///
/// Sends never contend with each other: each writes its own file. Only
/// `mark_read`, which rewrites an existing file, takes the rewrite lock.
pub struct FsMessageStore {
    layout: DataLayout,
    rewrite_lock: Mutex<()>,
}

impl FsMessageStore {
    pub fn new(layout: DataLayout) -> Self {
        Self {
            layout,
            rewrite_lock: Mutex::new(()),
        }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    async fn load(&self, path: &Path) -> Result<Envelope> {
        let bytes = fs::read(path).await?;
        Envelope::from_json(&bytes).map_err(|e| {
            warn!(path = %path.display(), error = %e, "messages: rejected envelope");
            e
        })
    }

    /// Load every `.json` envelope in the message directory.
    ///
    /// Other files are skipped. A malformed `.json` file fails the whole scan.
    async fn load_all(&self) -> Result<Vec<Envelope>> {
        let dir = self.layout.messages_dir();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut envelopes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                trace!(path = %path.display(), "messages: skipping non-json file");
                continue;
            }
            if !entry.file_type().await?.is_file() {
                trace!(path = %path.display(), "messages: skipping non-file entry");
                continue;
            }
            envelopes.push(self.load(&path).await?);
        }
        Ok(envelopes)
    }
}

#[async_trait]
impl MessageStore for FsMessageStore {
    async fn put(&self, envelope: &Envelope) -> Result<Uuid> {
        envelope.validate()?;
        let path = self.layout.message_path(envelope.id);
        if !write_new(&path, &envelope.to_json()?, MODE_PUBLIC)? {
            return Err(Error::AlreadyExists(format!("envelope {}", envelope.id)));
        }

        info!(
            subsystem = "store",
            component = "messages",
            op = "put",
            envelope_id = %envelope.id,
            sender = %envelope.sender,
            recipient = %envelope.recipient,
            ciphertext_len = envelope.encrypted_message.len(),
            "envelope stored"
        );
        Ok(envelope.id)
    }

    async fn get(&self, id: Uuid) -> Result<Envelope> {
        let path = self.layout.message_path(id);
        let envelope = match self.load(&path).await {
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("envelope {}", id)));
            }
            other => other?,
        };
        if envelope.id != id {
            warn!(envelope_id = %id, stored_id = %envelope.id, "messages: id does not match file name");
            return Err(Error::InvalidRecord(format!(
                "envelope file {} holds id {}",
                id, envelope.id
            )));
        }
        Ok(envelope)
    }

    async fn list_for(&self, recipient: &str) -> Result<Vec<Envelope>> {
        let start = Instant::now();
        let mut envelopes: Vec<Envelope> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|e| e.recipient == recipient)
            .collect();
        envelopes.sort_by(Envelope::chronological);

        debug!(
            subsystem = "store",
            component = "messages",
            op = "list_for",
            recipient = %recipient,
            result_count = envelopes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "listed envelopes"
        );
        Ok(envelopes)
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let _guard = self.rewrite_lock.lock().await;
        let mut envelope = self.get(id).await?;
        if envelope.read {
            return Ok(());
        }
        envelope.read = true;
        write_atomic(
            &self.layout.message_path(id),
            &envelope.to_json()?,
            MODE_PUBLIC,
        )?;

        debug!(op = "mark_read", envelope_id = %id, "envelope marked read");
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.load_all().await?.len())
    }
}
