//! Messenger orchestration: registration, login, send, inbox, read.

use std::time::Instant;

use cipherpost_core::{
    validate_username, Credential, CredentialStore, Envelope, EnvelopeSummary, Error,
    MessageStore, MessengerConfig, Result, Uuid,
};
use cipherpost_crypto::{
    decrypt_text, encrypt, export_public, import_public, lock, unlock_pem, validate_passphrase,
    CryptoError, Keypair,
};
use tracing::{debug, info, instrument, warn};

use crate::session::Session;

/// The messaging service, generic over its two stores.
pub struct Messenger<C, M> {
    credentials: C,
    messages: M,
    config: MessengerConfig,
}

impl<C, M> Messenger<C, M>
where
    C: CredentialStore,
    M: MessageStore,
{
    pub fn new(credentials: C, messages: M, config: MessengerConfig) -> Self {
        Self {
            credentials,
            messages,
            config,
        }
    }

    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    pub fn messages(&self) -> &M {
        &self.messages
    }

    /// Register a new user with a fresh keypair locked under `passphrase`.
    ///
    /// A taken username fails with `AlreadyExists` before any key is
    /// generated, and the existing credential is never touched.
    #[instrument(skip(self, passphrase), fields(subsystem = "messenger", op = "register"))]
    pub async fn register(&self, username: &str, passphrase: &str) -> Result<()> {
        let start = Instant::now();
        validate_username(username)?;
        validate_passphrase(passphrase, self.config.min_passphrase_len)?;

        if self.credentials.exists(username).await? {
            warn!(username = %username, "registration rejected: username taken");
            return Err(Error::AlreadyExists(username.to_string()));
        }

        let keypair = Keypair::try_generate()?;
        let locked = lock(&keypair.private, passphrase, &self.config.kdf)?;
        let fingerprint = keypair.public.fingerprint();
        let credential = Credential::new(username, export_public(&keypair.public), locked.to_pem());

        self.credentials.put(&credential).await?;

        info!(
            username = %username,
            key_fingerprint = %fingerprint,
            duration_ms = start.elapsed().as_millis() as u64,
            "user registered"
        );
        Ok(())
    }

    /// Unlock a user's private key and open a session.
    ///
    /// An unknown username and a wrong passphrase both yield
    /// `AuthenticationFailure`.
    #[instrument(skip(self, passphrase), fields(subsystem = "messenger", op = "login"))]
    pub async fn login(&self, username: &str, passphrase: &str) -> Result<Session> {
        let credential = match self.credentials.get(username).await {
            Ok(credential) => credential,
            Err(Error::NotFound(_)) => {
                warn!(username = %username, "login failed");
                return Err(Error::AuthenticationFailure);
            }
            Err(e) => return Err(e),
        };

        let private_key = match unlock_pem(&credential.locked_private_key_pem, passphrase) {
            Ok(key) => key,
            Err(CryptoError::Authentication) => {
                warn!(username = %username, "login failed");
                return Err(Error::AuthenticationFailure);
            }
            Err(e) => return Err(e.into()),
        };

        let stored_public = import_public(&credential.public_key_pem)?;
        if private_key.public_key() != stored_public {
            warn!(username = %username, "stored public key does not match private key");
            return Err(Error::InvalidRecord(format!(
                "key files of {} do not form a pair",
                username
            )));
        }

        info!(username = %username, "user logged in");
        Ok(Session::new(username, private_key))
    }

    /// End a session. The private key is zeroized as the session drops.
    pub fn logout(&self, session: Session) {
        info!(subsystem = "messenger", op = "logout", username = %session.username(), "user logged out");
        drop(session);
    }

    /// Everyone the session user can write to.
    pub async fn recipients(&self, session: &Session) -> Result<Vec<String>> {
        Ok(self
            .credentials
            .list()
            .await?
            .into_iter()
            .filter(|u| u != session.username())
            .collect())
    }

    /// Encrypt `message` for `recipient` and store the envelope.
    ///
    /// If the recipient has no registered key nothing is written.
    #[instrument(
        skip(self, session, message),
        fields(subsystem = "messenger", op = "send", sender = %session.username())
    )]
    pub async fn send(&self, session: &Session, recipient: &str, message: &str) -> Result<Uuid> {
        let credential = match self.credentials.get(recipient).await {
            Ok(credential) => credential,
            Err(Error::NotFound(_)) => {
                warn!(recipient = %recipient, "send aborted: unknown recipient");
                return Err(Error::RecipientKeyNotFound(recipient.to_string()));
            }
            Err(e) => return Err(e),
        };
        let public_key = import_public(&credential.public_key_pem)?;

        let sealed = encrypt(message.as_bytes(), &public_key)?;
        let envelope = Envelope::new(session.username(), recipient, sealed);
        let id = self.messages.put(&envelope).await?;

        info!(
            envelope_id = %id,
            recipient = %recipient,
            ciphertext_len = envelope.encrypted_message.len(),
            "message sent"
        );
        Ok(id)
    }

    /// The session user's envelopes, oldest first.
    pub async fn inbox(&self, session: &Session) -> Result<Vec<EnvelopeSummary>> {
        let summaries: Vec<EnvelopeSummary> = self
            .messages
            .list_for(session.username())
            .await?
            .iter()
            .map(EnvelopeSummary::from)
            .collect();
        debug!(
            subsystem = "messenger",
            op = "inbox",
            username = %session.username(),
            result_count = summaries.len(),
            "inbox listed"
        );
        Ok(summaries)
    }

    /// Decrypt one envelope addressed to the session user.
    ///
    /// Envelopes addressed to someone else report `NotFound`, the same as ids
    /// that do not exist. The read flag is set only after a successful
    /// decrypt, and a failed decrypt leaves the envelope untouched.
    #[instrument(
        skip(self, session),
        fields(subsystem = "messenger", op = "read", username = %session.username())
    )]
    pub async fn read(&self, session: &Session, id: Uuid) -> Result<String> {
        let envelope = self.messages.get(id).await?;
        if envelope.recipient != session.username() {
            debug!(envelope_id = %id, "read refused: not the recipient");
            return Err(Error::NotFound(format!("envelope {}", id)));
        }

        let plaintext = decrypt_text(&envelope.sealed(), session.private_key()).map_err(|_| {
            warn!(envelope_id = %id, sender = %envelope.sender, "message could not be decrypted");
            Error::DecryptFailure
        })?;

        if !envelope.read {
            self.messages.mark_read(id).await?;
        }
        info!(envelope_id = %id, sender = %envelope.sender, "message read");
        Ok(plaintext)
    }

    /// Number of unread envelopes for the session user.
    pub async fn unread_count(&self, session: &Session) -> Result<usize> {
        Ok(self
            .messages
            .list_for(session.username())
            .await?
            .iter()
            .filter(|e| !e.read)
            .count())
    }
}
