//! Logged-in session state.

use chrono::{DateTime, Utc};
use cipherpost_core::{Error, Result};
use cipherpost_crypto::{PrivateKey, PublicKey};

/// A logged-in user holding their unlocked private key.
///
/// Only [`Messenger::login`](crate::Messenger::login) creates one. The key is
/// zeroized when the session is dropped, and it is never cloned out.
pub struct Session {
    username: String,
    private_key: PrivateKey,
    public_key: PublicKey,
    logged_in_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(username: impl Into<String>, private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            username: username.into(),
            private_key,
            public_key,
            logged_in_at: Utc::now(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }

    pub(crate) fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("logged_in_at", &self.logged_in_at)
            .finish()
    }
}

/// Login state for callers that keep one current user, such as an
/// interactive front end.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn(Session),
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn(_))
    }

    /// The current session, or `NotLoggedIn`.
    pub fn session(&self) -> Result<&Session> {
        match self {
            SessionState::LoggedIn(session) => Ok(session),
            SessionState::LoggedOut => Err(Error::NotLoggedIn),
        }
    }

    /// Enter the logged-in state, replacing (and dropping) any prior session.
    pub fn set(&mut self, session: Session) {
        *self = SessionState::LoggedIn(session);
    }

    /// Leave the logged-in state, returning the session that was active.
    pub fn take(&mut self) -> Option<Session> {
        match std::mem::take(self) {
            SessionState::LoggedIn(session) => Some(session),
            SessionState::LoggedOut => None,
        }
    }
}
