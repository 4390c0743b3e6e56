//! End-to-end tests for the messenger service.
//!
//! This test suite validates:
//! - Register / login / send / inbox / read flows
//! - Failure paths leave the stores unchanged
//! - Read flag semantics
//! - The same behavior over in-memory and on-disk stores

use cipherpost_core::{CredentialStore, Error, MessageStore, MessengerConfig, Uuid};
use cipherpost_crypto::{encrypt, KdfParams, Keypair};
use cipherpost_messenger::{open, FsMessenger, Messenger, SessionState};
use cipherpost_store::{MemoryCredentialStore, MemoryMessageStore};
use tempfile::TempDir;

type MemMessenger = Messenger<MemoryCredentialStore, MemoryMessageStore>;

fn fast_params() -> KdfParams {
    KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

fn memory_messenger() -> MemMessenger {
    Messenger::new(
        MemoryCredentialStore::new(),
        MemoryMessageStore::new(),
        MessengerConfig::with_data_dir("unused", fast_params()),
    )
}

async fn fs_messenger() -> (TempDir, FsMessenger) {
    let dir = TempDir::new().unwrap();
    let messenger = open(MessengerConfig::with_data_dir(dir.path(), fast_params()))
        .await
        .unwrap();
    (dir, messenger)
}

// ============================================================================
// Test Category 1: Scenarios
// ============================================================================

#[tokio::test]
async fn test_alice_sends_bob_hello() {
    let (_dir, m) = fs_messenger().await;
    m.register("alice", "p1").await.unwrap();
    m.register("bob", "p2").await.unwrap();

    let alice = m.login("alice", "p1").await.unwrap();
    let id = m.send(&alice, "bob", "hello bob").await.unwrap();
    m.logout(alice);

    let bob = m.login("bob", "p2").await.unwrap();
    let inbox = m.inbox(&bob).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].id, id);
    assert_eq!(inbox[0].sender, "alice");
    assert!(!inbox[0].read);

    assert_eq!(m.read(&bob, id).await.unwrap(), "hello bob");
    assert!(m.inbox(&bob).await.unwrap()[0].read);
}

#[tokio::test]
async fn test_send_to_unknown_recipient_writes_nothing() {
    let (_dir, m) = fs_messenger().await;
    m.register("alice", "p1").await.unwrap();
    let alice = m.login("alice", "p1").await.unwrap();

    let before = m.messages().count().await.unwrap();
    let err = m.send(&alice, "ghost", "anyone there?").await.unwrap_err();
    assert!(matches!(err, Error::RecipientKeyNotFound(name) if name == "ghost"));
    assert_eq!(m.messages().count().await.unwrap(), before);
}

#[tokio::test]
async fn test_duplicate_registration_keeps_original_keypair() {
    let (_dir, m) = fs_messenger().await;
    m.register("alice", "p1").await.unwrap();
    let original = m.credentials().get("alice").await.unwrap();

    let err = m.register("alice", "p9").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(name) if name == "alice"));

    assert_eq!(m.credentials().get("alice").await.unwrap(), original);
    assert!(m.login("alice", "p1").await.is_ok());
    assert!(matches!(
        m.login("alice", "p9").await,
        Err(Error::AuthenticationFailure)
    ));
}

#[tokio::test]
async fn test_read_is_idempotent() {
    let m = memory_messenger();
    m.register("alice", "p1").await.unwrap();
    m.register("bob", "p2").await.unwrap();
    let alice = m.login("alice", "p1").await.unwrap();
    let bob = m.login("bob", "p2").await.unwrap();

    let id = m.send(&alice, "bob", "twice").await.unwrap();
    assert_eq!(m.read(&bob, id).await.unwrap(), "twice");
    assert!(m.messages().get(id).await.unwrap().read);
    assert_eq!(m.read(&bob, id).await.unwrap(), "twice");
    assert!(m.messages().get(id).await.unwrap().read);
}

#[tokio::test]
async fn test_failed_read_leaves_envelope_unread() {
    let (_dir, m) = fs_messenger().await;
    m.register("alice", "p1").await.unwrap();
    m.register("bob", "p2").await.unwrap();
    let alice = m.login("alice", "p1").await.unwrap();
    let bob = m.login("bob", "p2").await.unwrap();

    // Addressed to bob but encrypted for some other key
    let stranger = Keypair::generate();
    let envelope = cipherpost_core::Envelope::new(
        "alice",
        "bob",
        encrypt(b"not for bob's key", &stranger.public).unwrap(),
    );
    let id = m.messages().put(&envelope).await.unwrap();

    assert!(matches!(m.read(&bob, id).await, Err(Error::DecryptFailure)));
    let stored = m.messages().get(id).await.unwrap();
    assert!(!stored.read);
    assert_eq!(stored, envelope);

    // A genuine message still reads normally afterwards
    let ok = m.send(&alice, "bob", "fine").await.unwrap();
    assert_eq!(m.read(&bob, ok).await.unwrap(), "fine");
}

// ============================================================================
// Test Category 2: Authentication
// ============================================================================

#[tokio::test]
async fn test_unknown_user_and_wrong_passphrase_indistinguishable() {
    let m = memory_messenger();
    m.register("alice", "p1").await.unwrap();

    let unknown = m.login("mallory", "p1").await.unwrap_err();
    let wrong = m.login("alice", "nope").await.unwrap_err();
    assert!(matches!(unknown, Error::AuthenticationFailure));
    assert!(matches!(wrong, Error::AuthenticationFailure));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_session_state_follows_login_outcome() {
    let m = memory_messenger();
    m.register("alice", "p1").await.unwrap();
    let mut state = SessionState::default();

    if let Ok(session) = m.login("alice", "wrong").await {
        state.set(session);
    }
    assert!(!state.is_logged_in());
    assert!(matches!(state.session(), Err(Error::NotLoggedIn)));

    state.set(m.login("alice", "p1").await.unwrap());
    assert_eq!(state.session().unwrap().username(), "alice");

    if let Some(session) = state.take() {
        m.logout(session);
    }
    assert!(!state.is_logged_in());
}

#[tokio::test]
async fn test_register_validates_input() {
    let m = memory_messenger();
    assert!(matches!(
        m.register("", "p1").await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        m.register("../alice", "p1").await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        m.register("alice", "").await,
        Err(Error::InvalidInput(_))
    ));
    assert!(m.credentials().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_min_passphrase_len_enforced_at_registration_only() {
    let mut config = MessengerConfig::with_data_dir("unused", fast_params());
    config.min_passphrase_len = 6;
    let m = Messenger::new(
        MemoryCredentialStore::new(),
        MemoryMessageStore::new(),
        config,
    );

    assert!(matches!(
        m.register("alice", "short").await,
        Err(Error::InvalidInput(_))
    ));
    m.register("alice", "longer").await.unwrap();
    assert!(m.login("alice", "longer").await.is_ok());
}

// ============================================================================
// Test Category 3: Listing and access
// ============================================================================

#[tokio::test]
async fn test_recipients_excludes_self() {
    let m = memory_messenger();
    for (name, pass) in [("alice", "p1"), ("bob", "p2"), ("carol", "p3")] {
        m.register(name, pass).await.unwrap();
    }
    let bob = m.login("bob", "p2").await.unwrap();
    assert_eq!(m.recipients(&bob).await.unwrap(), vec!["alice", "carol"]);
}

#[tokio::test]
async fn test_inbox_is_chronological_and_private() {
    let m = memory_messenger();
    for (name, pass) in [("alice", "p1"), ("bob", "p2"), ("carol", "p3")] {
        m.register(name, pass).await.unwrap();
    }
    let alice = m.login("alice", "p1").await.unwrap();
    let carol = m.login("carol", "p3").await.unwrap();
    let bob = m.login("bob", "p2").await.unwrap();

    let first = m.send(&alice, "bob", "one").await.unwrap();
    let second = m.send(&carol, "bob", "two").await.unwrap();
    let third = m.send(&alice, "bob", "three").await.unwrap();
    m.send(&bob, "carol", "to carol").await.unwrap();

    let inbox = m.inbox(&bob).await.unwrap();
    let ids: Vec<Uuid> = inbox.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![first, second, third]);
    assert!(inbox.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    assert_eq!(m.inbox(&alice).await.unwrap().len(), 0);
    assert_eq!(m.inbox(&carol).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cannot_read_someone_elses_message() {
    let m = memory_messenger();
    for (name, pass) in [("alice", "p1"), ("bob", "p2"), ("eve", "p3")] {
        m.register(name, pass).await.unwrap();
    }
    let alice = m.login("alice", "p1").await.unwrap();
    let eve = m.login("eve", "p3").await.unwrap();
    let id = m.send(&alice, "bob", "private").await.unwrap();

    let not_mine = m.read(&eve, id).await.unwrap_err();
    let missing = m.read(&eve, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(not_mine, Error::NotFound(_)));
    assert!(matches!(missing, Error::NotFound(_)));
    assert!(!m.messages().get(id).await.unwrap().read);
}

#[tokio::test]
async fn test_unread_count() {
    let m = memory_messenger();
    m.register("alice", "p1").await.unwrap();
    m.register("bob", "p2").await.unwrap();
    let alice = m.login("alice", "p1").await.unwrap();
    let bob = m.login("bob", "p2").await.unwrap();

    let a = m.send(&alice, "bob", "a").await.unwrap();
    m.send(&alice, "bob", "b").await.unwrap();
    assert_eq!(m.unread_count(&bob).await.unwrap(), 2);

    m.read(&bob, a).await.unwrap();
    m.read(&bob, a).await.unwrap();
    assert_eq!(m.unread_count(&bob).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unicode_and_empty_messages_roundtrip() {
    let m = memory_messenger();
    m.register("alice", "p1").await.unwrap();
    m.register("bob", "p2").await.unwrap();
    let alice = m.login("alice", "p1").await.unwrap();
    let bob = m.login("bob", "p2").await.unwrap();

    for text in ["", "Zażółć gęślą jaźń", "鍵 🔐 ключ"] {
        let id = m.send(&alice, "bob", text).await.unwrap();
        assert_eq!(m.read(&bob, id).await.unwrap(), text);
    }
}

#[tokio::test]
async fn test_messages_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = MessengerConfig::with_data_dir(dir.path(), fast_params());

    let id = {
        let m = open(config.clone()).await.unwrap();
        m.register("alice", "p1").await.unwrap();
        m.register("bob", "p2").await.unwrap();
        let alice = m.login("alice", "p1").await.unwrap();
        m.send(&alice, "bob", "later").await.unwrap()
    };

    let m = open(config).await.unwrap();
    let bob = m.login("bob", "p2").await.unwrap();
    assert_eq!(m.unread_count(&bob).await.unwrap(), 1);
    assert_eq!(m.read(&bob, id).await.unwrap(), "later");
}
