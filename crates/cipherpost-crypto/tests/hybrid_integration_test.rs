//! Integration tests for key custody and hybrid encryption.
//!
//! This test suite validates:
//! - Round-trip correctness across plaintext shapes and sizes
//! - Wrong-key and tamper rejection
//! - The passphrase gate on locked private keys
//! - Freshness of every encryption
//! - Interchange formats (SubjectPublicKeyInfo PEM, locked key PEM)

use cipherpost_crypto::format::base64_decode;
use cipherpost_crypto::hybrid::WRAPPED_KEY_LEN;
use cipherpost_crypto::{
    decrypt, decrypt_text, encrypt, export_public, import_public, lock, unlock, unlock_pem,
    CryptoError, KdfParams, Keypair, LockedPrivateKey, SealedMessage,
};

fn fast_params() -> KdfParams {
    KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

// ============================================================================
// Test Category 1: Round-trip
// ============================================================================

#[test]
fn test_roundtrip_various_plaintexts() {
    let kp = Keypair::generate();

    let plaintexts: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"a".to_vec(),
        b"hello bob".to_vec(),
        "Zażółć gęślą jaźń 🔐".as_bytes().to_vec(),
        (0..=255u8).collect(),
        vec![0u8; 4096],
        vec![0xA5; 65_537],
    ];

    for m in &plaintexts {
        let sealed = encrypt(m, &kp.public).unwrap();
        assert_eq!(&decrypt(&sealed, &kp.private).unwrap(), m);
    }
}

#[test]
fn test_roundtrip_ten_megabytes() {
    let kp = Keypair::generate();
    let plaintext: Vec<u8> = (0..10 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

    let sealed = encrypt(&plaintext, &kp.public).unwrap();
    let decrypted = decrypt(&sealed, &kp.private).unwrap();

    assert_eq!(decrypted.len(), plaintext.len());
    assert!(decrypted == plaintext);
}

#[test]
fn test_roundtrip_through_exported_keys() {
    let kp = Keypair::generate();
    let public = import_public(&export_public(&kp.public)).unwrap();
    let pem = lock(&kp.private, "pass", &fast_params()).unwrap().to_pem();
    let locked = LockedPrivateKey::from_pem(&pem).unwrap();
    let private = unlock(&locked, "pass").unwrap();

    let sealed = encrypt(b"through the formats", &public).unwrap();
    assert_eq!(decrypt_text(&sealed, &private).unwrap(), "through the formats");
}

// ============================================================================
// Test Category 2: Rejection
// ============================================================================

#[test]
fn test_wrong_private_key_rejected() {
    let a = Keypair::generate();
    let b = Keypair::generate();

    for _ in 0..8 {
        let sealed = encrypt(b"only for a", &a.public).unwrap();
        assert!(matches!(
            decrypt(&sealed, &b.private),
            Err(CryptoError::Decryption)
        ));
    }
}

#[test]
fn test_every_byte_of_body_is_authenticated() {
    let kp = Keypair::generate();
    let sealed = encrypt(b"short body", &kp.public).unwrap();
    let body = base64_decode(&sealed.ciphertext).unwrap();

    for i in 0..body.len() {
        let mut tampered = body.clone();
        tampered[i] ^= 0x80;
        let msg = SealedMessage::new(
            sealed.wrapped_key.clone(),
            cipherpost_crypto::base64_encode(&tampered),
        );
        assert!(decrypt(&msg, &kp.private).is_err(), "byte {} not covered", i);
    }
}

#[test]
fn test_every_byte_of_wrapped_key_is_authenticated() {
    let kp = Keypair::generate();
    let sealed = encrypt(b"short body", &kp.public).unwrap();
    let wrapped = base64_decode(&sealed.wrapped_key).unwrap();
    assert_eq!(wrapped.len(), WRAPPED_KEY_LEN);

    for i in 0..wrapped.len() {
        let mut tampered = wrapped.clone();
        tampered[i] ^= 0x01;
        let msg = SealedMessage::new(
            cipherpost_crypto::base64_encode(&tampered),
            sealed.ciphertext.clone(),
        );
        assert!(decrypt(&msg, &kp.private).is_err(), "byte {} not covered", i);
    }
}

// ============================================================================
// Test Category 3: Passphrase gate
// ============================================================================

#[test]
fn test_passphrase_gate() {
    let kp = Keypair::generate();
    let locked = lock(&kp.private, "correct", &fast_params()).unwrap();

    let unlocked = unlock(&locked, "correct").unwrap();
    let sealed = encrypt(b"gate", &kp.public).unwrap();
    assert_eq!(decrypt(&sealed, &unlocked).unwrap(), b"gate");

    assert!(matches!(
        unlock(&locked, "wrong"),
        Err(CryptoError::Authentication)
    ));
    assert!(matches!(
        unlock(&locked, "Correct"),
        Err(CryptoError::Authentication)
    ));
    assert!(matches!(
        unlock(&locked, ""),
        Err(CryptoError::Authentication)
    ));
}

#[test]
fn test_wrong_passphrase_and_corruption_indistinguishable() {
    let kp = Keypair::generate();
    let locked = lock(&kp.private, "correct", &fast_params()).unwrap();
    let pem = locked.to_pem();

    let mut bytes = locked.as_bytes().to_vec();
    let mid = bytes.len() - 20;
    bytes[mid] ^= 0x10;
    let corrupted_pem = LockedPrivateKey::from_bytes(bytes).to_pem();

    let wrong = unlock_pem(&pem, "wrong").unwrap_err();
    let corrupted = unlock_pem(&corrupted_pem, "correct").unwrap_err();
    let garbage = unlock_pem("-----BEGIN NOTHING-----", "correct").unwrap_err();

    assert_eq!(wrong.to_string(), corrupted.to_string());
    assert_eq!(wrong.to_string(), garbage.to_string());
}

#[test]
fn test_unicode_passphrase() {
    let kp = Keypair::generate();
    let locked = lock(&kp.private, "hasło-ąę 🔑", &fast_params()).unwrap();
    assert!(unlock(&locked, "hasło-ąę 🔑").is_ok());
    assert!(unlock(&locked, "haslo-ae 🔑").is_err());
}

// ============================================================================
// Test Category 4: Freshness
// ============================================================================

#[test]
fn test_freshness_across_many_calls() {
    let kp = Keypair::generate();
    let mut wrapped = std::collections::HashSet::new();
    let mut bodies = std::collections::HashSet::new();

    for _ in 0..32 {
        let sealed = encrypt(b"identical input", &kp.public).unwrap();
        assert!(wrapped.insert(sealed.wrapped_key));
        assert!(bodies.insert(sealed.ciphertext));
    }
}

#[test]
fn test_keypairs_never_repeat() {
    let mut publics = std::collections::HashSet::new();
    for _ in 0..32 {
        let kp = Keypair::generate();
        assert!(publics.insert(*kp.public.as_bytes()));
    }
}
