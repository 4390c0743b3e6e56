//! Shared encoding utilities: base64 transport encoding and PEM armor.

use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// PEM label for X25519 SubjectPublicKeyInfo documents.
pub const PEM_PUBLIC_KEY: &str = "PUBLIC KEY";

/// PEM label for passphrase-locked private key containers.
pub const PEM_LOCKED_PRIVATE_KEY: &str = "CIPHERPOST ENCRYPTED PRIVATE KEY";

const PEM_LINE_WIDTH: usize = 64;

/// Encode bytes as base64.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(data: &str) -> CryptoResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| CryptoError::InvalidFormat(format!("Invalid base64: {}", e)))
}

/// Wrap binary data in a PEM block with the given label.
pub fn pem_encode(label: &str, data: &[u8]) -> String {
    let body = base64_encode(data);
    let mut out = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    out.push_str(&format!("-----BEGIN {}-----\n", label));
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        // base64 output is ASCII
        out.push_str(std::str::from_utf8(line).unwrap_or_default());
        out.push('\n');
    }
    out.push_str(&format!("-----END {}-----\n", label));
    out
}

/// Extract the binary payload of a PEM block, requiring the given label.
pub fn pem_decode(label: &str, pem: &str) -> CryptoResult<Vec<u8>> {
    let begin = format!("-----BEGIN {}-----", label);
    let end = format!("-----END {}-----", label);

    let mut lines = pem.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(first) if first == begin => {}
        _ => {
            return Err(CryptoError::InvalidFormat(format!(
                "Expected PEM block '{}'",
                label
            )))
        }
    }

    let mut body = String::new();
    let mut terminated = false;
    for line in lines.by_ref() {
        if line == end {
            terminated = true;
            break;
        }
        body.push_str(line);
    }

    if !terminated {
        return Err(CryptoError::InvalidFormat(format!(
            "Unterminated PEM block '{}'",
            label
        )));
    }
    if lines.next().is_some() {
        return Err(CryptoError::InvalidFormat(
            "Trailing data after PEM block".to_string(),
        ));
    }

    base64_decode(&body)
}
