//! ChaCha20-Poly1305 payload encryption.
//!
//! Wire format: base64(nonce ‖ ciphertext) with a random 12-byte nonce per
//! message. The Poly1305 tag authenticates the payload, so tampering or a
//! wrong key surfaces as a decryption failure rather than garbage output.

use base64::{Engine, engine::general_purpose::STANDARD};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

use crate::errors::{Result, SecretError};

/// Nonce width of the 96-bit ChaCha20-Poly1305 construction.
const NONCE_LEN: usize = 12;

/// Seal `plaintext` under `key` and return a base64 envelope.
///
/// Every call draws a fresh nonce, so sealing the same text twice yields
/// different envelopes.
pub fn encrypt(plaintext: &str, key: &[u8; 32]) -> Result<String> {
    let cipher = ChaCha20Poly1305::new(key.into());
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| SecretError::EncryptionFailed("aead failure".to_string()))?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(nonce.as_slice());
    envelope.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(&envelope))
}

/// Open a base64 envelope produced by [`encrypt`].
///
/// Fails on malformed base64, an envelope shorter than a nonce, a wrong key,
/// or a tampered ciphertext.
pub fn decrypt(encoded: &str, key: &[u8; 32]) -> Result<String> {
    let envelope = STANDARD
        .decode(encoded)
        .map_err(|_| SecretError::DecryptionFailed("invalid encoding".to_string()))?;
    if envelope.len() < NONCE_LEN {
        return Err(SecretError::DecryptionFailed(
            "ciphertext too short".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = envelope.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(key.into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| SecretError::DecryptionFailed("authentication failed".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|_| SecretError::DecryptionFailed("invalid UTF-8".to_string()))
}

/// Draw a random 256-bit key from the OS generator.
pub fn generate_key() -> [u8; 32] {
    ChaCha20Poly1305::generate_key(&mut OsRng).into()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn roundtrip_recovers_plaintext() {
        let key = generate_key();
        let plaintext = "Represent the document for retrieval: hello world";
        let encrypted = encrypt(plaintext, &key).unwrap();
        assert_eq!(decrypt(&encrypted, &key).unwrap(), plaintext);
    }

    #[test]
    fn fresh_nonce_per_envelope() {
        let key = generate_key();
        let a = encrypt("same-input", &key).unwrap();
        let b = encrypt("same-input", &key).unwrap();
        // Envelopes differ but open to the same plaintext
        assert_ne!(a, b);
        assert_eq!(decrypt(&a, &key).unwrap(), "same-input");
        assert_eq!(decrypt(&b, &key).unwrap(), "same-input");
    }

    #[test]
    fn wrong_key_fails() {
        let key1 = generate_key();
        let key2 = generate_key();
        let encrypted = encrypt("secret", &key1).unwrap();
        let err = decrypt(&encrypted, &key2).unwrap_err();
        assert_matches!(err, SecretError::DecryptionFailed(reason) => {
            assert_eq!(reason, "authentication failed");
        });
    }

    #[test]
    fn flipped_bit_breaks_authentication() {
        let key = generate_key();
        let encrypted = encrypt("secret", &key).unwrap();
        let mut bytes = STANDARD.decode(&encrypted).unwrap();
        // One flipped bit breaks the Poly1305 tag check
        if let Some(b) = bytes.last_mut() {
            *b ^= 0x01;
        }
        assert!(decrypt(&STANDARD.encode(&bytes), &key).is_err());
    }

    #[test]
    fn not_base64_fails() {
        let key = generate_key();
        let err = decrypt("not base64 at all!!!", &key).unwrap_err();
        assert_matches!(err, SecretError::DecryptionFailed(reason) => {
            assert_eq!(reason, "invalid encoding");
        });
    }

    #[test]
    fn truncated_envelope_fails() {
        let key = generate_key();
        // Valid base64 shorter than a nonce
        let short = STANDARD.encode([0u8; 4]);
        let err = decrypt(&short, &key).unwrap_err();
        assert_matches!(err, SecretError::DecryptionFailed(reason) => {
            assert_eq!(reason, "ciphertext too short");
        });
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = generate_key();
        let encrypted = encrypt("", &key).unwrap();
        assert_eq!(decrypt(&encrypted, &key).unwrap(), "");
    }

    #[test]
    fn unicode_plaintext() {
        let key = generate_key();
        let plaintext = "Grüße aus Köln, 検索クエリ 🔍";
        let encrypted = encrypt(plaintext, &key).unwrap();
        assert_eq!(decrypt(&encrypted, &key).unwrap(), plaintext);
    }

    #[test]
    fn large_plaintext_roundtrips() {
        // Roughly the size of a full document batch element
        let key = generate_key();
        let plaintext = "lorem ipsum ".repeat(50_000);
        let encrypted = encrypt(&plaintext, &key).unwrap();
        assert_eq!(decrypt(&encrypted, &key).unwrap(), plaintext);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip_preserves_any_string(plaintext in ".{0,256}") {
                let key = generate_key();
                let encrypted = encrypt(&plaintext, &key).unwrap();
                let decrypted = decrypt(&encrypted, &key).unwrap();
                prop_assert_eq!(decrypted, plaintext);
            }

            #[test]
            fn ciphertext_never_contains_plaintext(plaintext in "[a-z]{16,64}") {
                let key = generate_key();
                let encrypted = encrypt(&plaintext, &key).unwrap();
                prop_assert!(!encrypted.contains(&plaintext));
            }
        }
    }
}
