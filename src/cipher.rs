//! # Note encryption
//!
//! Notes and exercise names are encrypted before they reach the store and
//! decrypted on the way out. The envelope is the OpenSSL "salted" format
//! (`base64("Salted__" || salt || AES-256-CBC(text))`, key and IV from
//! `EVP_BytesToKey` with MD5), which is what the web client wrote before the
//! API existed, so old rows keep decrypting.
//!
//! Nothing in here returns an error to the caller. A note that cannot be
//! encrypted is stored as written; a value that cannot be decrypted is
//! returned as stored. Rows written before encryption was switched on are
//! recognised heuristically and passed through.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use md5::{Digest, Md5};
use rand::RngCore;

use crate::models::log::Log;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const SALT_MAGIC: &[u8; 8] = b"Salted__";
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// Values shorter than this with no `/` or `+` are taken as legacy plaintext.
const MIN_CIPHER_TEXT_LEN: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("invalid key or iv length")]
    KeyLength,

    #[error("not base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("missing salt header")]
    MissingSalt,

    #[error("bad padding or wrong key")]
    Unpad,

    #[error("decrypted bytes are not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Clone)]
pub struct NoteCipher {
    secret: String,
}

impl std::fmt::Debug for NoteCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteCipher").finish_non_exhaustive()
    }
}

impl NoteCipher {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Empty in, empty out. Falls back to the plaintext if encryption fails.
    pub fn encrypt(&self, plaintext: &str) -> String {
        if plaintext.is_empty() {
            return String::new();
        }

        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        match self.encrypt_with_salt(plaintext, &salt) {
            Ok(cipher_text) => cipher_text,
            Err(e) => {
                tracing::warn!(error = %e, "Note encryption failed, storing plaintext");
                plaintext.to_string()
            }
        }
    }

    pub fn decrypt(&self, cipher_text: &str) -> String {
        if cipher_text.is_empty() {
            return String::new();
        }
        if looks_like_plaintext(cipher_text) {
            return cipher_text.to_string();
        }

        match self.try_decrypt(cipher_text) {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => cipher_text.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "Value did not decrypt, returning as stored");
                cipher_text.to_string()
            }
        }
    }

    pub fn encrypt_all(&self, items: &[String]) -> Vec<String> {
        items.iter().map(|item| self.encrypt(item)).collect()
    }

    pub fn decrypt_all(&self, items: &[String]) -> Vec<String> {
        items.iter().map(|item| self.decrypt(item)).collect()
    }

    /// Encrypts the free-text fields of a log before it is written.
    pub fn seal_log(&self, mut log: Log) -> Log {
        log.notes = log.notes.as_deref().map(|n| self.encrypt(n));
        log.exercises = self.encrypt_all(&log.exercises);
        log
    }

    /// Decrypts the free-text fields of a log read from the store.
    pub fn open_log(&self, mut log: Log) -> Log {
        log.notes = log.notes.as_deref().map(|n| self.decrypt(n));
        log.exercises = self.decrypt_all(&log.exercises);
        log
    }

    fn encrypt_with_salt(&self, plaintext: &str, salt: &[u8; SALT_LEN]) -> Result<String, CipherError> {
        let (key, iv) = derive_key_iv(self.secret.as_bytes(), salt);
        let encryptor =
            Aes256CbcEnc::new_from_slices(&key, &iv).map_err(|_| CipherError::KeyLength)?;
        let body = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut envelope = Vec::with_capacity(SALT_MAGIC.len() + SALT_LEN + body.len());
        envelope.extend_from_slice(SALT_MAGIC);
        envelope.extend_from_slice(salt);
        envelope.extend_from_slice(&body);
        Ok(STANDARD.encode(envelope))
    }

    fn try_decrypt(&self, cipher_text: &str) -> Result<String, CipherError> {
        let raw = STANDARD.decode(cipher_text.trim())?;
        let header_len = SALT_MAGIC.len() + SALT_LEN;
        if raw.len() < header_len || &raw[..SALT_MAGIC.len()] != SALT_MAGIC {
            return Err(CipherError::MissingSalt);
        }

        let salt = &raw[SALT_MAGIC.len()..header_len];
        let body = &raw[header_len..];
        if body.is_empty() || body.len() % BLOCK_LEN != 0 {
            return Err(CipherError::Unpad);
        }

        let (key, iv) = derive_key_iv(self.secret.as_bytes(), salt);
        let decryptor =
            Aes256CbcDec::new_from_slices(&key, &iv).map_err(|_| CipherError::KeyLength)?;
        let plain = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(body)
            .map_err(|_| CipherError::Unpad)?;
        Ok(String::from_utf8(plain)?)
    }
}

/// Legacy-plaintext heuristic: no `/`, no `+` and shorter than 20 chars.
///
/// Imprecise in both directions; values carry no format tag to tell the two
/// apart.
fn looks_like_plaintext(value: &str) -> bool {
    !value.contains('/') && !value.contains('+') && value.chars().count() < MIN_CIPHER_TEXT_LEN
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration.
fn derive_key_iv(secret: &[u8], salt: &[u8]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut material = Vec::with_capacity(KEY_LEN + IV_LEN + 16);
    let mut prev: Vec<u8> = Vec::new();
    while material.len() < KEY_LEN + IV_LEN {
        let mut hasher = Md5::new();
        hasher.update(&prev);
        hasher.update(secret);
        hasher.update(salt);
        prev = hasher.finalize().to_vec();
        material.extend_from_slice(&prev);
    }

    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&material[..KEY_LEN]);
    iv.copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);
    (key, iv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::LocalDate;

    const DEFAULT_SECRET: &str = "default-secret-key-change-me";

    // openssl enc -aes-256-cbc -md md5 -S 0102030405060708 \
    //   -pass pass:default-secret-key-change-me, with the Salted__ header
    const OPENSSL_CIPHER_TEXT: &str = "U2FsdGVkX18BAgMEBQYHCPmSMtwNixFi/aGXmRLYN4wzCllgjlabDGN9FVV/XgNG";
    const OPENSSL_PLAINTEXT: &str = "Went for a long run, felt great";

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_key_derivation_matches_openssl() {
        let (key, iv) = derive_key_iv(DEFAULT_SECRET.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            to_hex(&key),
            "c629991895219f463f5294ba4319d4885db0e93e64b57f66e527a6fccaca4c97"
        );
        assert_eq!(to_hex(&iv), "291c75d56d02ab4b966b4b6a123330b5");
    }

    #[test]
    fn test_decrypts_openssl_envelope() {
        let cipher = NoteCipher::new(DEFAULT_SECRET);
        assert_eq!(cipher.decrypt(OPENSSL_CIPHER_TEXT), OPENSSL_PLAINTEXT);
    }

    #[test]
    fn test_encrypt_with_fixed_salt_matches_openssl() {
        let cipher = NoteCipher::new(DEFAULT_SECRET);
        let out = cipher
            .encrypt_with_salt(OPENSSL_PLAINTEXT, &[1, 2, 3, 4, 5, 6, 7, 8])
            .unwrap();
        assert_eq!(out, OPENSSL_CIPHER_TEXT);
    }

    #[test]
    fn test_round_trip() {
        let cipher = NoteCipher::new("s3cret");
        for text in ["a", "short", "Felt tired after work / skipped gym", "ünïcødé ✓"] {
            let sealed = cipher.encrypt(text);
            assert_ne!(sealed, text);
            assert!(sealed.starts_with("U2FsdGVkX1"));
            assert_eq!(cipher.decrypt(&sealed), text);
        }
    }

    #[test]
    fn test_random_salt_changes_output() {
        let cipher = NoteCipher::new("s3cret");
        assert_ne!(cipher.encrypt("same note"), cipher.encrypt("same note"));
    }

    #[test]
    fn test_empty_input() {
        let cipher = NoteCipher::new("s3cret");
        assert_eq!(cipher.encrypt(""), "");
        assert_eq!(cipher.decrypt(""), "");
        assert!(cipher.encrypt_all(&[]).is_empty());
        assert!(cipher.decrypt_all(&[]).is_empty());
    }

    #[test]
    fn test_short_plaintext_passes_through() {
        let cipher = NoteCipher::new("s3cret");
        assert_eq!(cipher.decrypt("short"), "short");
        assert_eq!(cipher.decrypt("Bench press"), "Bench press");
    }

    #[test]
    fn test_undecryptable_values_returned_as_is() {
        let cipher = NoteCipher::new("s3cret");
        // Long legacy note: passes the heuristic, fails base64
        let legacy = "Legacy note written before encryption, with a / slash";
        assert_eq!(cipher.decrypt(legacy), legacy);
        // Valid base64 but no salt header
        let unsalted = "QUJDREVGR0hJSktMTU5PUFFSU1RVVldY";
        assert_eq!(cipher.decrypt(unsalted), unsalted);
    }

    #[test]
    fn test_wrong_secret_returns_input() {
        let sealed = NoteCipher::new("right")
            .encrypt_with_salt("Rest day, long walk instead", &[1, 2, 3, 4, 5, 6, 7, 8])
            .unwrap();
        assert_eq!(sealed, "U2FsdGVkX18BAgMEBQYHCAzeRrttAHzZVTvu5W6sGWThF2V2bi4w1y2Jp4/95ZmH");

        // the wrong key fails the padding check, so the stored value comes back untouched
        let wrong = NoteCipher::new("wrong");
        assert!(matches!(wrong.try_decrypt(&sealed), Err(CipherError::Unpad)));
        assert_eq!(wrong.decrypt(&sealed), sealed);
    }

    #[test]
    fn test_array_helpers_are_elementwise() {
        let cipher = NoteCipher::new("s3cret");
        let items = vec!["Squats".to_string(), "Squats".to_string(), "Rowing".to_string()];
        let sealed = cipher.encrypt_all(&items);
        assert_eq!(sealed.len(), 3);
        assert_eq!(cipher.decrypt_all(&sealed), items);
    }

    #[test]
    fn test_seal_and_open_log() {
        let cipher = NoteCipher::new("s3cret");
        let log = Log {
            date: LocalDate::new(2025, 5, 10),
            mood: 4,
            worked_out: true,
            exercises: vec!["Yoga".into()],
            drinks: 1,
            notes: Some("Slept well".into()),
        };
        let sealed = cipher.seal_log(log.clone());
        assert_ne!(sealed.notes, log.notes);
        assert_ne!(sealed.exercises, log.exercises);
        assert_eq!(sealed.mood, 4);
        assert_eq!(cipher.open_log(sealed), log);
    }
}
