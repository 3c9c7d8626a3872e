//! Credential cipher and key resolution.
//!
//! Stored credentials may be wrapped in a textual `ENC(...)` marker so the
//! settings document can carry encrypted and plaintext values side by side
//! without external metadata. The payload inside the marker is
//! `base64(salt || nonce || ciphertext)`: a fresh 16-byte salt and 12-byte
//! nonce are drawn per call, the key is derived from the passphrase with
//! Argon2id and the value sealed with AES-256-GCM. Re-encrypting the same
//! plaintext therefore yields different bytes, all decrypting to the same
//! value.
//!
//! Key material is resolved through a [`KeySource`] built once at startup:
//! explicit key, then the `DYNUP_ENCRYPT_KEY` environment variable, then a
//! key file named by `DYNUP_ENCRYPT_KEY_FILE`.

use std::env;
use std::fs;
use std::sync::LazyLock;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use regex::Regex;

use crate::error::{Error, Result};

/// Environment variable consulted for the credential key.
pub const ENCRYPT_KEY_ENV: &str = "DYNUP_ENCRYPT_KEY";

/// Environment variable naming a file whose contents are the credential key.
pub const ENCRYPT_KEY_FILE_ENV: &str = "DYNUP_ENCRYPT_KEY_FILE";

/// Salt length for key derivation
const SALT_LEN: usize = 16;

/// Nonce length for AES-GCM
const NONCE_LEN: usize = 12;

static ENC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ENC\((.+)\)$").expect("valid marker pattern"));

/// True iff the trimmed value is in `ENC(...)` marker form.
pub fn is_encrypted(value: &str) -> bool {
    ENC_PATTERN.is_match(value.trim())
}

/// Encrypt a credential value under `key`, producing `ENC(...)` text.
///
/// Empty input passes through unchanged: absent credentials never gain a
/// marker.
pub fn encrypt(plaintext: &str, key: &str) -> Result<String> {
    if plaintext.is_empty() {
        return Ok(plaintext.to_string());
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let derived = derive_key(key, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&derived)
        .map_err(|e| Error::decryption(format!("cipher setup failed: {}", e)))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| Error::decryption(format!("encryption failed: {}", e)))?;

    let mut payload = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&nonce_bytes);
    payload.extend_from_slice(&ciphertext);

    Ok(format!("ENC({})", BASE64.encode(payload)))
}

/// Decrypt an `ENC(...)` value under `key`.
///
/// Empty input and values not in marker form pass through unchanged. Marker
/// values that fail to decrypt (wrong key, truncated or corrupted payload)
/// fail with [`Error::Decryption`].
pub fn decrypt(value: &str, key: &str) -> Result<String> {
    if value.is_empty() {
        return Ok(value.to_string());
    }

    let trimmed = value.trim();
    let Some(captures) = ENC_PATTERN.captures(trimmed) else {
        return Ok(value.to_string());
    };

    let raw = BASE64
        .decode(&captures[1])
        .map_err(|e| Error::decryption(format!("payload is not valid base64: {}", e)))?;
    if raw.len() <= SALT_LEN + NONCE_LEN {
        return Err(Error::decryption("payload is truncated"));
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let derived = derive_key(key, salt)?;
    let cipher = Aes256Gcm::new_from_slice(&derived)
        .map_err(|e| Error::decryption(format!("cipher setup failed: {}", e)))?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| Error::decryption("invalid encryption key or corrupted payload"))?;

    String::from_utf8(plaintext)
        .map_err(|_| Error::decryption("decrypted payload is not valid UTF-8"))
}

/// Derive a 256-bit cipher key from a passphrase with Argon2id.
fn derive_key(key: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let mut out = [0u8; 32];
    Argon2::default()
        .hash_password_into(key.as_bytes(), salt, &mut out)
        .map_err(|e| Error::decryption(format!("key derivation failed: {}", e)))?;
    Ok(out)
}

/// Credential key capability.
///
/// Resolution precedence: explicit key (e.g. a `--key` flag), then the
/// [`ENCRYPT_KEY_ENV`] environment variable, then the contents of the file
/// named by [`ENCRYPT_KEY_FILE_ENV`]. Built once and passed to whoever
/// needs key material; nothing else reads the environment for keys.
#[derive(Clone, Default)]
pub struct KeySource {
    explicit: Option<String>,
}

// The explicit key never appears in Debug output
impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySource")
            .field("explicit", &self.explicit.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl KeySource {
    /// Create a key source, optionally seeded with an explicit key.
    pub fn new(explicit: Option<String>) -> Self {
        Self {
            explicit: explicit.filter(|k| !k.is_empty()),
        }
    }

    /// Resolve the key, or `None` when no source provides one.
    pub fn resolve(&self) -> Option<String> {
        if let Some(key) = &self.explicit {
            return Some(key.clone());
        }
        if let Ok(key) = env::var(ENCRYPT_KEY_ENV)
            && !key.is_empty()
        {
            return Some(key);
        }
        if let Ok(path) = env::var(ENCRYPT_KEY_FILE_ENV)
            && !path.is_empty()
            && let Ok(contents) = fs::read_to_string(&path)
        {
            let key = contents.trim().to_string();
            if !key.is_empty() {
                return Some(key);
            }
        }
        None
    }

    /// Resolve the key, failing with [`Error::MissingKey`] when absent.
    pub fn require(&self) -> Result<String> {
        self.resolve().ok_or_else(|| {
            Error::missing_key(format!(
                "pass an explicit key, set {} or point {} at a key file",
                ENCRYPT_KEY_ENV, ENCRYPT_KEY_FILE_ENV
            ))
        })
    }
}
