//! Cipher vault: AES-256-GCM encryption of redacted text.
//!
//! The vault holds one 256-bit key for the lifetime of the process. The key is
//! persisted as base64 in a key file and is loaded on startup, or generated on
//! first run.
//!
//! Ciphertext format: `base64(nonce || ciphertext || tag)`
//! - nonce: 12 random bytes, fresh per encryption
//! - tag: 16 bytes, verified before any plaintext is returned

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::Rng;
use sha2::{Digest, Sha256};
use socio_core::CryptoError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Where the vault key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Read from an existing key file.
    Loaded,
    /// Generated on this run and written to the key file.
    Generated,
    /// Supplied directly by the caller (tests, ephemeral engines).
    Provided,
}

/// Symmetric encryption over a single process-wide key.
///
/// There is no way to build a vault without a valid 32-byte key.
pub struct CipherVault {
    cipher: Aes256Gcm,
    fingerprint: String,
    origin: KeyOrigin,
}

impl std::fmt::Debug for CipherVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherVault")
            .field("fingerprint", &self.fingerprint)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl CipherVault {
    /// Load the key at `key_path`, or generate and persist a new one.
    pub fn initialize(key_path: &Path) -> Result<Self, CryptoError> {
        match std::fs::read_to_string(key_path) {
            Ok(contents) => {
                let vault = Self::from_encoded_key(&contents, KeyOrigin::Loaded)?;
                debug!(
                    path = %key_path.display(),
                    fingerprint = %vault.fingerprint,
                    "Encryption key loaded"
                );
                Ok(vault)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::generate_at(key_path),
            Err(e) => Err(CryptoError::KeyIo(e.to_string())),
        }
    }

    /// Build a vault from raw key bytes.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, CryptoError> {
        Self::build(key, KeyOrigin::Provided)
    }

    /// A vault over a fresh random key that is never persisted.
    pub fn ephemeral() -> Self {
        let key = random_key();
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
            fingerprint: fingerprint_of(&key),
            origin: KeyOrigin::Provided,
        }
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes[..]);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(output))
    }

    /// Decrypt a value produced by [`CipherVault::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::MalformedCiphertext)?;

        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::MalformedCiphertext);
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Short SHA-256 fingerprint of the key, safe to display.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }

    fn from_encoded_key(contents: &str, origin: KeyOrigin) -> Result<Self, CryptoError> {
        let key = STANDARD
            .decode(contents.trim())
            .map_err(|_| CryptoError::KeyCorrupt)?;
        Self::build(&key, origin)
    }

    fn build(key: &[u8], origin: KeyOrigin) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::KeyCorrupt);
        }
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::KeyCorrupt)?;
        Ok(Self {
            cipher,
            fingerprint: fingerprint_of(key),
            origin,
        })
    }

    fn generate_at(key_path: &Path) -> Result<Self, CryptoError> {
        if let Some(parent) = key_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CryptoError::KeyIo(e.to_string()))?;
        }

        let key = random_key();
        let encoded = STANDARD.encode(key);

        // The key only appears at `key_path` once fully written: stage it
        // next to the target, then link it into place. Linking never
        // replaces an existing file.
        let staging = staging_path(key_path);
        let published = write_key_file(&staging, encoded.as_bytes())
            .and_then(|()| std::fs::hard_link(&staging, key_path));
        let _ = std::fs::remove_file(&staging);

        match published {
            Ok(()) => {}
            // Another process won the race; use its key.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let contents = std::fs::read_to_string(key_path)
                    .map_err(|e| CryptoError::KeyIo(e.to_string()))?;
                return Self::from_encoded_key(&contents, KeyOrigin::Loaded);
            }
            Err(e) => return Err(CryptoError::KeyIo(e.to_string())),
        }

        let vault = Self::build(&key, KeyOrigin::Generated)?;
        info!(
            path = %key_path.display(),
            fingerprint = %vault.fingerprint,
            "Generated new encryption key"
        );
        Ok(vault)
    }
}

/// A unique sibling of `key_path` to write the new key into.
fn staging_path(key_path: &Path) -> PathBuf {
    let mut name = key_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{:016x}.tmp", rand::rng().random::<u64>()));
    key_path.with_file_name(name)
}

/// Create `path` owner-only and write `contents` durably.
fn write_key_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn random_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    rand::rng().fill(&mut key[..]);
    key
}

fn fingerprint_of(key: &[u8]) -> String {
    let digest = Sha256::digest(key);
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}
