use std::sync::OnceLock;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CipherError, CipherResult};
use crate::keyring::Keyring;

/// AES-GCM nonce length (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// What to do when protected content does not decrypt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecryptPolicy {
    /// Return the stored text unchanged. Tolerates metadata written before
    /// encryption was introduced or edited outside the overlay.
    #[default]
    FailOpen,
    /// Surface the [`CipherError`].
    Strict,
}

/// Overlay configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CipherConfig {
    #[serde(default)]
    pub decrypt_policy: DecryptPolicy,
}

/// Authenticated encryption for protected content.
///
/// Ciphertext is a single base64 text blob: `nonce (12 bytes) || AES-256-GCM
/// ciphertext+tag`. Every call to [`Self::encrypt`] draws a fresh random
/// nonce, so the blob is self-contained.
///
/// The AES key schedule is built lazily on first use and cached for the
/// lifetime of the cipher.
pub struct ContentCipher {
    keyring: Keyring,
    config: CipherConfig,
    aead: OnceLock<Aes256Gcm>,
}

impl ContentCipher {
    pub fn new(keyring: Keyring) -> Self {
        Self::with_config(keyring, CipherConfig::default())
    }

    pub fn with_config(keyring: Keyring, config: CipherConfig) -> Self {
        Self {
            keyring,
            config,
            aead: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &CipherConfig {
        &self.config
    }

    fn aead(&self) -> &Aes256Gcm {
        self.aead.get_or_init(|| {
            debug!("importing content key");
            Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.keyring.as_bytes()))
        })
    }

    /// Seal `plaintext` under a fresh nonce.
    pub fn encrypt(&self, plaintext: &str) -> CipherResult<String> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .aead()
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::Seal)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + sealed.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&sealed);
        Ok(BASE64.encode(combined))
    }

    /// Strictly open a sealed blob, reporting why it failed.
    pub fn open(&self, ciphertext: &str) -> CipherResult<String> {
        let combined = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| CipherError::Encoding(e.to_string()))?;
        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::TooShort {
                len: combined.len(),
            });
        }
        let (nonce, sealed) = combined.split_at(NONCE_LEN);
        let plain = self
            .aead()
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Authentication)?;
        String::from_utf8(plain).map_err(|_| CipherError::Utf8)
    }

    /// Fail-open decryption: any input that does not open is returned
    /// unchanged. Never fails.
    pub fn decrypt(&self, ciphertext: &str) -> String {
        match self.open(ciphertext) {
            Ok(plain) => plain,
            Err(err) => {
                debug!(error = %err, "content did not decrypt; passing through");
                ciphertext.to_string()
            }
        }
    }

    /// Decrypt according to the configured [`DecryptPolicy`].
    pub fn decrypt_with_policy(&self, ciphertext: &str) -> CipherResult<String> {
        match self.config.decrypt_policy {
            DecryptPolicy::FailOpen => Ok(self.decrypt(ciphertext)),
            DecryptPolicy::Strict => self.open(ciphertext),
        }
    }
}

impl std::fmt::Debug for ContentCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCipher")
            .field("keyring", &self.keyring)
            .field("config", &self.config)
            .field("key_imported", &self.aead.get().is_some())
            .finish()
    }
}
