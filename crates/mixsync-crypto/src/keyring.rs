use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;

use crate::error::ConfigError;

/// Environment variable holding the base64-encoded project key.
pub const KEY_ENV_VAR: &str = "MIXSYNC_KEY";

/// Key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// The 256-bit symmetric key protecting metadata content.
///
/// Constructed once per process from the external secret and then handed to
/// [`crate::ContentCipher`] by reference. A malformed or absent secret is a
/// [`ConfigError`].
#[derive(Clone)]
pub struct Keyring([u8; KEY_LEN]);

impl Keyring {
    /// Load the key from [`KEY_ENV_VAR`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_var(KEY_ENV_VAR)
    }

    /// Load the key from a named environment variable.
    pub fn from_env_var(name: &str) -> Result<Self, ConfigError> {
        let secret = std::env::var(name).map_err(|_| ConfigError::MissingSecret(name.to_string()))?;
        Self::from_base64(&secret)
    }

    /// Decode a base64 (standard alphabet) secret of exactly 32 bytes.
    pub fn from_base64(secret: &str) -> Result<Self, ConfigError> {
        let bytes = BASE64
            .decode(secret.trim())
            .map_err(|e| ConfigError::InvalidEncoding(e.to_string()))?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| ConfigError::InvalidLength {
            expected: KEY_LEN,
            actual: b.len(),
        })?;
        Ok(Self(key))
    }

    /// Create from raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }

    /// Base64 export, suitable for [`KEY_ENV_VAR`].
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Keyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keyring(<redacted>)")
    }
}
