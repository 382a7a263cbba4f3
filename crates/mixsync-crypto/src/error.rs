/// Fatal problems with the externally supplied secret.
///
/// Raised once at startup. The overlay cannot run without a valid key, so
/// callers should abort rather than recover.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set; provide a base64-encoded 32-byte key")]
    MissingSecret(String),

    #[error("secret is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("secret must decode to {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors from sealing or opening protected content.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(String),

    #[error("ciphertext too short: {len} bytes")]
    TooShort { len: usize },

    #[error("authentication failed (wrong key or tampered data)")]
    Authentication,

    #[error("decrypted content is not valid UTF-8")]
    Utf8,

    #[error("encryption failed")]
    Seal,
}

pub type CipherResult<T> = Result<T, CipherError>;
