//! Transparent encryption overlay for MixSync project metadata.
//!
//! Files under the reserved `.mixsync/` folder are stored sealed with
//! AES-256-GCM. Everything else passes through untouched.
//!
//! - [`Keyring`]: the 256-bit key, loaded once from `MIXSYNC_KEY`
//! - [`ContentCipher`]: `encrypt` / fail-open `decrypt`
//! - [`is_protected`]: which paths the overlay applies to

pub mod cipher;
pub mod error;
pub mod keyring;
pub mod path;

pub use cipher::{CipherConfig, ContentCipher, DecryptPolicy, NONCE_LEN, TAG_LEN};
pub use error::{CipherError, CipherResult, ConfigError};
pub use keyring::{Keyring, KEY_ENV_VAR, KEY_LEN};
pub use path::{is_protected, METADATA_DIR};
