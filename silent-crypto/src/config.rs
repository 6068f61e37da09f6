//! Declarative crypter setup.
//!
//! ```json
//! {
//!   "bypass": false,
//!   "keys": [
//!     { "id": 1, "secret": "Qpk1tvmH8nAljiKyyDaGJXRH82ZjWtEX+2PR50sB5WU=" }
//!   ]
//! }
//! ```
//!
//! Keys are added in the listed order, so the last entry becomes current.

use crate::error::{CryptoError, CryptoResult};
use crate::key::KeyRing;
use crate::multikey::{Mode, MultiKeyCrypter};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// One key entry with a base64-encoded secret.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    pub id: u32,
    pub secret: String,
}

impl std::fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyConfig")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Serializable description of a [`MultiKeyCrypter`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CrypterConfig {
    #[serde(default)]
    pub bypass: bool,
    pub keys: Vec<KeyConfig>,
}

impl CrypterConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> CryptoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decodes every secret and builds the crypter.
    pub fn build(&self) -> CryptoResult<MultiKeyCrypter> {
        let mut ring = KeyRing::new();
        for entry in &self.keys {
            let mut secret = STANDARD
                .decode(entry.secret.trim())
                .map_err(|_| CryptoError::InvalidKeyEncoding(entry.id))?;
            let added = ring.add_key(entry.id, &secret);
            secret.zeroize();
            added?;
        }

        let mode = if self.bypass {
            Mode::Bypass
        } else {
            Mode::Encrypt
        };
        Ok(MultiKeyCrypter::with_mode(ring, mode))
    }
}
