//! Error types for encrypted values.

use silent_crypto::CryptoError;
use thiserror::Error;

/// Result type for registry and value operations.
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors raised while binding, encrypting or decoding encrypted values.
#[derive(Debug, Error)]
pub enum ValueError {
    /// The crypter itself failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A crypter is already registered for this kind.
    #[error("misconfiguration: crypter for {0} is already registered")]
    DuplicateRegistration(&'static str),

    /// No crypter is registered for this kind.
    #[error("misconfiguration: no crypter registered for {0}")]
    NoCrypterRegistered(&'static str),

    /// Serialization ran outside any registry scope and no global registry
    /// was installed.
    #[error("misconfiguration: no active crypter registry")]
    NoActiveRegistry,

    /// A global registry was already installed.
    #[error("misconfiguration: global crypter registry already installed")]
    RegistryAlreadyInstalled,

    /// The text form is neither `#`-prefixed nor valid base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The database column holds a type that cannot carry an envelope.
    #[error("cannot scan {0} into an encrypted value")]
    ScanTypeMismatch(rusqlite::types::Type),
}

impl ValueError {
    /// Returns true for errors caused by setup mistakes rather than by the data.
    pub fn is_configuration(&self) -> bool {
        match self {
            ValueError::Crypto(err) => err.is_configuration(),
            ValueError::DuplicateRegistration(_)
            | ValueError::NoCrypterRegistered(_)
            | ValueError::NoActiveRegistry
            | ValueError::RegistryAlreadyInstalled => true,
            ValueError::InvalidBase64(_) | ValueError::ScanTypeMismatch(_) => false,
        }
    }
}
