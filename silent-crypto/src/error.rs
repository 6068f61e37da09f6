//! Error types for the encryption layer.

use std::io;
use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
///
/// The first group is raised while the crypter is being set up (or used
/// before setup finished) and points at a deployment mistake. Everything
/// else is a data error that is returned to the caller of the decrypt path.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material is shorter than the engine requires.
    #[error("misconfiguration: key must be at least {min} bytes, got {actual}")]
    InvalidKey { min: usize, actual: usize },

    /// A key with this id was already added to the ring.
    #[error("misconfiguration: duplicate key id {0}")]
    DuplicateKeyId(u32),

    /// Encryption was attempted before any key was added.
    #[error("misconfiguration: no keys were added")]
    NoKeyConfigured,

    /// Key material in a configuration document is not valid base64.
    #[error("misconfiguration: key {0} is not valid base64")]
    InvalidKeyEncoding(u32),

    /// The envelope references a key id that is not in the ring.
    #[error("unknown key id {0}")]
    UnknownKeyId(u32),

    /// The envelope (or an engine package) carries an unsupported version tag.
    #[error("unsupported version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// The envelope is truncated or otherwise structurally invalid.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong key or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Plaintext is too large for the stream engine's sequence space.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(u64),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying reader or writer failed.
    #[error("io error: {0}")]
    Io(io::Error),
}

impl CryptoError {
    /// Returns true for errors caused by setup mistakes rather than by the data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CryptoError::InvalidKey { .. }
                | CryptoError::DuplicateKeyId(_)
                | CryptoError::NoKeyConfigured
                | CryptoError::InvalidKeyEncoding(_)
        )
    }

    /// Wraps this error so it can travel through `Read`/`Write` impls.
    pub(crate) fn into_io(self) -> io::Error {
        let kind = match &self {
            CryptoError::Io(err) => err.kind(),
            CryptoError::MalformedFrame(_) => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, self)
    }
}

// Errors raised inside the streaming adapters come back as `io::Error`;
// unwrap them to the original typed variant.
impl From<io::Error> for CryptoError {
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<CryptoError>()) {
            return CryptoError::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<CryptoError>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(inner)) => CryptoError::Io(io::Error::other(inner)),
            None => CryptoError::Io(io::ErrorKind::Other.into()),
        }
    }
}
