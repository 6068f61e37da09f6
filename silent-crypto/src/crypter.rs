//! Abstract encryption strategy bound to encrypted value kinds.
//!
//! Serialization hooks depend on `dyn Crypter`; they never see keys.
//! [`MultiKeyCrypter`](crate::MultiKeyCrypter) is the built-in
//! implementation, and callers may register their own.

use crate::error::CryptoResult;
use std::sync::Arc;

/// Encrypts and decrypts opaque byte slices.
///
/// Implementations own the key material. An empty input must map to an
/// empty output in both directions.
pub trait Crypter: Send + Sync {
    /// Encrypts `data`, returning a self-describing envelope.
    fn encrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Decrypts an envelope previously produced by `encrypt`.
    fn decrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>>;
}

impl<C: Crypter + ?Sized> Crypter for Arc<C> {
    fn encrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        (**self).encrypt(data)
    }

    fn decrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        (**self).decrypt(data)
    }
}

impl<C: Crypter + ?Sized> Crypter for &C {
    fn encrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        (**self).encrypt(data)
    }

    fn decrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        (**self).decrypt(data)
    }
}
