//! The encrypted value wrapper.

use crate::error::ValueResult;
use crate::registry::{CrypterRegistry, with_active};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;

/// Kind used when an [`EncryptedValue`] names none.
///
/// Kinds are zero-sized marker types; declare one per crypter:
///
/// ```ignore
/// pub enum Pii {}
/// registry.register::<Pii>(pii_crypter)?;
/// let email: EncryptedValue<Pii> = "jane@example.com".into();
/// ```
pub enum DefaultKind {}

/// Plaintext bytes that are encrypted whenever they cross a JSON or SQL
/// boundary, using the crypter registered for `K`.
///
/// A zero-length value is the empty value. It is always stored as empty and
/// never reaches a crypter, so empty fields work without any setup.
pub struct EncryptedValue<K = DefaultKind> {
    bytes: Vec<u8>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> EncryptedValue<K> {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            _kind: PhantomData,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the plaintext as UTF-8, if it is.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl<K: 'static> EncryptedValue<K> {
    /// Encrypts with the crypter `registry` binds to `K`.
    pub fn encrypt_with(&self, registry: &CrypterRegistry) -> ValueResult<Vec<u8>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        Ok(registry.resolve::<K>()?.encrypt(&self.bytes)?)
    }

    /// Decrypts an envelope with the crypter `registry` binds to `K`.
    pub fn decrypt_with(ciphertext: &[u8], registry: &CrypterRegistry) -> ValueResult<Self> {
        if ciphertext.is_empty() {
            return Ok(Self::empty());
        }
        let plaintext = registry.resolve::<K>()?.decrypt(ciphertext)?;
        Ok(Self::new(plaintext))
    }

    /// Encrypts through the active registry.
    pub fn encrypt(&self) -> ValueResult<Vec<u8>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        with_active(|registry| self.encrypt_with(registry))
    }

    /// Decrypts through the active registry.
    pub fn decrypt(ciphertext: &[u8]) -> ValueResult<Self> {
        if ciphertext.is_empty() {
            return Ok(Self::empty());
        }
        with_active(|registry| Self::decrypt_with(ciphertext, registry))
    }
}

impl<K> Clone for EncryptedValue<K> {
    fn clone(&self) -> Self {
        Self::new(self.bytes.clone())
    }
}

impl<K> Default for EncryptedValue<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K> PartialEq for EncryptedValue<K> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<K> Eq for EncryptedValue<K> {}

impl<K> Hash for EncryptedValue<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl<K> fmt::Debug for EncryptedValue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<K> fmt::Display for EncryptedValue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedValue({})", String::from_utf8_lossy(&self.bytes))
    }
}

impl<K> Deref for EncryptedValue<K> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<K> AsRef<[u8]> for EncryptedValue<K> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<K> From<Vec<u8>> for EncryptedValue<K> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl<K> From<&[u8]> for EncryptedValue<K> {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl<K> From<String> for EncryptedValue<K> {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl<K> From<&str> for EncryptedValue<K> {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl<K> From<EncryptedValue<K>> for Vec<u8> {
    fn from(value: EncryptedValue<K>) -> Self {
        value.bytes
    }
}
