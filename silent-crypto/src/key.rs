//! Key material and the key ring used for rotation.
//!
//! Keys are supplied by the caller as raw bytes. The most recently added key
//! is used for new encryptions; every key ever added stays available for
//! decryption, which is how rotation works.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use std::collections::HashMap;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of engine keys in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// A symmetric key with automatic zeroization on drop.
///
/// The secret may be longer than [`KEY_SIZE`]; only the first
/// [`KEY_SIZE`] bytes reach the engine, so only those are kept.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key {
    #[zeroize(skip)]
    id: u32,
    bytes: [u8; KEY_SIZE],
}

impl Key {
    /// Creates a key, rejecting secrets shorter than [`KEY_SIZE`].
    pub fn new(id: u32, secret: &[u8]) -> CryptoResult<Self> {
        if secret.len() < KEY_SIZE {
            return Err(CryptoError::InvalidKey {
                min: KEY_SIZE,
                actual: secret.len(),
            });
        }
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&secret[..KEY_SIZE]);
        Ok(Self { id, bytes })
    }

    /// Returns the key id embedded in envelopes.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the bytes handed to the engine.
    pub fn engine_key(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// A set of keys addressed by id, plus the id used for new encryptions.
#[derive(Clone, Debug, Default)]
pub struct KeyRing {
    keys: HashMap<u32, Key>,
    current: Option<u32>,
}

impl KeyRing {
    /// Creates an empty ring. An empty ring cannot encrypt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key and makes it current.
    ///
    /// Fails with [`CryptoError::InvalidKey`] if the secret is shorter than
    /// [`KEY_SIZE`] bytes, and with [`CryptoError::DuplicateKeyId`] if the id
    /// is already taken.
    pub fn add_key(&mut self, id: u32, secret: &[u8]) -> CryptoResult<()> {
        let key = Key::new(id, secret)?;
        if self.keys.contains_key(&id) {
            return Err(CryptoError::DuplicateKeyId(id));
        }

        self.keys.insert(id, key);
        self.current = Some(id);
        debug!(key_id = id, keys = self.keys.len(), "key added to ring");
        Ok(())
    }

    /// Returns the key used for new encryptions.
    pub fn current_key(&self) -> CryptoResult<&Key> {
        self.current
            .and_then(|id| self.keys.get(&id))
            .ok_or(CryptoError::NoKeyConfigured)
    }

    /// Returns the id of the current key, if any key was added.
    pub fn current_id(&self) -> Option<u32> {
        self.current
    }

    /// Looks up a key by the id found in an envelope.
    pub fn lookup(&self, id: u32) -> CryptoResult<&Key> {
        self.keys.get(&id).ok_or(CryptoError::UnknownKeyId(id))
    }

    /// Returns true if a key with this id is present.
    pub fn contains(&self, id: u32) -> bool {
        self.keys.contains_key(&id)
    }

    /// Returns all key ids in ascending order.
    pub fn key_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.keys.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Generates a random 32-byte secret from the OS RNG.
pub fn generate_random_key() -> Vec<u8> {
    let mut bytes = vec![0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}
