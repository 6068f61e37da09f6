//! Transparently encrypted values.
//!
//! [`EncryptedValue<K>`] holds plaintext in memory and is encrypted whenever
//! it is serialized to JSON (serde) or bound to an SQLite column (rusqlite).
//! The crypter is chosen by the value's kind `K` through a
//! [`CrypterRegistry`]:
//!
//! ```ignore
//! use silent_value::{CrypterRegistry, DefaultKind, EncryptedValue};
//!
//! let mut registry = CrypterRegistry::new();
//! registry.register::<DefaultKind>(crypter)?;
//! Arc::new(registry).install_global()?;
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     email: EncryptedValue,
//! }
//! ```
//!
//! Empty values are stored as empty and never reach a crypter.

mod error;
pub mod json;
mod registry;
mod sql;
mod value;

pub use error::{ValueError, ValueResult};
pub use registry::{CrypterRegistry, RegistryGuard, with_active};
pub use value::{DefaultKind, EncryptedValue};

pub use silent_crypto::{Crypter, CrypterConfig, CryptoError, KeyRing, Mode, MultiKeyCrypter};
