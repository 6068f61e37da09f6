//! Multi-key streaming encryption for values stored at rest.
//!
//! This crate provides:
//!
//! - [`KeyRing`] - keys addressed by id, the last one added is current
//! - [`frame`] - the envelope carrying a tag and the key id
//! - [`stream`] - chunked authenticated encryption (DARE 2.0 compatible)
//! - [`MultiKeyCrypter`] - the envelope plus rotation and a bypass mode
//! - [`CrypterConfig`] - building a crypter from a JSON document
//!
//! Envelope layout:
//!
//! ```text
//! [0x01][key id u32 LE][engine packages...]   encrypted
//! [0x23][plaintext...]                        bypass ('#')
//! []                                          empty value
//! ```
//!
//! An empty input always maps to an empty output, in both directions and in
//! every mode.

mod config;
mod crypter;
mod error;
pub mod frame;
mod key;
mod multikey;
pub mod stream;

pub use config::{CrypterConfig, KeyConfig};
pub use crypter::Crypter;
pub use error::{CryptoError, CryptoResult};
pub use frame::FrameTag;
pub use key::{KEY_SIZE, Key, KeyRing, generate_random_key};
pub use multikey::{FrameReader, FrameWriter, Mode, MultiKeyCrypter};
