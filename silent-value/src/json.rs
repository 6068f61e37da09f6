//! Text form used for JSON documents.
//!
//! | ciphertext              | text                  |
//! |-------------------------|-----------------------|
//! | empty                   | `""`                  |
//! | valid UTF-8             | `"#" + ciphertext`    |
//! | anything else           | base64 (standard)     |
//!
//! Bypass envelopes start with `'#'` themselves, so a bypassed `abc` is
//! written as `"##abc"` and stays readable in the document. `null` reads as
//! the empty value.

use crate::error::ValueResult;
use crate::registry::{CrypterRegistry, with_active};
use crate::value::EncryptedValue;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

const TEXT_MARKER: char = '#';

/// Renders an envelope as text.
pub fn encode_text(ciphertext: &[u8]) -> String {
    match std::str::from_utf8(ciphertext) {
        Ok("") => String::new(),
        Ok(text) => {
            let mut out = String::with_capacity(text.len() + 1);
            out.push(TEXT_MARKER);
            out.push_str(text);
            out
        }
        Err(_) => STANDARD.encode(ciphertext),
    }
}

/// Recovers the envelope from its text form.
pub fn decode_text(text: &str) -> ValueResult<Vec<u8>> {
    if let Some(raw) = text.strip_prefix(TEXT_MARKER) {
        return Ok(raw.as_bytes().to_vec());
    }
    Ok(STANDARD.decode(text)?)
}

impl<K: 'static> EncryptedValue<K> {
    /// Encrypts and renders the text form with an explicit registry.
    pub fn to_json_text_with(&self, registry: &CrypterRegistry) -> ValueResult<String> {
        Ok(encode_text(&self.encrypt_with(registry)?))
    }

    /// Parses and decrypts the text form with an explicit registry.
    pub fn from_json_text_with(text: &str, registry: &CrypterRegistry) -> ValueResult<Self> {
        if text.is_empty() {
            return Ok(Self::empty());
        }
        Self::decrypt_with(&decode_text(text)?, registry)
    }

    fn to_json_text(&self) -> ValueResult<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        with_active(|registry| self.to_json_text_with(registry))
    }

    fn from_json_text(text: &str) -> ValueResult<Self> {
        if text.is_empty() {
            return Ok(Self::empty());
        }
        with_active(|registry| Self::from_json_text_with(text, registry))
    }
}

impl<K: 'static> Serialize for EncryptedValue<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_json_text().map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de, K: 'static> Deserialize<'de> for EncryptedValue<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_option(TextVisitor(PhantomData))
    }
}

struct TextVisitor<K>(PhantomData<fn() -> K>);

impl<'de, K: 'static> Visitor<'de> for TextVisitor<K> {
    type Value = EncryptedValue<K>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an encrypted string or null")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(EncryptedValue::empty())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(EncryptedValue::empty())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_str(self)
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
        EncryptedValue::from_json_text(text).map_err(E::custom)
    }
}
