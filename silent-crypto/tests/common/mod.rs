//! Shared test helpers for crypter tests.

#![allow(dead_code)]

use base64::{Engine, engine::general_purpose::STANDARD};
use silent_crypto::{KeyRing, Mode, MultiKeyCrypter};

pub const KEY_1: &str = "Qpk1tvmH8nAljiKyyDaGJXRH82ZjWtEX+2PR50sB5WU=";
pub const KEY_2: &str =
    "0XqMfshBExmDODXUVGFNst4HvyBbosb+Nk7sFhSzBoeMRltzqPZM/Uv83oBgcEAX3M2sbgHIkiw+up8TtfFKmQ==";
/// Same id as [`KEY_1`], different secret.
pub const KEY_1_BROKEN: &str = "D4xyo0odW5doB3rlLQ+2XglIqXJdq4QSOFFs/fqAAEU=";

pub const HELLO: &str = "Hello, World!";
pub const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Quisque vitae urna non enim ullamcorper convallis at vitae mauris. Aenean elementum sollicitudin malesuada. Quisque eleifend convallis arcu, id convallis est rutrum et. Duis a nisl vel nisl faucibus fringilla in vel eros. Donec urna massa, laoreet at elementum vel, egestas nec mauris. Ut at enim rhoncus, consequat velit a, aliquam odio. Curabitur id molestie leo. Proin id tellus eu justo condimentum aliquam vel ut velit. Nam non sem in turpis rutrum lacinia ut id eros. Phasellus et ipsum ut metus eleifend faucibus. Lorem ipsum dolor sit.";

pub fn decode_base64(encoded: &str) -> Vec<u8> {
    STANDARD.decode(encoded).expect("test vector is valid base64")
}

/// Builds a crypter from `(id, base64 secret)` pairs; the last pair is current.
pub fn crypter(mode: Mode, keys: &[(u32, &str)]) -> MultiKeyCrypter {
    let mut ring = KeyRing::new();
    for (id, secret) in keys {
        ring.add_key(*id, &decode_base64(secret)).expect("valid test key");
    }
    MultiKeyCrypter::with_mode(ring, mode)
}

/// Key 1 only.
pub fn c1() -> MultiKeyCrypter {
    crypter(Mode::Encrypt, &[(1, KEY_1)])
}

/// Keys 1 and 2, key 2 current.
pub fn c2() -> MultiKeyCrypter {
    crypter(Mode::Encrypt, &[(1, KEY_1), (2, KEY_2)])
}

/// Key 1, bypass mode.
pub fn c1_bypass() -> MultiKeyCrypter {
    crypter(Mode::Bypass, &[(1, KEY_1)])
}

/// Key id 1 bound to a different secret.
pub fn c1_broken() -> MultiKeyCrypter {
    crypter(Mode::Encrypt, &[(1, KEY_1_BROKEN)])
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
