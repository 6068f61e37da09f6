//! Shared test helpers for encrypted value tests.

#![allow(dead_code)]

use base64::{Engine, engine::general_purpose::STANDARD};
use silent_value::{CrypterRegistry, KeyRing, MultiKeyCrypter};
use std::sync::Arc;

pub const KEY_1: &str = "Qpk1tvmH8nAljiKyyDaGJXRH82ZjWtEX+2PR50sB5WU=";

pub const HELLO: &str = "Hello, world!";
pub const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Quisque vitae urna non enim ullamcorper convallis at vitae mauris. Aenean elementum sollicitudin malesuada.";

/// Kind bound to an encrypting crypter.
pub enum Sealed {}

/// Kind bound to a bypass crypter with the same key.
pub enum Legible {}

/// Kind that is never registered.
pub enum Orphan {}

pub fn ring() -> KeyRing {
    let mut ring = KeyRing::new();
    ring.add_key(1, &STANDARD.decode(KEY_1).expect("valid base64"))
        .expect("valid key");
    ring
}

/// Registry binding [`Sealed`] and [`Legible`].
pub fn registry() -> Arc<CrypterRegistry> {
    let mut registry = CrypterRegistry::new();
    registry
        .register::<Sealed>(MultiKeyCrypter::new(ring()))
        .expect("first registration");
    registry
        .register::<Legible>(MultiKeyCrypter::bypass(ring()))
        .expect("first registration");
    Arc::new(registry)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
