use silent_crypto::{CryptoError, KEY_SIZE, Key, KeyRing, generate_random_key};

// ── add_key ──────────────────────────────────────────────────────

#[test]
fn add_key_makes_it_current() {
    let mut ring = KeyRing::new();
    ring.add_key(1, &[1u8; KEY_SIZE]).unwrap();
    assert_eq!(ring.current_id(), Some(1));

    ring.add_key(7, &[7u8; KEY_SIZE]).unwrap();
    assert_eq!(ring.current_id(), Some(7));
    assert_eq!(ring.current_key().unwrap().id(), 7);
}

#[test]
fn add_key_rejects_short_secret() {
    let mut ring = KeyRing::new();
    let err = ring.add_key(1, &[0u8; 31]).unwrap_err();
    assert!(matches!(err, CryptoError::InvalidKey { min: 32, actual: 31 }));
    assert!(err.is_configuration());
    assert!(ring.is_empty());
}

#[test]
fn add_key_rejects_duplicate_id() {
    let mut ring = KeyRing::new();
    ring.add_key(3, &[1u8; KEY_SIZE]).unwrap();
    let err = ring.add_key(3, &[2u8; KEY_SIZE]).unwrap_err();
    assert!(matches!(err, CryptoError::DuplicateKeyId(3)));
    assert!(err.is_configuration());

    // The original key is untouched.
    assert_eq!(ring.lookup(3).unwrap().engine_key(), &[1u8; KEY_SIZE]);
}

#[test]
fn add_key_accepts_longer_secret() {
    let mut ring = KeyRing::new();
    let secret: Vec<u8> = (0..64).collect();
    ring.add_key(2, &secret).unwrap();
    assert_eq!(&ring.lookup(2).unwrap().engine_key()[..], &secret[..KEY_SIZE]);
}

#[test]
fn id_zero_is_a_valid_key_id() {
    let mut ring = KeyRing::new();
    ring.add_key(0, &[9u8; KEY_SIZE]).unwrap();
    assert_eq!(ring.current_id(), Some(0));
}

// ── current_key / lookup ─────────────────────────────────────────

#[test]
fn empty_ring_has_no_current_key() {
    let ring = KeyRing::new();
    assert!(matches!(
        ring.current_key(),
        Err(CryptoError::NoKeyConfigured)
    ));
    assert_eq!(ring.current_id(), None);
}

#[test]
fn lookup_unknown_id() {
    let mut ring = KeyRing::new();
    ring.add_key(1, &[1u8; KEY_SIZE]).unwrap();
    let err = ring.lookup(2).unwrap_err();
    assert!(matches!(err, CryptoError::UnknownKeyId(2)));
    assert!(!err.is_configuration());
}

#[test]
fn rotation_keeps_old_keys() {
    let mut ring = KeyRing::new();
    for id in [5, 1, 3] {
        ring.add_key(id, &[id as u8; KEY_SIZE]).unwrap();
    }
    assert_eq!(ring.len(), 3);
    assert_eq!(ring.key_ids(), vec![1, 3, 5]);
    assert_eq!(ring.current_id(), Some(3));
    assert!(ring.contains(5));
    assert!(!ring.contains(4));
}

// ── Key ──────────────────────────────────────────────────────────

#[test]
fn key_new_validates_length() {
    assert!(Key::new(1, &[]).is_err());
    assert!(Key::new(1, &[0u8; KEY_SIZE]).is_ok());
}

#[test]
fn ring_debug_does_not_leak_secrets() {
    let mut ring = KeyRing::new();
    ring.add_key(1, &[0xAB; KEY_SIZE]).unwrap();
    let debug = format!("{ring:?}");
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("171"));
}

// ── generate_random_key ──────────────────────────────────────────

#[test]
fn generate_random_key_is_32_bytes() {
    assert_eq!(generate_random_key().len(), KEY_SIZE);
}

#[test]
fn generate_random_key_produces_unique_keys() {
    assert_ne!(generate_random_key(), generate_random_key());
}
