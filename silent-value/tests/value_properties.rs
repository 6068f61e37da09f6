//! Property-based tests for encrypted values.
//!
//! - JSON and SQL forms round trip for any plaintext, in every mode
//! - The empty value is always stored as empty

mod common;

use common::{Legible, Sealed, registry};
use proptest::prelude::*;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;
use silent_value::EncryptedValue;

fn plaintext_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..2000)
}

fn sql_roundtrip<K: 'static>(plaintext: &[u8]) -> (Vec<u8>, EncryptedValue<K>) {
    let value = EncryptedValue::<K>::from(plaintext);
    let blob = match value.to_sql().unwrap() {
        ToSqlOutput::Owned(Value::Blob(blob)) => blob,
        _ => panic!("expected an owned blob"),
    };
    let back = <EncryptedValue<K> as rusqlite::types::FromSql>::column_result(ValueRef::Blob(&blob))
        .unwrap();
    (blob, back)
}

mod json_properties {
    use super::*;

    proptest! {
        /// Sealed values survive the text form
        #[test]
        fn sealed_text_roundtrip(plaintext in plaintext_strategy()) {
            let registry = registry();
            let value = EncryptedValue::<Sealed>::from(plaintext.clone());
            let json = registry.scope(|| serde_json::to_string(&value)).unwrap();
            let back: EncryptedValue<Sealed> =
                registry.scope(|| serde_json::from_str(&json)).unwrap();
            prop_assert_eq!(back.as_bytes(), &plaintext[..]);
        }

        /// Bypass values survive the text form, including non-UTF-8 plaintext
        #[test]
        fn legible_text_roundtrip(plaintext in plaintext_strategy()) {
            let registry = registry();
            let value = EncryptedValue::<Legible>::from(plaintext.clone());
            let text = value.to_json_text_with(&registry).unwrap();
            if plaintext.is_empty() {
                prop_assert_eq!(text.as_str(), "");
            }
            let back = EncryptedValue::<Legible>::from_json_text_with(&text, &registry).unwrap();
            prop_assert_eq!(back.as_bytes(), &plaintext[..]);
        }

        /// UTF-8 plaintext in bypass mode is stored as "##" + plaintext
        #[test]
        fn legible_utf8_is_readable(text in "[^\\x00]{1,200}") {
            let registry = registry();
            let value = EncryptedValue::<Legible>::from(text.as_str());
            prop_assert_eq!(value.to_json_text_with(&registry).unwrap(), format!("##{text}"));
        }
    }
}

mod sql_properties {
    use super::*;

    proptest! {
        /// Sealed values survive the column form
        #[test]
        fn sealed_column_roundtrip(plaintext in plaintext_strategy()) {
            let registry = registry();
            let (blob, back) = registry.scope(|| sql_roundtrip::<Sealed>(&plaintext));
            prop_assert_eq!(blob.is_empty(), plaintext.is_empty());
            prop_assert_eq!(back.as_bytes(), &plaintext[..]);
        }

        /// Bypass values are stored as '#' + plaintext
        #[test]
        fn legible_column_roundtrip(plaintext in plaintext_strategy()) {
            prop_assume!(!plaintext.is_empty());

            let registry = registry();
            let (blob, back) = registry.scope(|| sql_roundtrip::<Legible>(&plaintext));
            prop_assert_eq!(blob[0], b'#');
            prop_assert_eq!(&blob[1..], &plaintext[..]);
            prop_assert_eq!(back.as_bytes(), &plaintext[..]);
        }
    }
}
