//! Binary form used for SQLite columns.
//!
//! Values are bound as BLOBs holding the raw envelope. The empty value is a
//! zero-length BLOB rather than NULL; reading accepts NULL, BLOB and TEXT.

use crate::error::{ValueError, ValueResult};
use crate::registry::CrypterRegistry;
use crate::value::EncryptedValue;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};

impl<K: 'static> EncryptedValue<K> {
    /// Encrypts into a column value with an explicit registry.
    pub fn to_sql_value_with(&self, registry: &CrypterRegistry) -> ValueResult<Value> {
        Ok(Value::Blob(self.encrypt_with(registry)?))
    }

    /// Decrypts a column value with an explicit registry.
    pub fn scan_with(value: ValueRef<'_>, registry: &CrypterRegistry) -> ValueResult<Self> {
        Self::decrypt_with(column_bytes(value)?, registry)
    }
}

fn column_bytes(value: ValueRef<'_>) -> ValueResult<&[u8]> {
    match value {
        ValueRef::Null => Ok(&[]),
        ValueRef::Blob(bytes) | ValueRef::Text(bytes) => Ok(bytes),
        ValueRef::Integer(_) | ValueRef::Real(_) => {
            Err(ValueError::ScanTypeMismatch(value.data_type()))
        }
    }
}

impl<K: 'static> ToSql for EncryptedValue<K> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let envelope = self
            .encrypt()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::Owned(Value::Blob(envelope)))
    }
}

impl<K: 'static> FromSql for EncryptedValue<K> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        column_bytes(value)
            .and_then(Self::decrypt)
            .map_err(|e| match e {
                ValueError::ScanTypeMismatch(_) => FromSqlError::InvalidType,
                other => FromSqlError::Other(Box::new(other)),
            })
    }
}
