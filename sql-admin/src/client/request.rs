//! CRUD request builder
//!
//! Converts raw form text into insert and update payloads.

use serde_json::Value;

use crate::client::error::ClientError;
use crate::client::form::{FormField, FormSession};
use crate::schema::{Row, TableMetadata, UpdateRequest};

/// Empty input means SQL NULL, never the empty string
///
/// Leaving an auto-increment or nullable field blank therefore sends `null`.
pub fn empty_means_null(raw: &str) -> Value {
    if raw.is_empty() {
        Value::Null
    } else {
        Value::String(raw.to_string())
    }
}

/// Column name to value for every enabled field
pub fn to_insert_payload(fields: &[FormField]) -> Row {
    fields
        .iter()
        .filter(|field| !field.disabled)
        .map(|field| (field.name.clone(), empty_means_null(&field.value)))
        .collect()
}

/// The key column of a table that supports editing
pub fn single_key_column(metadata: &TableMetadata) -> Result<&str, ClientError> {
    metadata
        .single_primary_key()
        .ok_or_else(ClientError::unsupported_key_shape)
}

/// Update body for a known key column and value
pub fn to_update_payload(pk_column: &str, pk_value: Value, fields: &[FormField]) -> UpdateRequest {
    UpdateRequest {
        pk_column: pk_column.to_string(),
        pk_value,
        values: to_insert_payload(fields),
    }
}

/// Update body for an edit session
///
/// The key value is read from the row snapshot taken when the session opened,
/// never from the key field itself.
pub fn update_for_session(session: &FormSession) -> Result<UpdateRequest, ClientError> {
    let pk_column = single_key_column(&session.metadata)?;
    let pk_value = session
        .source_row
        .as_ref()
        .and_then(|row| row.get(pk_column))
        .cloned()
        .unwrap_or(Value::Null);
    Ok(to_update_payload(pk_column, pk_value, &session.fields))
}
