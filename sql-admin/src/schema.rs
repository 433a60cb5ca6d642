//! Schema types for dynamic database introspection
//!
//! These types describe tables discovered at runtime and the request/response
//! bodies exchanged between the admin client and the backend.

use serde::{Deserialize, Serialize};

/// A single row: column name to scalar value (or null)
///
/// The map keeps insertion order, so rows built from a result set list their
/// keys in SELECT order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Default page window used when fetching rows
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Information about a single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name, unique within its table
    pub name: String,

    /// Engine-reported data type label (e.g., "INTEGER", "varchar")
    pub data_type: String,

    /// Whether the column allows NULL values
    pub nullable: bool,

    /// Whether this column is part of the primary key
    pub primary_key: bool,

    /// Whether the engine assigns this column's value on insert
    pub auto_increment: bool,
}

impl Column {
    /// An untyped, nullable, non-key column as used for ad-hoc result sets
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: "any".to_string(),
            nullable: true,
            primary_key: false,
            auto_increment: false,
        }
    }
}

/// Column and primary-key description of one table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    /// Canonical table name
    #[serde(rename = "table")]
    pub table_name: String,

    /// Columns in display order
    pub columns: Vec<Column>,

    /// Primary key column names in key order (zero, one or many)
    #[serde(default)]
    pub primary_key_columns: Vec<String>,
}

impl TableMetadata {
    /// The primary key column name, if the key has exactly one column
    pub fn single_primary_key(&self) -> Option<&str> {
        match self.primary_key_columns.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Whether `column` is a member of the primary key
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key_columns.iter().any(|name| name == column)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Query parameters for fetching rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowQuery {
    /// Maximum number of rows to return
    #[serde(default = "default_limit")]
    pub limit: u64,

    /// Starting offset
    #[serde(default)]
    pub offset: u64,
}

impl Default for RowQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

/// Response containing table rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsResponse {
    /// Canonical table name
    pub table: String,

    /// Limit used for this query
    pub limit: u64,

    /// Offset used for this query
    pub offset: u64,

    /// The rows returned
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Body of an update request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// The single primary key column identifying the row
    pub pk_column: String,

    /// Primary key value of the row being updated
    pub pk_value: serde_json::Value,

    /// New column values; `null` means SQL NULL
    #[serde(default)]
    pub values: Row,
}

/// Request to execute a read-only SQL query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// SQL text, passed through unmodified
    pub sql: String,
}

/// Result from executing a read-only query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub ok: bool,

    /// Rows returned
    #[serde(default)]
    pub rows: Vec<Row>,

    /// Optional human-readable note from the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Result of an insert or update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    pub ok: bool,

    /// Number of rows affected by the statement
    pub affected_rows: u64,
}

/// Error body returned by every endpoint on failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}
