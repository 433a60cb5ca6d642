//! Database provider trait
//!
//! This trait defines the interface that all database implementations must provide.

use crate::schema::{QueryResponse, Row, RowQuery, RowsResponse, TableMetadata, UpdateRequest, WriteResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Database provider trait for schema discovery, data access and row writes
///
/// Implementations of this trait provide database-specific logic for
/// discovering schema information, fetching and writing rows, and running
/// read-only ad-hoc queries.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// List all base table names in the database, ordered by name
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError>;

    /// Get column and primary key metadata for a table
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table, matched case-insensitively
    ///
    /// # Returns
    ///
    /// Metadata carrying the canonical table name
    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, DatabaseError>;

    /// Fetch one page window of rows
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table
    /// * `query` - Page window (limit is clamped to 1..=500)
    async fn get_rows(&self, table: &str, query: RowQuery) -> Result<RowsResponse, DatabaseError>;

    /// Insert a single row
    ///
    /// Unknown columns are dropped, and auto-increment columns are skipped
    /// when their value is null or blank.
    async fn insert_row(&self, table: &str, values: Row) -> Result<WriteResponse, DatabaseError>;

    /// Update the row identified by a single primary key column
    async fn update_row(&self, table: &str, request: UpdateRequest) -> Result<WriteResponse, DatabaseError>;

    /// Execute a read-only SELECT statement
    ///
    /// Anything that is not a single SELECT is rejected before it reaches the
    /// engine. Results are capped at [`MAX_SELECT_ROWS`](crate::database::statement::MAX_SELECT_ROWS).
    async fn run_select(&self, sql: &str) -> Result<QueryResponse, DatabaseError>;
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Generic database error
    #[error("Database error: {0}")]
    Query(String),

    /// Engine error raised by an ad-hoc query
    #[error("SQL error: {0}")]
    Sql(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column is unknown or not usable for the requested operation
    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    /// Nothing left to write after filtering the submitted values
    #[error("No valid columns to {0}")]
    NoWritableColumns(&'static str),

    /// Statement rejected by the read-only guard
    #[error("Rejected query: {0}")]
    Rejected(String),

    /// Query timeout
    #[error("Query timeout exceeded")]
    Timeout,
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::Query(error.to_string())
    }
}
