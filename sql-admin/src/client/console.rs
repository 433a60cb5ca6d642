//! Query console adapter
//!
//! Sends operator SQL to the backend untouched and feeds the result through
//! the generic renderer using metadata derived from the rows themselves.

use crate::client::error::ClientError;
use crate::client::render::{render, Grid};
use crate::client::transport::AdminApi;
use crate::schema::{Column, Row, TableMetadata};

/// Name given to pseudo-metadata of ad-hoc results
pub const CONSOLE_TABLE_NAME: &str = "query";

/// Rendered outcome of one console query
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleResult {
    pub metadata: TableMetadata,
    pub rows: Vec<Row>,
    pub grid: Grid,
    pub note: Option<String>,
}

/// Metadata derived from the keys of the first row
///
/// Every column is nullable, non-key, not auto-assigned and typed `any`. The
/// result is inert: console results are never editable, so none of this is
/// used to build forms.
pub fn pseudo_metadata(rows: &[Row]) -> TableMetadata {
    let columns = rows
        .first()
        .map(|row| row.keys().map(Column::untyped).collect())
        .unwrap_or_default();

    TableMetadata {
        table_name: CONSOLE_TABLE_NAME.to_string(),
        columns,
        primary_key_columns: Vec::new(),
    }
}

/// Run `sql` through the backend and render the rows without actions
pub async fn run_query<A: AdminApi + ?Sized>(api: &A, sql: &str) -> Result<ConsoleResult, ClientError> {
    let response = api.run_select(sql).await?;
    let metadata = pseudo_metadata(&response.rows);
    let grid = render(&metadata.columns, &response.rows, false);

    Ok(ConsoleResult {
        metadata,
        rows: response.rows,
        grid,
        note: response.note,
    })
}
