//! Table listing and metadata endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use crate::api::error_response;
use crate::database::traits::DatabaseProvider;

/// Handler for GET /api/tables
///
/// Returns the base table names of the database, ordered by name.
///
/// Response:
/// ```json
/// ["orders", "products", "users"]
/// ```
pub async fn list_tables_handler<DB: DatabaseProvider>(
    State(database): State<Arc<DB>>,
) -> Response {
    match database.list_tables().await {
        Ok(tables) => (StatusCode::OK, Json(tables)).into_response(),
        Err(error) => {
            tracing::warn!(%error, "failed to list tables");
            error_response(error)
        }
    }
}

/// Handler for GET /api/table/{name}/meta
///
/// Returns the column and primary key metadata of a table.
///
/// Response:
/// ```json
/// {
///   "table": "users",
///   "columns": [
///     {"name": "id", "dataType": "INTEGER", "nullable": false, "primaryKey": true, "autoIncrement": true}
///   ],
///   "primaryKeyColumns": ["id"]
/// }
/// ```
pub async fn table_metadata_handler<DB: DatabaseProvider>(
    State(database): State<Arc<DB>>,
    Path(table_name): Path<String>,
) -> Response {
    match database.table_metadata(&table_name).await {
        Ok(metadata) => (StatusCode::OK, Json(metadata)).into_response(),
        Err(error) => {
            tracing::warn!(table = %table_name, %error, "failed to read table metadata");
            error_response(error)
        }
    }
}
