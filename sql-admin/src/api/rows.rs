//! Row fetching endpoint

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use crate::api::error_response;
use crate::database::traits::DatabaseProvider;
use crate::schema::RowQuery;

/// Handler for GET /api/table/{name}/rows
///
/// Fetches one page window of rows.
///
/// Query parameters:
/// - limit: Maximum rows to return (default: 100, clamped to 1..=500)
/// - offset: Starting row offset (default: 0)
pub async fn get_rows_handler<DB: DatabaseProvider>(
    State(database): State<Arc<DB>>,
    Path(table_name): Path<String>,
    Query(query): Query<RowQuery>,
) -> Response {
    match database.get_rows(&table_name, query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => {
            tracing::warn!(table = %table_name, %error, "failed to get rows");
            error_response(error)
        }
    }
}
