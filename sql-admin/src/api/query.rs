//! Read-only SQL query endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use crate::api::error_response;
use crate::database::traits::DatabaseProvider;
use crate::schema::QueryRequest;

/// Handler for POST /api/query
///
/// Executes a single SELECT statement and returns its rows, capped at 200.
/// Any other statement is rejected before it reaches the database.
///
/// Request body:
/// ```json
/// {"sql": "SELECT id, name FROM users"}
/// ```
///
/// Response (success):
/// ```json
/// {"ok": true, "rows": [{"id": 1, "name": "Ann"}], "note": "Query OK."}
/// ```
///
/// Response (rejected):
/// ```json
/// {"ok": false, "error": "Rejected query: only SELECT statements are allowed"}
/// ```
pub async fn run_select_handler<DB: DatabaseProvider>(
    State(database): State<Arc<DB>>,
    Json(request): Json<QueryRequest>,
) -> Response {
    tracing::debug!(sql = %request.sql, "running ad-hoc query");

    match database.run_select(&request.sql).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => {
            tracing::warn!(%error, "ad-hoc query failed");
            error_response(error)
        }
    }
}
