//! Single-row insert and update endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use crate::api::error_response;
use crate::database::traits::DatabaseProvider;
use crate::schema::{Row, UpdateRequest};

/// Handler for POST /api/table/{name}/insert
///
/// Request body: an object mapping column names to values, `null` meaning SQL
/// NULL. Auto-increment columns sent as `null` are left to the engine.
///
/// ```json
/// {"id": null, "name": "Ann", "bio": null}
/// ```
///
/// Response:
/// ```json
/// {"ok": true, "affectedRows": 1}
/// ```
pub async fn insert_row_handler<DB: DatabaseProvider>(
    State(database): State<Arc<DB>>,
    Path(table_name): Path<String>,
    Json(values): Json<Row>,
) -> Response {
    match database.insert_row(&table_name, values).await {
        Ok(response) => {
            tracing::info!(table = %table_name, affected = response.affected_rows, "row inserted");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(error) => {
            tracing::warn!(table = %table_name, %error, "insert failed");
            error_response(error)
        }
    }
}

/// Handler for POST /api/table/{name}/update
///
/// Request body:
/// ```json
/// {"pkColumn": "id", "pkValue": 1, "values": {"name": "Anne", "bio": null}}
/// ```
///
/// Primary key columns inside `values` are ignored.
pub async fn update_row_handler<DB: DatabaseProvider>(
    State(database): State<Arc<DB>>,
    Path(table_name): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Response {
    match database.update_row(&table_name, request).await {
        Ok(response) => {
            tracing::info!(table = %table_name, affected = response.affected_rows, "row updated");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(error) => {
            tracing::warn!(table = %table_name, %error, "update failed");
            error_response(error)
        }
    }
}
