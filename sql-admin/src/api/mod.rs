//! REST API endpoints
//!
//! This module contains all API endpoint handlers for the admin backend.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::database::traits::DatabaseError;
use crate::schema::ErrorResponse;

pub mod query;
pub mod rows;
pub mod tables;
pub mod write;

// Re-export handlers for convenience
pub use query::run_select_handler;
pub use rows::get_rows_handler;
pub use tables::{list_tables_handler, table_metadata_handler};
pub use write::{insert_row_handler, update_row_handler};

/// HTTP status for a provider error
pub fn status_for(error: &DatabaseError) -> StatusCode {
    match error {
        DatabaseError::TableNotFound(_) => StatusCode::NOT_FOUND,
        DatabaseError::Timeout => StatusCode::REQUEST_TIMEOUT,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Convert a provider error into the `{ok: false, error}` body
pub fn error_response(error: DatabaseError) -> Response {
    (status_for(&error), Json(ErrorResponse::new(error.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for() {
        assert_eq!(
            status_for(&DatabaseError::TableNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_for(&DatabaseError::Timeout), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            status_for(&DatabaseError::Rejected("no".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
