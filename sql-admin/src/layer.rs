//! SqlAdminLayer - Axum integration layer for the admin backend
//!
//! This module mounts the backend API an admin client talks to.

use crate::database::traits::DatabaseProvider;
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[cfg(feature = "sqlite")]
use crate::database::sqlite::SqliteProvider;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresProvider;

use crate::api::{
    get_rows_handler, insert_row_handler, list_tables_handler, run_select_handler,
    table_metadata_handler, update_row_handler,
};

/// Main layer for integrating the admin API into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use sql_admin::SqlAdminLayer;
/// use sqlx::SqlitePool;
///
/// # async fn example() {
/// let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
/// let admin = SqlAdminLayer::sqlite("/sql-admin", pool);
/// let app = Router::new().merge(admin.into_router());
/// # }
/// ```
pub struct SqlAdminLayer<DB: DatabaseProvider> {
    base_path: String,
    database: Arc<DB>,
}

impl<DB: DatabaseProvider> SqlAdminLayer<DB> {
    /// Create a new admin API at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the API will be mounted (e.g., "/sql-admin")
    /// * `database` - The database provider implementation
    pub fn new(base_path: impl Into<String>, database: DB) -> Self {
        Self {
            base_path: base_path.into(),
            database: Arc::new(database),
        }
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router serves, under `{base_path}/api`:
    /// - `GET /tables`
    /// - `GET /table/{name}/meta`
    /// - `GET /table/{name}/rows?limit&offset`
    /// - `POST /table/{name}/insert`
    /// - `POST /table/{name}/update`
    /// - `POST /query`
    ///
    /// with permissive CORS for development.
    pub fn into_router(self) -> Router {
        let api_router = Router::new()
            .route("/tables", get(list_tables_handler::<DB>))
            .route("/table/{name}/meta", get(table_metadata_handler::<DB>))
            .route("/table/{name}/rows", get(get_rows_handler::<DB>))
            .route("/table/{name}/insert", post(insert_row_handler::<DB>))
            .route("/table/{name}/update", post(update_row_handler::<DB>))
            .route("/query", post(run_select_handler::<DB>))
            .with_state(self.database);

        Router::new()
            .nest(&format!("{}/api", self.base_path.trim_end_matches('/')), api_router)
            .layer(CorsLayer::permissive())
    }
}

#[cfg(feature = "sqlite")]
impl SqlAdminLayer<SqliteProvider> {
    /// Create a new admin API for SQLite
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the API will be mounted
    /// * `pool` - The SQLite connection pool
    pub fn sqlite(base_path: impl Into<String>, pool: sqlx::SqlitePool) -> Self {
        Self::new(base_path, SqliteProvider::new(pool))
    }
}

#[cfg(feature = "postgres")]
impl SqlAdminLayer<PostgresProvider> {
    /// Create a new admin API for PostgreSQL
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the API will be mounted
    /// * `pool` - The PostgreSQL connection pool
    pub fn postgres(base_path: impl Into<String>, pool: sqlx::PgPool) -> Self {
        Self::new(base_path, PostgresProvider::new(pool))
    }
}
