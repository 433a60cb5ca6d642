//! # sql-admin
//!
//! A schema-driven admin client for SQL databases, with the backend it talks
//! to packaged as an Axum layer.
//!
//! ## Features
//!
//! - Table discovery and per-table metadata for SQLite and PostgreSQL
//! - A generic grid renderer, with NULL shown distinctly from empty text
//! - Insert and edit forms synthesized from column metadata
//! - Single-row inserts and updates keyed by a single-column primary key
//! - A SELECT-only query console
//!
//! ## Security Warning
//!
//! **This is a development tool only!**
//!
//! - No authentication/authorization built-in
//! - Exposes full database schema and data, and allows row writes
//! - Should never be exposed in production or public networks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use sql_admin::SqlAdminLayer;
//! use sqlx::SqlitePool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = SqlitePool::connect("sqlite::memory:")
//!         .await
//!         .unwrap();
//!
//!     let app: Router = Router::new()
//!         .route("/", get(|| async { "Hello, World!" }))
//!         .merge(SqlAdminLayer::sqlite("/sql-admin", pool).into_router());
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod client;
pub mod database;
pub mod layer;
pub mod schema;

// Public exports
pub use layer::SqlAdminLayer;
pub use schema::{
    Column, QueryResponse, Row, RowQuery, RowsResponse, TableMetadata, UpdateRequest,
    WriteResponse,
};

// Re-export database providers
pub use database::traits::{DatabaseError, DatabaseProvider};

#[cfg(feature = "sqlite")]
pub use database::sqlite::SqliteProvider;

#[cfg(feature = "postgres")]
pub use database::postgres::PostgresProvider;

// Re-export the client entry points
pub use client::{
    AdminApi, AdminController, ClientError, ClientOptions, HttpAdminApi, LocalAdminApi,
};

// Error type
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
