//! Backend transports for the admin client
//!
//! [`AdminApi`] is the only way the client core reaches the backend. Two
//! implementations ship: [`HttpAdminApi`] talks to a mounted
//! [`SqlAdminLayer`](crate::SqlAdminLayer) over HTTP, and [`LocalAdminApi`]
//! calls a [`DatabaseProvider`] in-process.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::client::error::ClientError;
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{
    ErrorResponse, QueryRequest, QueryResponse, Row, RowQuery, RowsResponse, TableMetadata,
    UpdateRequest, WriteResponse, DEFAULT_PAGE_LIMIT,
};

/// Backend operations consumed by the client core
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Ordered table names
    async fn discover_tables(&self) -> Result<Vec<String>, ClientError>;

    /// Column and primary key description of one table
    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, ClientError>;

    /// One page window of rows
    async fn table_rows(&self, table: &str, window: RowQuery) -> Result<RowsResponse, ClientError>;

    /// Insert one row; `null` values mean SQL NULL
    async fn insert(&self, table: &str, values: &Row) -> Result<WriteResponse, ClientError>;

    /// Update the row identified by `request.pk_value`
    async fn update(&self, table: &str, request: &UpdateRequest) -> Result<WriteResponse, ClientError>;

    /// Run operator-typed SQL; the backend alone decides what is allowed
    async fn run_select(&self, sql: &str) -> Result<QueryResponse, ClientError>;
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Base URL the backend layer is mounted at, e.g. `http://127.0.0.1:3000/sql-admin`
    pub base_url: String,

    /// Rows fetched per table view
    pub page_limit: u64,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// HTTP transport built on reqwest
#[derive(Debug, Clone)]
pub struct HttpAdminApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAdminApi {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let base_url = Url::parse(&options.base_url).map_err(|error| {
            ClientError::Transport(format!("invalid base URL {}: {}", options.base_url, error))
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    /// `{base}/api/{segments...}` with every segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Transport(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Decode a response, turning `{ok: false, error}` bodies into rejections
    ///
    /// The `ok` flag decides, whatever the status code.
    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if let Ok(body) = serde_json::from_slice::<ErrorResponse>(&bytes) {
            if !body.ok {
                return Err(ClientError::Rejected(body.error));
            }
        }

        if !status.is_success() {
            return Err(http_status_error(status));
        }

        serde_json::from_slice(&bytes)
            .map_err(|error| ClientError::Transport(format!("invalid response body: {}", error)))
    }
}

fn http_status_error(status: StatusCode) -> ClientError {
    ClientError::Transport(format!("HTTP {}", status.as_u16()))
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn discover_tables(&self) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint(&["tables"])?;
        Self::read(self.client.get(url).send().await?).await
    }

    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, ClientError> {
        let url = self.endpoint(&["table", table, "meta"])?;
        Self::read(self.client.get(url).send().await?).await
    }

    async fn table_rows(&self, table: &str, window: RowQuery) -> Result<RowsResponse, ClientError> {
        let mut url = self.endpoint(&["table", table, "rows"])?;
        url.query_pairs_mut()
            .append_pair("limit", &window.limit.to_string())
            .append_pair("offset", &window.offset.to_string());
        Self::read(self.client.get(url).send().await?).await
    }

    async fn insert(&self, table: &str, values: &Row) -> Result<WriteResponse, ClientError> {
        let url = self.endpoint(&["table", table, "insert"])?;
        Self::read(self.client.post(url).json(values).send().await?).await
    }

    async fn update(&self, table: &str, request: &UpdateRequest) -> Result<WriteResponse, ClientError> {
        let url = self.endpoint(&["table", table, "update"])?;
        Self::read(self.client.post(url).json(request).send().await?).await
    }

    async fn run_select(&self, sql: &str) -> Result<QueryResponse, ClientError> {
        let url = self.endpoint(&["query"])?;
        let body = QueryRequest {
            sql: sql.to_string(),
        };
        Self::read(self.client.post(url).json(&body).send().await?).await
    }
}

/// In-process transport over a database provider
///
/// Provider errors surface as [`ClientError::Rejected`], exactly as the HTTP
/// layer would report them.
pub struct LocalAdminApi<DB: DatabaseProvider> {
    database: Arc<DB>,
}

impl<DB: DatabaseProvider> LocalAdminApi<DB> {
    pub fn new(database: DB) -> Self {
        Self {
            database: Arc::new(database),
        }
    }
}

fn rejected(error: DatabaseError) -> ClientError {
    ClientError::Rejected(error.to_string())
}

#[async_trait]
impl<DB: DatabaseProvider> AdminApi for LocalAdminApi<DB> {
    async fn discover_tables(&self) -> Result<Vec<String>, ClientError> {
        self.database.list_tables().await.map_err(rejected)
    }

    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, ClientError> {
        self.database.table_metadata(table).await.map_err(rejected)
    }

    async fn table_rows(&self, table: &str, window: RowQuery) -> Result<RowsResponse, ClientError> {
        self.database.get_rows(table, window).await.map_err(rejected)
    }

    async fn insert(&self, table: &str, values: &Row) -> Result<WriteResponse, ClientError> {
        self.database
            .insert_row(table, values.clone())
            .await
            .map_err(rejected)
    }

    async fn update(&self, table: &str, request: &UpdateRequest) -> Result<WriteResponse, ClientError> {
        self.database
            .update_row(table, request.clone())
            .await
            .map_err(rejected)
    }

    async fn run_select(&self, sql: &str) -> Result<QueryResponse, ClientError> {
        self.database.run_select(sql).await.map_err(rejected)
    }
}
