//! In-memory [`AdminApi`] used by the client tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::error::ClientError;
use crate::client::transport::AdminApi;
use crate::schema::{
    Column, QueryResponse, Row, RowQuery, RowsResponse, TableMetadata, UpdateRequest,
    WriteResponse,
};

pub struct FakeApi {
    tables: Mutex<Vec<String>>,
    metadata: Mutex<HashMap<String, TableMetadata>>,
    rows: Mutex<HashMap<String, Vec<Row>>>,
    query_rows: Mutex<Vec<Row>>,
    write_error: Mutex<Option<ClientError>>,
    calls: Mutex<Vec<String>>,
}

pub fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

fn column(name: &str, data_type: &str, nullable: bool, key: bool, auto: bool) -> Column {
    Column {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
        primary_key: key,
        auto_increment: auto,
    }
}

impl FakeApi {
    /// `users` (single key), `memberships` (composite key), `audit_log` (no key)
    pub fn users() -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(
            "users".to_string(),
            TableMetadata {
                table_name: "users".to_string(),
                columns: vec![
                    column("id", "int", false, true, true),
                    column("name", "text", false, false, false),
                    column("bio", "text", true, false, false),
                ],
                primary_key_columns: vec!["id".to_string()],
            },
        );
        metadata.insert(
            "memberships".to_string(),
            TableMetadata {
                table_name: "memberships".to_string(),
                columns: vec![
                    column("user_id", "int", false, true, false),
                    column("group_id", "int", false, true, false),
                    column("role", "text", true, false, false),
                ],
                primary_key_columns: vec!["user_id".to_string(), "group_id".to_string()],
            },
        );
        metadata.insert(
            "audit_log".to_string(),
            TableMetadata {
                table_name: "audit_log".to_string(),
                columns: vec![column("message", "text", true, false, false)],
                primary_key_columns: Vec::new(),
            },
        );

        let mut rows = HashMap::new();
        rows.insert(
            "users".to_string(),
            vec![object(json!({"id": 1, "name": "Ann", "bio": null}))],
        );
        rows.insert(
            "memberships".to_string(),
            vec![object(json!({"user_id": 1, "group_id": 7, "role": "owner"}))],
        );
        rows.insert(
            "audit_log".to_string(),
            vec![object(json!({"message": "created"}))],
        );

        Self {
            tables: Mutex::new(vec![
                "users".to_string(),
                "memberships".to_string(),
                "audit_log".to_string(),
            ]),
            metadata: Mutex::new(metadata),
            rows: Mutex::new(rows),
            query_rows: Mutex::new(Vec::new()),
            write_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn set_tables(&self, tables: &[&str]) {
        *self.tables.lock().unwrap() = tables.iter().map(|name| name.to_string()).collect();
    }

    pub fn set_query_rows(&self, rows: Vec<Row>) {
        *self.query_rows.lock().unwrap() = rows;
    }

    pub fn fail_writes(&self, error: ClientError) {
        *self.write_error.lock().unwrap() = Some(error);
    }

    pub fn rows_of(&self, table: &str) -> Vec<Row> {
        self.rows.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn write_error(&self) -> Result<(), ClientError> {
        match self.write_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdminApi for FakeApi {
    async fn discover_tables(&self) -> Result<Vec<String>, ClientError> {
        self.record("discover_tables".to_string());
        Ok(self.tables.lock().unwrap().clone())
    }

    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, ClientError> {
        self.record(format!("table_metadata:{}", table));
        self.metadata
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .ok_or_else(|| ClientError::Rejected(format!("Table not found: {}", table)))
    }

    async fn table_rows(&self, table: &str, window: RowQuery) -> Result<RowsResponse, ClientError> {
        self.record(format!("table_rows:{}:{}:{}", table, window.limit, window.offset));
        let rows = self
            .rows
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .ok_or_else(|| ClientError::Rejected(format!("Table not found: {}", table)))?;
        Ok(RowsResponse {
            table: table.to_string(),
            limit: window.limit,
            offset: window.offset,
            rows,
        })
    }

    async fn insert(&self, table: &str, values: &Row) -> Result<WriteResponse, ClientError> {
        self.record(format!("insert:{}:{}", table, Value::Object(values.clone())));
        self.write_error()?;

        let mut rows = self.rows.lock().unwrap();
        let table_rows = rows.entry(table.to_string()).or_default();
        let mut row = values.clone();
        if row.get("id") == Some(&Value::Null) {
            row.insert("id".to_string(), json!(table_rows.len() + 1));
        }
        table_rows.push(row);
        Ok(WriteResponse { ok: true, affected_rows: 1 })
    }

    async fn update(&self, table: &str, request: &UpdateRequest) -> Result<WriteResponse, ClientError> {
        self.record(format!(
            "update:{}:{}",
            table,
            serde_json::to_value(request).unwrap()
        ));
        self.write_error()?;

        let mut rows = self.rows.lock().unwrap();
        let mut affected_rows = 0;
        for row in rows.entry(table.to_string()).or_default() {
            if row.get(&request.pk_column) == Some(&request.pk_value) {
                for (name, value) in &request.values {
                    row.insert(name.clone(), value.clone());
                }
                affected_rows += 1;
            }
        }
        Ok(WriteResponse { ok: true, affected_rows })
    }

    async fn run_select(&self, sql: &str) -> Result<QueryResponse, ClientError> {
        self.record(format!("run_select:{}", sql));
        if !sql.trim().to_lowercase().starts_with("select") {
            return Err(ClientError::Rejected(
                "Rejected query: only SELECT statements are allowed".to_string(),
            ));
        }
        Ok(QueryResponse {
            ok: true,
            rows: self.query_rows.lock().unwrap().clone(),
            note: Some("Query OK.".to_string()),
        })
    }
}
