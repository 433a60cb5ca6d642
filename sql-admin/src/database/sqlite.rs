//! SQLite database provider implementation

use crate::database::statement::{
    bounded, check_select, clamp_window, insert_assignments, quote_identifier, resolve_table,
    update_assignments, wrap_select, BindValue, SELECT_NOTE,
};
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{
    Column as ColumnMeta, QueryResponse, Row, RowQuery, RowsResponse, TableMetadata,
    UpdateRequest, WriteResponse,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteColumn, SqliteRow};
use sqlx::{Column, Row as _, SqlitePool, TypeInfo, ValueRef};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite database provider
pub struct SqliteProvider {
    pool: SqlitePool,
}

impl SqliteProvider {
    /// Create a new SQLite provider
    ///
    /// # Arguments
    ///
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert a SQLite row to a JSON object keyed by column name
    fn row_to_json(row: &SqliteRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let value = Self::extract_column_value(row, column)?;
            map.insert(column.name().to_string(), value);
        }

        Ok(map)
    }

    /// Extract a column value from a SQLite row and convert to JSON
    fn extract_column_value(row: &SqliteRow, column: &SqliteColumn) -> Result<Value, DatabaseError> {
        let index = column.ordinal();

        if row
            .try_get_raw(index)
            .map_err(|e| DatabaseError::Query(e.to_string()))?
            .is_null()
        {
            return Ok(Value::Null);
        }

        // SQLite has dynamic typing but reports affinities: INTEGER, REAL, TEXT, BLOB, NULL
        match column.type_info().name() {
            "INTEGER" | "BIGINT" => {
                if let Ok(value) = row.try_get::<i64, _>(index) {
                    return Ok(Value::Number(value.into()));
                }
            }
            "REAL" | "FLOAT" | "DOUBLE" => {
                if let Ok(value) = row.try_get::<f64, _>(index) {
                    if let Some(number) = serde_json::Number::from_f64(value) {
                        return Ok(Value::Number(number));
                    }
                }
            }
            "BOOLEAN" | "BOOL" => {
                if let Ok(value) = row.try_get::<bool, _>(index) {
                    return Ok(Value::Bool(value));
                }
            }
            "BLOB" => {
                if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
                    return Ok(Value::String(format!("[BLOB: {} bytes]", value.len())));
                }
            }
            _ => {
                if let Ok(value) = row.try_get::<String, _>(index) {
                    return Ok(Value::String(value));
                }
            }
        }

        // Fallback: try common types in order
        if let Ok(value) = row.try_get::<i64, _>(index) {
            return Ok(Value::Number(value.into()));
        }
        if let Ok(value) = row.try_get::<f64, _>(index) {
            if let Some(number) = serde_json::Number::from_f64(value) {
                return Ok(Value::Number(number));
            }
        }
        if let Ok(value) = row.try_get::<String, _>(index) {
            return Ok(Value::String(value));
        }
        if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
            return Ok(Value::String(format!("[BLOB: {} bytes]", value.len())));
        }

        Ok(Value::Null)
    }

    fn bind(query: SqliteQuery<'_>, value: BindValue) -> SqliteQuery<'_> {
        match value {
            BindValue::Null => query.bind(None::<String>),
            BindValue::Bool(value) => query.bind(value),
            BindValue::Integer(value) => query.bind(value),
            BindValue::Real(value) => query.bind(value),
            BindValue::Text(value) => query.bind(value),
        }
    }

    async fn canonical_table(&self, table: &str) -> Result<String, DatabaseError> {
        let tables = self.list_tables().await?;
        resolve_table(&tables, table)
    }
}

#[async_trait]
impl DatabaseProvider for SqliteProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let query = "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(DatabaseError::from))
            .collect()
    }

    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, DatabaseError> {
        let table = self.canonical_table(table).await?;

        let table_info_query = format!("PRAGMA table_info({})", quote_identifier(&table));
        let column_rows = sqlx::query(&table_info_query).fetch_all(&self.pool).await?;

        let mut columns = Vec::new();
        let mut primary_key_columns = Vec::new();

        for row in column_rows {
            // PRAGMA table_info returns: cid, name, type, notnull, dflt_value, pk
            let name: String = row.try_get("name")?;
            let data_type: String = row.try_get("type")?;
            let not_null: i32 = row.try_get("notnull")?;
            let primary_key: i32 = row.try_get("pk")?;

            if primary_key > 0 {
                primary_key_columns.push((primary_key, name.clone()));
            }

            columns.push(ColumnMeta {
                name,
                data_type,
                nullable: not_null == 0,
                primary_key: primary_key > 0,
                auto_increment: false,
            });
        }

        primary_key_columns.sort_by_key(|(order, _)| *order);
        let primary_key_columns: Vec<String> =
            primary_key_columns.into_iter().map(|(_, name)| name).collect();

        // A lone INTEGER primary key aliases the rowid and is assigned on insert
        if let [key] = primary_key_columns.as_slice() {
            if let Some(column) = columns.iter_mut().find(|column| &column.name == key) {
                column.auto_increment = column.data_type.eq_ignore_ascii_case("INTEGER");
            }
        }

        Ok(TableMetadata {
            table_name: table,
            columns,
            primary_key_columns,
        })
    }

    async fn get_rows(&self, table: &str, query: RowQuery) -> Result<RowsResponse, DatabaseError> {
        let table = self.canonical_table(table).await?;
        let window = clamp_window(query);

        let select_query = format!("SELECT * FROM {} LIMIT ? OFFSET ?", quote_identifier(&table));
        let rows = bounded(
            sqlx::query(&select_query)
                .bind(window.limit as i64)
                .bind(window.offset as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        let rows = rows
            .iter()
            .map(Self::row_to_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RowsResponse {
            table,
            limit: window.limit,
            offset: window.offset,
            rows,
        })
    }

    async fn insert_row(&self, table: &str, values: Row) -> Result<WriteResponse, DatabaseError> {
        let metadata = self.table_metadata(table).await?;
        let assignments = insert_assignments(&metadata, values)?;

        let column_list = assignments
            .iter()
            .map(|(name, _)| quote_identifier(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; assignments.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&metadata.table_name),
            column_list,
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in assignments {
            query = Self::bind(query, value);
        }
        let result = bounded(query.execute(&self.pool)).await?;

        Ok(WriteResponse {
            ok: true,
            affected_rows: result.rows_affected(),
        })
    }

    async fn update_row(&self, table: &str, request: UpdateRequest) -> Result<WriteResponse, DatabaseError> {
        let metadata = self.table_metadata(table).await?;
        let (assignments, key_column, key_value) = update_assignments(&metadata, request)?;

        let set_clause = assignments
            .iter()
            .map(|(name, _)| format!("{} = ?", quote_identifier(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_identifier(&metadata.table_name),
            set_clause,
            quote_identifier(&key_column)
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in assignments {
            query = Self::bind(query, value);
        }
        query = Self::bind(query, key_value);
        let result = bounded(query.execute(&self.pool)).await?;

        Ok(WriteResponse {
            ok: true,
            affected_rows: result.rows_affected(),
        })
    }

    async fn run_select(&self, sql: &str) -> Result<QueryResponse, DatabaseError> {
        let statement = check_select(sql)?;
        let limited = wrap_select(statement);

        let rows = bounded(sqlx::query(&limited).fetch_all(&self.pool))
            .await
            .map_err(|error| match error {
                DatabaseError::Query(message) => DatabaseError::Sql(message),
                other => other,
            })?;

        let rows = rows
            .iter()
            .map(Self::row_to_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResponse {
            ok: true,
            rows,
            note: Some(SELECT_NOTE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory databases are per connection, so the pool is pinned to one
    async fn provider() -> SqliteProvider {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, bio TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("CREATE TABLE memberships (user_id INTEGER, group_id INTEGER, role TEXT, PRIMARY KEY (user_id, group_id))")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO users (name, bio) VALUES ('Ann', NULL), ('Bob', 'builder')")
            .execute(&pool)
            .await
            .unwrap();

        SqliteProvider::new(pool)
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[tokio::test]
    async fn test_list_tables_is_ordered() {
        let provider = provider().await;
        assert_eq!(provider.list_tables().await.unwrap(), vec!["memberships", "users"]);
    }

    #[tokio::test]
    async fn test_table_metadata() {
        let provider = provider().await;
        let metadata = provider.table_metadata("USERS").await.unwrap();

        assert_eq!(metadata.table_name, "users");
        assert_eq!(metadata.primary_key_columns, vec!["id"]);
        let names: Vec<&str> = metadata.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "bio"]);
        assert!(metadata.columns[0].auto_increment);
        assert!(!metadata.columns[1].nullable);
        assert!(metadata.columns[2].nullable);
    }

    #[tokio::test]
    async fn test_composite_key_metadata() {
        let provider = provider().await;
        let metadata = provider.table_metadata("memberships").await.unwrap();

        assert_eq!(metadata.primary_key_columns, vec!["user_id", "group_id"]);
        assert!(metadata.columns.iter().all(|column| !column.auto_increment));
        assert_eq!(metadata.single_primary_key(), None);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let provider = provider().await;
        assert!(matches!(
            provider.table_metadata("nope").await,
            Err(DatabaseError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_rows_window() {
        let provider = provider().await;
        let response = provider
            .get_rows("users", RowQuery { limit: 1, offset: 1 })
            .await
            .unwrap();

        assert_eq!(response.table, "users");
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0]["name"], "Bob");
    }

    #[tokio::test]
    async fn test_get_rows_huge_offset_is_clamped() {
        let provider = provider().await;
        let response = provider
            .get_rows("users", RowQuery { limit: 10, offset: u64::MAX })
            .await
            .unwrap();

        assert_eq!(response.offset, crate::database::statement::MAX_ROW_OFFSET);
        assert!(response.rows.is_empty());
    }

    #[tokio::test]
    async fn test_null_values_are_json_null() {
        let provider = provider().await;
        let response = provider.get_rows("users", RowQuery::default()).await.unwrap();
        assert_eq!(response.rows[0]["bio"], Value::Null);
        assert_eq!(response.rows[0]["id"], json!(1));
    }

    #[tokio::test]
    async fn test_insert_assigns_auto_increment() {
        let provider = provider().await;
        let result = provider
            .insert_row("users", row(json!({"id": null, "name": "Cid", "bio": null})))
            .await
            .unwrap();
        assert_eq!(result.affected_rows, 1);

        let response = provider.get_rows("users", RowQuery::default()).await.unwrap();
        assert_eq!(response.rows.len(), 3);
        assert_eq!(response.rows[2]["id"], json!(3));
        assert_eq!(response.rows[2]["bio"], Value::Null);
    }

    #[tokio::test]
    async fn test_insert_null_into_required_column_fails() {
        let provider = provider().await;
        let result = provider
            .insert_row("users", row(json!({"id": null, "name": null})))
            .await;
        let message = result.unwrap_err().to_string();
        assert!(message.contains("NOT NULL"), "{}", message);
    }

    #[tokio::test]
    async fn test_update_by_primary_key() {
        let provider = provider().await;
        let request = UpdateRequest {
            pk_column: "id".to_string(),
            pk_value: json!(1),
            values: row(json!({"id": 50, "name": "Anne", "bio": "hello"})),
        };
        let result = provider.update_row("users", request).await.unwrap();
        assert_eq!(result.affected_rows, 1);

        let response = provider.run_select("SELECT id, name, bio FROM users WHERE id = 1").await.unwrap();
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0]["name"], "Anne");
        assert_eq!(response.rows[0]["bio"], "hello");
    }

    #[tokio::test]
    async fn test_run_select_keeps_column_order() {
        let provider = provider().await;
        let response = provider
            .run_select("SELECT name, id FROM users ORDER BY id")
            .await
            .unwrap();

        assert!(response.ok);
        assert_eq!(response.note.as_deref(), Some(SELECT_NOTE));
        let keys: Vec<&String> = response.rows[0].keys().collect();
        assert_eq!(keys, vec!["name", "id"]);
    }

    #[tokio::test]
    async fn test_run_select_rejects_writes_and_reports_sql_errors() {
        let provider = provider().await;
        assert!(matches!(
            provider.run_select("DELETE FROM users").await,
            Err(DatabaseError::Rejected(_))
        ));
        assert!(matches!(
            provider.run_select("SELECT missing_column FROM users").await,
            Err(DatabaseError::Sql(_))
        ));
    }
}
