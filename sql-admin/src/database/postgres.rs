//! PostgreSQL database provider implementation

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
use sqlx::postgres::PgRow;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::Uuid;
use sqlx::{Column, PgPool, Row as _, TypeInfo};
use std::collections::HashMap;

/// PostgreSQL database provider
///
/// Only tables in the `public` schema are visible.
pub struct PostgresProvider {
    pool: PgPool,
}

/// Metadata plus the engine type name of every column, used to cast bound text
struct TypedMetadata {
    metadata: TableMetadata,
    column_types: HashMap<String, String>,
}

impl TypedMetadata {
    /// `$n` cast to the column's type, so text parameters reach typed columns
    fn placeholder(&self, column: &str, index: usize) -> String {
        match self.column_types.get(column) {
            Some(type_name) => format!("CAST(${} AS {})", index, quote_identifier(type_name)),
            None => format!("${}", index),
        }
    }
}

impl PostgresProvider {
    /// Create a new PostgreSQL provider
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert a PostgreSQL row to a JSON object keyed by column name
    fn row_to_json(row: &PgRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let index = column.ordinal();

            let value: Value = match column.type_info().name() {
                "BOOL" => {
                    let val: Option<bool> = row.try_get(index)?;
                    val.map(Value::Bool).unwrap_or(Value::Null)
                }
                "INT2" => {
                    let val: Option<i16> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "INT4" => {
                    let val: Option<i32> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "INT8" => {
                    let val: Option<i64> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "FLOAT4" => {
                    let val: Option<f32> = row.try_get(index)?;
                    val.and_then(|v| serde_json::Number::from_f64(v as f64))
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
                "FLOAT8" => {
                    let val: Option<f64> = row.try_get(index)?;
                    val.and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
                "BYTEA" => {
                    let val: Option<Vec<u8>> = row.try_get(index)?;
                    val.map(|bytes| Value::String(format!("[BLOB: {} bytes]", bytes.len())))
                        .unwrap_or(Value::Null)
                }
                "TIMESTAMP" => {
                    let val: Option<NaiveDateTime> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null)
                }
                "TIMESTAMPTZ" => {
                    let val: Option<DateTime<Utc>> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_rfc3339())).unwrap_or(Value::Null)
                }
                "DATE" => {
                    let val: Option<NaiveDate> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null)
                }
                "TIME" => {
                    let val: Option<NaiveTime> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null)
                }
                "UUID" => {
                    let val: Option<Uuid> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null)
                }
                "JSON" | "JSONB" => {
                    let val: Option<Value> = row.try_get(index)?;
                    val.unwrap_or(Value::Null)
                }
                _ => {
                    // Text-like types decode as String; anything else has no JSON form here
                    let val: Option<String> = row.try_get(index).ok().flatten();
                    val.map(Value::String).unwrap_or(Value::Null)
                }
            };

            map.insert(column.name().to_string(), value);
        }

        Ok(map)
    }

    async fn typed_metadata(&self, table: &str) -> Result<TypedMetadata, DatabaseError> {
        let tables = self.list_tables().await?;
        let table = resolve_table(&tables, table)?;

        let column_query = r#"
            SELECT
                column_name,
                data_type,
                udt_name,
                is_nullable,
                (is_identity = 'YES' OR COALESCE(column_default, '') LIKE 'nextval(%') AS auto_increment
            FROM information_schema.columns
            WHERE table_schema = 'public'
              AND table_name = $1
            ORDER BY ordinal_position
        "#;

        let column_rows = sqlx::query(column_query)
            .bind(&table)
            .fetch_all(&self.pool)
            .await?;

        let pk_query = r#"
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
              AND tc.table_schema = kcu.table_schema
            WHERE tc.table_schema = 'public'
              AND tc.table_name = $1
              AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY kcu.ordinal_position
        "#;

        let primary_key_columns: Vec<String> = sqlx::query(pk_query)
            .bind(&table)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("column_name"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut columns = Vec::with_capacity(column_rows.len());
        let mut column_types = HashMap::new();

        for row in &column_rows {
            let name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let udt_name: String = row.try_get("udt_name")?;
            let is_nullable: String = row.try_get("is_nullable")?;
            let auto_increment: Option<bool> = row.try_get("auto_increment")?;

            column_types.insert(name.clone(), udt_name);
            columns.push(ColumnMeta {
                primary_key: primary_key_columns.contains(&name),
                name,
                data_type,
                nullable: is_nullable == "YES",
                auto_increment: auto_increment.unwrap_or(false),
            });
        }

        Ok(TypedMetadata {
            metadata: TableMetadata {
                table_name: table,
                columns,
                primary_key_columns,
            },
            column_types,
        })
    }
}

#[async_trait]
impl DatabaseProvider for PostgresProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let query = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(DatabaseError::from))
            .collect()
    }

    async fn table_metadata(&self, table: &str) -> Result<TableMetadata, DatabaseError> {
        Ok(self.typed_metadata(table).await?.metadata)
    }

    async fn get_rows(&self, table: &str, query: RowQuery) -> Result<RowsResponse, DatabaseError> {
        let tables = self.list_tables().await?;
        let table = resolve_table(&tables, table)?;
        let window = clamp_window(query);

        let sql = format!(
            "SELECT * FROM {} LIMIT {} OFFSET {}",
            quote_identifier(&table),
            window.limit,
            window.offset
        );
        let rows = bounded(sqlx::query(&sql).fetch_all(&self.pool)).await?;

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
        let typed = self.typed_metadata(table).await?;
        let assignments = insert_assignments(&typed.metadata, values)?;

        let column_list = assignments
            .iter()
            .map(|(name, _)| quote_identifier(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = assignments
            .iter()
            .enumerate()
            .map(|(position, (name, _))| typed.placeholder(name, position + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&typed.metadata.table_name),
            column_list,
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in assignments {
            query = query.bind(value.into_text());
        }
        let result = bounded(query.execute(&self.pool)).await?;

        Ok(WriteResponse {
            ok: true,
            affected_rows: result.rows_affected(),
        })
    }

    async fn update_row(&self, table: &str, request: UpdateRequest) -> Result<WriteResponse, DatabaseError> {
        let typed = self.typed_metadata(table).await?;
        let (assignments, key_column, key_value) = update_assignments(&typed.metadata, request)?;

        let set_clause = assignments
            .iter()
            .enumerate()
            .map(|(position, (name, _))| {
                format!("{} = {}", quote_identifier(name), typed.placeholder(name, position + 1))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            quote_identifier(&typed.metadata.table_name),
            set_clause,
            quote_identifier(&key_column),
            typed.placeholder(&key_column, assignments.len() + 1)
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in assignments {
            query = query.bind(value.into_text());
        }
        query = query.bind(key_value.into_text());
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
