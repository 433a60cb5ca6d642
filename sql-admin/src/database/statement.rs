//! Statement building shared by all providers
//!
//! Identifier quoting, the read-only query guard, page window clamping and
//! the filtering of submitted write values against table metadata.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::database::traits::DatabaseError;
use crate::schema::{Row, RowQuery, TableMetadata, UpdateRequest};

/// Maximum allowed page limit to prevent excessive memory usage
pub const MAX_ROW_LIMIT: u64 = 500;

/// Rows returned at most by an ad-hoc SELECT
pub const MAX_SELECT_ROWS: u64 = 200;

/// Upper bound for any single statement
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Note attached to successful ad-hoc queries
pub const SELECT_NOTE: &str = "Query OK.";

/// Keywords refused anywhere in an ad-hoc query, matched as whole words
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "truncate", "grant", "revoke",
];

/// Quote an identifier (table or column name) to prevent SQL injection
///
/// Both SQLite and PostgreSQL use double quotes for identifiers. Embedded
/// double quotes are escaped by doubling them.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Largest offset a driver can bind as a signed 64-bit integer
pub const MAX_ROW_OFFSET: u64 = i64::MAX as u64;

/// Clamp a requested page window to `1..=MAX_ROW_LIMIT` rows starting at or
/// below [`MAX_ROW_OFFSET`]
pub fn clamp_window(query: RowQuery) -> RowQuery {
    RowQuery {
        limit: query.limit.clamp(1, MAX_ROW_LIMIT),
        offset: query.offset.min(MAX_ROW_OFFSET),
    }
}

/// Run a driver future under [`QUERY_TIMEOUT`]
pub async fn bounded<T, F>(future: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, future).await {
        Ok(result) => result.map_err(DatabaseError::from),
        Err(_) => Err(DatabaseError::Timeout),
    }
}

/// Resolve a requested table name against the catalogue, ignoring case
///
/// Returns the canonical spelling as stored by the engine.
pub fn resolve_table(tables: &[String], requested: &str) -> Result<String, DatabaseError> {
    if requested.trim().is_empty() {
        return Err(DatabaseError::TableNotFound("(empty name)".to_string()));
    }
    tables
        .iter()
        .find(|name| name.eq_ignore_ascii_case(requested))
        .cloned()
        .ok_or_else(|| DatabaseError::TableNotFound(requested.to_string()))
}

/// Check that `sql` is a single read-only SELECT statement
///
/// Returns the trimmed statement text.
pub fn check_select(sql: &str) -> Result<&str, DatabaseError> {
    let statement = sql.trim();
    if statement.is_empty() {
        return Err(DatabaseError::Rejected("the query is empty".to_string()));
    }

    let lowered = statement.to_lowercase();
    if !lowered.starts_with("select") {
        return Err(DatabaseError::Rejected(
            "only SELECT statements are allowed".to_string(),
        ));
    }
    if lowered.contains(';') {
        return Err(DatabaseError::Rejected(
            "multiple statements are not allowed, remove the ';'".to_string(),
        ));
    }

    let forbidden = lowered
        .split(|character: char| !(character.is_alphanumeric() || character == '_'))
        .find(|word| FORBIDDEN_KEYWORDS.contains(word));
    if let Some(keyword) = forbidden {
        return Err(DatabaseError::Rejected(format!(
            "keyword '{}' is not allowed in a read-only query",
            keyword
        )));
    }

    Ok(statement)
}

/// Wrap a checked SELECT so it returns at most [`MAX_SELECT_ROWS`] rows
pub fn wrap_select(statement: &str) -> String {
    format!("SELECT * FROM ({}) AS t LIMIT {}", statement, MAX_SELECT_ROWS)
}

/// A JSON scalar converted into something a driver can bind
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl BindValue {
    /// Whether the value counts as "left blank" (null or whitespace-only text)
    pub fn is_blank(&self) -> bool {
        match self {
            BindValue::Null => true,
            BindValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Textual form, used where the engine casts parameters itself
    pub fn into_text(self) -> Option<String> {
        match self {
            BindValue::Null => None,
            BindValue::Bool(value) => Some(value.to_string()),
            BindValue::Integer(value) => Some(value.to_string()),
            BindValue::Real(value) => Some(value.to_string()),
            BindValue::Text(value) => Some(value),
        }
    }
}

impl From<Value> for BindValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => BindValue::Null,
            Value::Bool(value) => BindValue::Bool(value),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => BindValue::Integer(integer),
                None => number
                    .as_f64()
                    .map(BindValue::Real)
                    .unwrap_or_else(|| BindValue::Text(number.to_string())),
            },
            Value::String(text) => BindValue::Text(text),
            other => BindValue::Text(other.to_string()),
        }
    }
}

/// Filtered column assignments for an INSERT
///
/// Keeps known columns only, in the order submitted, and skips auto-increment
/// columns left blank so the engine assigns them.
pub fn insert_assignments(
    metadata: &TableMetadata,
    values: Row,
) -> Result<Vec<(String, BindValue)>, DatabaseError> {
    let assignments: Vec<(String, BindValue)> = values
        .into_iter()
        .filter_map(|(name, value)| {
            let column = metadata.column(&name)?;
            let value = BindValue::from(value);
            if column.auto_increment && value.is_blank() {
                return None;
            }
            Some((name, value))
        })
        .collect();

    if assignments.is_empty() {
        return Err(DatabaseError::NoWritableColumns("insert"));
    }
    Ok(assignments)
}

/// Filtered column assignments and key for an UPDATE
///
/// The key column must belong to the table's primary key; key columns and
/// unknown columns are dropped from the assignments.
pub fn update_assignments(
    metadata: &TableMetadata,
    request: UpdateRequest,
) -> Result<(Vec<(String, BindValue)>, String, BindValue), DatabaseError> {
    let UpdateRequest {
        pk_column,
        pk_value,
        values,
    } = request;

    if pk_column.trim().is_empty() {
        return Err(DatabaseError::InvalidColumn("pkColumn is required".to_string()));
    }
    if !metadata.is_primary_key(&pk_column) {
        return Err(DatabaseError::InvalidColumn(format!(
            "{} is not a primary key column of {}",
            pk_column, metadata.table_name
        )));
    }

    let assignments: Vec<(String, BindValue)> = values
        .into_iter()
        .filter(|(name, _)| metadata.column(name).is_some() && !metadata.is_primary_key(name))
        .map(|(name, value)| (name, BindValue::from(value)))
        .collect();

    if assignments.is_empty() {
        return Err(DatabaseError::NoWritableColumns("update"));
    }
    Ok((assignments, pk_column, BindValue::from(pk_value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use serde_json::json;

    fn users() -> TableMetadata {
        TableMetadata {
            table_name: "users".to_string(),
            columns: vec![
                Column {
                    name: "id".to_string(),
                    data_type: "INTEGER".to_string(),
                    nullable: false,
                    primary_key: true,
                    auto_increment: true,
                },
                Column {
                    name: "name".to_string(),
                    data_type: "TEXT".to_string(),
                    nullable: false,
                    primary_key: false,
                    auto_increment: false,
                },
                Column::untyped("bio"),
            ],
            primary_key_columns: vec!["id".to_string()],
        }
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("table\"name"), "\"table\"\"name\"");
    }

    #[test]
    fn test_clamp_window() {
        let window = clamp_window(RowQuery { limit: 0, offset: 3 });
        assert_eq!(window.limit, 1);
        assert_eq!(window.offset, 3);
        assert_eq!(clamp_window(RowQuery { limit: 10_000, offset: 0 }).limit, MAX_ROW_LIMIT);
    }

    #[test]
    fn test_clamp_window_offset_fits_i64() {
        let window = clamp_window(RowQuery { limit: 10, offset: u64::MAX });
        assert_eq!(window.offset, MAX_ROW_OFFSET);
        assert_eq!(window.offset as i64, i64::MAX);
    }

    #[test]
    fn test_resolve_table_is_case_insensitive() {
        let tables = vec!["Users".to_string(), "orders".to_string()];
        assert_eq!(resolve_table(&tables, "users").unwrap(), "Users");
        assert!(matches!(
            resolve_table(&tables, "missing"),
            Err(DatabaseError::TableNotFound(_))
        ));
        assert!(resolve_table(&tables, "  ").is_err());
    }

    #[test]
    fn test_check_select_accepts_plain_select() {
        assert_eq!(check_select("  SELECT name FROM users  ").unwrap(), "SELECT name FROM users");
        assert!(check_select("select updated_at from users").is_ok());
    }

    #[test]
    fn test_check_select_rejects_writes() {
        assert!(check_select("").is_err());
        assert!(check_select("DELETE FROM users").is_err());
        assert!(check_select("SELECT 1; DROP TABLE users").is_err());
        assert!(check_select("SELECT * FROM users WHERE id IN (SELECT id FROM x) OR 1 = (DELETE)").is_err());
    }

    #[test]
    fn test_wrap_select() {
        assert_eq!(
            wrap_select("SELECT 1"),
            "SELECT * FROM (SELECT 1) AS t LIMIT 200"
        );
    }

    #[test]
    fn test_insert_assignments_skip_blank_auto_increment() {
        let assignments = insert_assignments(
            &users(),
            row(json!({"id": null, "name": "Ann", "bio": null, "unknown": 1})),
        )
        .unwrap();

        let names: Vec<&str> = assignments.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["name", "bio"]);
        assert_eq!(assignments[1].1, BindValue::Null);
    }

    #[test]
    fn test_insert_assignments_keep_explicit_auto_increment() {
        let assignments = insert_assignments(&users(), row(json!({"id": "42"}))).unwrap();
        assert_eq!(assignments, vec![("id".to_string(), BindValue::Text("42".to_string()))]);
    }

    #[test]
    fn test_insert_assignments_require_a_column() {
        let result = insert_assignments(&users(), row(json!({"id": ""})));
        assert!(matches!(result, Err(DatabaseError::NoWritableColumns("insert"))));
    }

    #[test]
    fn test_update_assignments_drop_key_columns() {
        let request = UpdateRequest {
            pk_column: "id".to_string(),
            pk_value: json!(1),
            values: row(json!({"id": 99, "name": "Bea", "bio": null})),
        };
        let (assignments, key, key_value) = update_assignments(&users(), request).unwrap();

        assert_eq!(key, "id");
        assert_eq!(key_value, BindValue::Integer(1));
        let names: Vec<&str> = assignments.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["name", "bio"]);
    }

    #[test]
    fn test_update_assignments_require_primary_key_column() {
        let request = UpdateRequest {
            pk_column: "name".to_string(),
            pk_value: json!("Ann"),
            values: row(json!({"bio": "x"})),
        };
        assert!(matches!(
            update_assignments(&users(), request),
            Err(DatabaseError::InvalidColumn(_))
        ));
    }

    #[test]
    fn test_bind_value_from_json() {
        assert_eq!(BindValue::from(json!(3)), BindValue::Integer(3));
        assert_eq!(BindValue::from(json!(1.5)), BindValue::Real(1.5));
        assert_eq!(BindValue::from(json!(true)), BindValue::Bool(true));
        assert_eq!(BindValue::from(json!(null)), BindValue::Null);
        assert!(BindValue::Text("  ".to_string()).is_blank());
        assert_eq!(BindValue::Integer(7).into_text(), Some("7".to_string()));
    }
}
