//! Generic table renderer
//!
//! Turns a column list and a set of rows into a display grid without knowing
//! anything about the table behind them.

use std::fmt;

use serde_json::Value;

use crate::schema::{Column, Row};

/// Marker shown for null or absent values
pub const NULL_MARKER: &str = "NULL";

/// Header of the trailing per-row action column
pub const ACTIONS_HEADER: &str = "Actions";

/// Text of the per-row edit control
pub const EDIT_LABEL: &str = "[edit]";

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// One rendered cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Null or absent value, shown as [`NULL_MARKER`] and de-emphasized
    Null,
    /// Any other value in its default string form
    Value(String),
}

impl Cell {
    /// Render a row value; absent and null are the same thing here
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Cell::Null,
            Some(Value::String(text)) => Cell::Value(text.clone()),
            Some(other) => Cell::Value(other.to_string()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Cell::Null => NULL_MARKER,
            Cell::Value(text) => text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// Affordance attached to a rendered row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// Open an edit session for the row at this index of the source rows
    Edit { row: usize },
}

/// One rendered data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub cells: Vec<Cell>,
    pub action: Option<RowAction>,
}

/// A fully built display grid
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<GridRow>,
}

/// Build a grid from scratch
///
/// One header per column in order, plus a trailing [`ACTIONS_HEADER`] when
/// `include_actions` is set, in which case every row carries an edit action.
/// Whether the edit is allowed is decided when it is invoked.
pub fn render(columns: &[Column], rows: &[Row], include_actions: bool) -> Grid {
    let mut header: Vec<String> = columns.iter().map(|column| column.name.clone()).collect();
    if include_actions {
        header.push(ACTIONS_HEADER.to_string());
    }

    let rows = rows
        .iter()
        .enumerate()
        .map(|(index, row)| GridRow {
            cells: columns
                .iter()
                .map(|column| Cell::from_value(row.get(&column.name)))
                .collect(),
            action: include_actions.then_some(RowAction::Edit { row: index }),
        })
        .collect();

    Grid { header, rows }
}

impl Grid {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    /// Plain-text table; with `dim_nulls`, null markers get an ANSI dim style
    pub fn to_text(&self, dim_nulls: bool) -> String {
        let mut widths: Vec<usize> = self.header.iter().map(|name| name.chars().count()).collect();
        for row in &self.rows {
            for (position, text) in row_texts(row).enumerate() {
                let width = text.chars().count();
                match widths.get_mut(position) {
                    Some(current) => *current = (*current).max(width),
                    None => widths.push(width),
                }
            }
        }

        let mut output = String::new();
        let header: Vec<String> = self
            .header
            .iter()
            .enumerate()
            .map(|(position, name)| pad(name, widths[position]))
            .collect();
        output.push_str(header.join(" | ").trim_end());
        output.push('\n');

        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        output.push_str(&rule.join("-+-"));
        output.push('\n');

        for row in &self.rows {
            let mut line: Vec<String> = row
                .cells
                .iter()
                .enumerate()
                .map(|(position, cell)| {
                    let padded = pad(cell.text(), widths[position]);
                    if dim_nulls && cell.is_null() {
                        format!("{}{}{}", DIM, padded, RESET)
                    } else {
                        padded
                    }
                })
                .collect();
            if row.action.is_some() {
                line.push(EDIT_LABEL.to_string());
            }
            output.push_str(line.join(" | ").trim_end());
            output.push('\n');
        }

        output
    }
}

fn row_texts(row: &GridRow) -> impl Iterator<Item = &str> {
    row.cells
        .iter()
        .map(Cell::text)
        .chain(row.action.map(|_| EDIT_LABEL))
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<Column> {
        names.iter().map(|name| Column::untyped(*name)).collect()
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_render_users_with_actions() {
        let grid = render(
            &columns(&["id", "name", "bio"]),
            &[row(json!({"id": 1, "name": "Ann", "bio": null}))],
            true,
        );

        assert_eq!(grid.header, vec!["id", "name", "bio", "Actions"]);
        assert_eq!(grid.rows.len(), 1);
        let texts: Vec<&str> = grid.rows[0].cells.iter().map(Cell::text).collect();
        assert_eq!(texts, vec!["1", "Ann", "NULL"]);
        assert!(grid.rows[0].cells[2].is_null());
        assert_eq!(grid.rows[0].action, Some(RowAction::Edit { row: 0 }));
    }

    #[test]
    fn test_absent_and_null_render_the_same() {
        let grid = render(
            &columns(&["a", "b"]),
            &[row(json!({"a": null})), row(json!({}))],
            false,
        );
        assert_eq!(grid.rows[0].cells, grid.rows[1].cells);
        assert_eq!(grid.rows[0].cells, vec![Cell::Null, Cell::Null]);
    }

    #[test]
    fn test_values_use_default_string_form() {
        let grid = render(
            &columns(&["n", "f", "b", "s"]),
            &[row(json!({"n": 42, "f": 1.5, "b": false, "s": "2024-01-01"}))],
            false,
        );
        let texts: Vec<&str> = grid.rows[0].cells.iter().map(Cell::text).collect();
        assert_eq!(texts, vec!["42", "1.5", "false", "2024-01-01"]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let cols = columns(&["id", "name"]);
        let rows = vec![row(json!({"id": 1, "name": null})), row(json!({"id": 2}))];
        assert_eq!(render(&cols, &rows, true), render(&cols, &rows, true));
    }

    #[test]
    fn test_no_actions_without_flag() {
        let grid = render(&columns(&["id"]), &[row(json!({"id": 1}))], false);
        assert_eq!(grid.header, vec!["id"]);
        assert_eq!(grid.rows[0].action, None);
    }

    #[test]
    fn test_empty_columns_render_empty_grid() {
        let grid = render(&[], &[], false);
        assert!(grid.header.is_empty());
        assert!(grid.rows.is_empty());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_text_output() {
        let grid = render(
            &columns(&["id", "name", "bio"]),
            &[row(json!({"id": 1, "name": "Ann", "bio": null}))],
            true,
        );
        let text = grid.to_text(false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id | name | bio  | Actions");
        assert_eq!(lines[2], "1  | Ann  | NULL | [edit]");
        assert!(grid.to_text(true).contains("\x1b[2mNULL"));
    }
}
