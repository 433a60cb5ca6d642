//! Dynamic form synthesizer
//!
//! Builds an editable field set for any row shape from table metadata alone.
//! Field behavior comes from [`POLICY`], a first-match rule table, so new
//! engine type labels never need code changes.

use serde_json::Value;

use crate::client::error::ClientError;
use crate::schema::{Column, Row, TableMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Insert,
    Edit,
}

/// Hint shown in an empty field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The engine assigns the value; leave blank
    Automatic,
    /// Blank stores NULL
    Nullable,
    /// A value is expected
    Required,
}

impl Placeholder {
    pub fn text(self) -> &'static str {
        match self {
            Placeholder::Automatic => "AUTO (leave blank)",
            Placeholder::Nullable => "NULL",
            Placeholder::Required => "required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldBehavior {
    prefill: bool,
    disabled: bool,
    placeholder: Option<Placeholder>,
}

struct PolicyRule {
    mode: FormMode,
    applies: fn(&Column, bool) -> bool,
    behavior: FieldBehavior,
}

fn in_primary_key(_: &Column, is_key: bool) -> bool {
    is_key
}

fn auto_assigned(column: &Column, _: bool) -> bool {
    column.auto_increment
}

fn nullable(column: &Column, _: bool) -> bool {
    column.nullable
}

fn any_column(_: &Column, _: bool) -> bool {
    true
}

/// Field behavior per mode, first matching rule wins
const POLICY: &[PolicyRule] = &[
    PolicyRule {
        mode: FormMode::Edit,
        applies: in_primary_key,
        behavior: FieldBehavior { prefill: true, disabled: true, placeholder: None },
    },
    PolicyRule {
        mode: FormMode::Edit,
        applies: nullable,
        behavior: FieldBehavior { prefill: true, disabled: false, placeholder: Some(Placeholder::Nullable) },
    },
    PolicyRule {
        mode: FormMode::Edit,
        applies: any_column,
        behavior: FieldBehavior { prefill: true, disabled: false, placeholder: Some(Placeholder::Required) },
    },
    PolicyRule {
        mode: FormMode::Insert,
        applies: auto_assigned,
        behavior: FieldBehavior { prefill: false, disabled: false, placeholder: Some(Placeholder::Automatic) },
    },
    PolicyRule {
        mode: FormMode::Insert,
        applies: nullable,
        behavior: FieldBehavior { prefill: false, disabled: false, placeholder: Some(Placeholder::Nullable) },
    },
    PolicyRule {
        mode: FormMode::Insert,
        applies: any_column,
        behavior: FieldBehavior { prefill: false, disabled: false, placeholder: Some(Placeholder::Required) },
    },
];

fn behavior_for(mode: FormMode, column: &Column, is_key: bool) -> FieldBehavior {
    POLICY
        .iter()
        .find(|rule| rule.mode == mode && (rule.applies)(column, is_key))
        .map(|rule| rule.behavior)
        .unwrap_or(FieldBehavior { prefill: false, disabled: false, placeholder: None })
}

/// One editable field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Column name
    pub name: String,

    /// `"{name} ({data type})"`
    pub label: String,

    /// Raw text as typed; empty means NULL on save
    pub value: String,

    pub placeholder: Option<Placeholder>,

    /// Disabled fields are never sent
    pub disabled: bool,
}

/// Text shown for an existing value when prefilling a field
fn prefill_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// One field per column, in metadata column order
pub fn build_form(mode: FormMode, metadata: &TableMetadata, source_row: Option<&Row>) -> Vec<FormField> {
    metadata
        .columns
        .iter()
        .map(|column| {
            let behavior = behavior_for(mode, column, metadata.is_primary_key(&column.name));
            let value = if behavior.prefill {
                prefill_text(source_row.and_then(|row| row.get(&column.name)))
            } else {
                String::new()
            };

            FormField {
                name: column.name.clone(),
                label: format!("{} ({})", column.name, column.data_type),
                value,
                placeholder: behavior.placeholder,
                disabled: behavior.disabled,
            }
        })
        .collect()
}

/// The single open insert/edit session
#[derive(Debug, Clone, PartialEq)]
pub struct FormSession {
    pub mode: FormMode,
    pub metadata: TableMetadata,

    /// Row snapshot taken when an edit session opened
    pub source_row: Option<Row>,

    pub fields: Vec<FormField>,
}

impl FormSession {
    pub fn insert(metadata: TableMetadata) -> Self {
        let fields = build_form(FormMode::Insert, &metadata, None);
        Self {
            mode: FormMode::Insert,
            metadata,
            source_row: None,
            fields,
        }
    }

    /// Open an edit session; refused unless the key has exactly one column
    pub fn edit(metadata: TableMetadata, row: Row) -> Result<Self, ClientError> {
        if metadata.single_primary_key().is_none() {
            return Err(ClientError::unsupported_key_shape());
        }
        let fields = build_form(FormMode::Edit, &metadata, Some(&row));
        Ok(Self {
            mode: FormMode::Edit,
            metadata,
            source_row: Some(row),
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Set the raw text of an editable field
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), ClientError> {
        let field = self
            .fields
            .iter_mut()
            .find(|field| field.name == name)
            .ok_or_else(|| ClientError::Constraint(format!("no field named {}", name)))?;
        if field.disabled {
            return Err(ClientError::Constraint(format!("{} is read-only", name)));
        }
        field.value = value.into();
        Ok(())
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Insert => "New row",
            FormMode::Edit => "Edit row",
        }
    }

    pub fn subtitle(&self) -> String {
        match self.mode {
            FormMode::Insert => format!("Table: {}", self.metadata.table_name),
            FormMode::Edit => format!(
                "Table: {} | PK: {}",
                self.metadata.table_name,
                self.metadata.primary_key_columns.join(", ")
            ),
        }
    }
}
