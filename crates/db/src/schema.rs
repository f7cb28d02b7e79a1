//! Entity schema description.
//!
//! The schema is the single source of truth for which columns exist, which
//! of them callers may write, and how incoming JSON values are coerced into
//! SQL parameters.  Filter translation and SQL assembly only ever emit column
//! names that come from here.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::query::SqlValue;

// ---------------------------------------------------------------------------
// Field and entity descriptions
// ---------------------------------------------------------------------------

/// Scalar type of a field as exposed through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Integer identifier.  Accepts numbers or numeric strings.
    Id,
    String,
    Int,
}

impl FieldType {
    fn describe(self) -> &'static str {
        match self {
            Self::Id => "an integer id",
            Self::String => "a string",
            Self::Int => "an integer",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Id | Self::Int)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub nullable: bool,
    /// Server-generated; rejected in insert objects and update sets.
    pub read_only: bool,
}

impl FieldDef {
    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            nullable: false,
            read_only: false,
        }
    }

    const fn generated(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// A field the caller has to supply on insert.
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.read_only
    }
}

/// Shape of an entity: its API name, backing table, and fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntitySchema {
    pub name: &'static str,
    pub table: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldDef],
}

/// The `book` entity, backed by the `books` table.
pub static BOOK_SCHEMA: EntitySchema = EntitySchema {
    name: "book",
    table: "books",
    description: "book entity",
    fields: &[
        FieldDef::new("id", FieldType::Id).generated(),
        FieldDef::new("title", FieldType::String),
        FieldDef::new("author", FieldType::String),
        FieldDef::new("year", FieldType::Int),
    ],
};

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("field '{0}' is not nullable")]
    NullNotAllowed(&'static str),
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name of the identifier column.
    pub fn primary_key(&self) -> &'static str {
        self.fields
            .iter()
            .find(|f| f.field_type == FieldType::Id)
            .map_or("id", |f| f.name)
    }

    /// Comma-separated column list in declaration order, e.g. for `SELECT` and
    /// `RETURNING` clauses.
    pub fn column_list(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Coerce a JSON value into a bindable SQL value for `field`.
    pub fn to_sql_value(&self, field: &FieldDef, value: &Value) -> Result<SqlValue, ConversionError> {
        if value.is_null() {
            return if field.nullable {
                Ok(SqlValue::Null(field.field_type))
            } else {
                Err(ConversionError::NullNotAllowed(field.name))
            };
        }

        let mismatch = || ConversionError::TypeMismatch {
            field: field.name,
            expected: field.field_type.describe(),
            found: describe_json(value),
        };

        match field.field_type {
            FieldType::String => value
                .as_str()
                .map(|s| SqlValue::Text(s.to_owned()))
                .ok_or_else(mismatch),
            FieldType::Int => value.as_i64().map(SqlValue::Int).ok_or_else(mismatch),
            FieldType::Id => match value {
                Value::String(s) => s.trim().parse::<i64>().map(SqlValue::Int).map_err(|_| mismatch()),
                other => other.as_i64().map(SqlValue::Int).ok_or_else(mismatch),
            },
        }
    }
}

fn describe_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "an array".to_owned(),
        Value::Object(_) => "an object".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str) -> &'static FieldDef {
        BOOK_SCHEMA.field(name).expect("known field")
    }

    #[test]
    fn book_columns_in_declaration_order() {
        assert_eq!(BOOK_SCHEMA.column_list(), "id, title, author, year");
    }

    #[test]
    fn only_id_is_read_only() {
        let read_only: Vec<_> = BOOK_SCHEMA
            .fields
            .iter()
            .filter(|f| f.read_only)
            .map(|f| f.name)
            .collect();
        assert_eq!(read_only, vec!["id"]);
        assert!(field("title").is_required());
        assert!(!field("id").is_required());
    }

    #[test]
    fn converts_strings_and_ints() {
        assert_eq!(
            BOOK_SCHEMA.to_sql_value(field("title"), &json!("Dune")),
            Ok(SqlValue::Text("Dune".into()))
        );
        assert_eq!(
            BOOK_SCHEMA.to_sql_value(field("year"), &json!(1965)),
            Ok(SqlValue::Int(1965))
        );
    }

    #[test]
    fn id_accepts_numeric_strings() {
        assert_eq!(
            BOOK_SCHEMA.to_sql_value(field("id"), &json!("42")),
            Ok(SqlValue::Int(42))
        );
        assert!(BOOK_SCHEMA.to_sql_value(field("id"), &json!("forty-two")).is_err());
    }

    #[test]
    fn rejects_mismatched_types() {
        let err = BOOK_SCHEMA
            .to_sql_value(field("year"), &json!("1965"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { field: "year", .. }));

        assert!(BOOK_SCHEMA.to_sql_value(field("year"), &json!(19.65)).is_err());
        assert!(BOOK_SCHEMA.to_sql_value(field("title"), &json!(7)).is_err());
    }

    #[test]
    fn rejects_null_for_required_fields() {
        assert_eq!(
            BOOK_SCHEMA.to_sql_value(field("author"), &Value::Null),
            Err(ConversionError::NullNotAllowed("author"))
        );
    }

    #[test]
    fn schema_serializes_for_the_api() {
        let value = serde_json::to_value(&BOOK_SCHEMA).unwrap();
        assert_eq!(value["name"], "book");
        assert_eq!(value["fields"][0]["type"], "id");
        assert_eq!(value["fields"][3]["name"], "year");
    }
}
