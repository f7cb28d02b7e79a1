//! Generic operation arguments, as they arrive from the API layer.
//!
//! Field-to-value mappings are kept as raw JSON objects; they are checked and
//! converted against the entity schema when the statement is assembled.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::DbError;

/// One JSON object of column/value pairs.
pub type FieldValues = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListArgs {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Without it rows come back in the store's natural order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl ListArgs {
    pub fn filtered(filter: Value) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DbError> {
        for (name, value) in [("limit", self.limit), ("offset", self.offset)] {
            if matches!(value, Some(v) if v < 0) {
                return Err(DbError::validation(format!("'{name}' must not be negative")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertArgs {
    /// One mapping per new row.
    #[serde(default)]
    pub objects: Vec<FieldValues>,
}

impl InsertArgs {
    pub fn new(objects: Vec<FieldValues>) -> Self {
        Self { objects }
    }

    pub fn validate(&self) -> Result<(), DbError> {
        if self.objects.is_empty() {
            return Err(DbError::validation(
                "you should pass any entity to store in 'objects'",
            ));
        }
        if let Some(pos) = self.objects.iter().position(|o| o.is_empty()) {
            return Err(DbError::validation(format!(
                "passed empty object to insert at position {pos}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateArgs {
    #[serde(default)]
    pub set: FieldValues,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl UpdateArgs {
    pub fn validate(&self) -> Result<(), DbError> {
        if self.set.is_empty() {
            return Err(DbError::validation("you should pass any field to store in 'set'"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteArgs {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}
