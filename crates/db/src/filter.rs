//! Filter expression AST and its translation into a SQL predicate.
//!
//! A filter is a JSON object whose entries are AND-ed together:
//!
//! ```text
//! { "year":   { "_lt": 1970 },
//!   "author": "Herbert",                      // shorthand for _eq
//!   "_or":    [ { "title": { "_ilike": "%dune%" } }, { "id": { "_in": [1, 2] } } ],
//!   "_not":   { "title": { "_is_null": true } } }
//! ```
//!
//! Parsing validates every field against the entity schema and converts every
//! value with the schema's value converter, so a parsed [`Filter`] can always
//! be rendered.  Values are bound as parameters; only column names from the
//! schema appear in the SQL text.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::query::{SqlBuilder, SqlValue};
use crate::schema::{ConversionError, EntitySchema, FieldDef, FieldType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("expected an object for {0}")]
    ExpectedObject(String),

    #[error("expected an array for {0}")]
    ExpectedArray(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("unknown operator '{op}' on field '{field}'")]
    UnknownOperator { field: String, op: String },

    #[error("operator '{op}' is not supported on {field_type:?} field '{field}'")]
    UnsupportedOperator {
        field: String,
        op: &'static str,
        field_type: FieldType,
    },

    #[error("operator '_is_null' on field '{0}' expects a boolean")]
    ExpectedBool(String),

    #[error("field '{0}' needs at least one operator")]
    EmptyOperators(String),

    #[error("list for {0} must not contain null")]
    NullInList(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Like,
    NotLike,
    ILike,
    NotILike,
}

impl CompareOp {
    fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "_eq" => Self::Eq,
            "_neq" => Self::Neq,
            "_gt" => Self::Gt,
            "_gte" => Self::Gte,
            "_lt" => Self::Lt,
            "_lte" => Self::Lte,
            "_in" => Self::In,
            "_nin" => Self::NotIn,
            "_like" => Self::Like,
            "_nlike" => Self::NotLike,
            "_ilike" => Self::ILike,
            "_nilike" => Self::NotILike,
            _ => return None,
        };
        Some(op)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Eq => "_eq",
            Self::Neq => "_neq",
            Self::Gt => "_gt",
            Self::Gte => "_gte",
            Self::Lt => "_lt",
            Self::Lte => "_lte",
            Self::In => "_in",
            Self::NotIn => "_nin",
            Self::Like => "_like",
            Self::NotLike => "_nlike",
            Self::ILike => "_ilike",
            Self::NotILike => "_nilike",
        }
    }

    fn is_pattern(self) -> bool {
        matches!(self, Self::Like | Self::NotLike | Self::ILike | Self::NotILike)
    }

    fn is_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

/// A parsed, schema-checked predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        column: &'static str,
        op: CompareOp,
        value: SqlValue,
    },
    IsNull {
        column: &'static str,
        is_null: bool,
    },
}

impl Filter {
    /// Parse a `where` expression.
    ///
    /// Returns `Ok(None)` when the expression is absent, `null`, or an empty
    /// object, meaning no `WHERE` clause should be emitted.
    pub fn parse(schema: &EntitySchema, expr: Option<&Value>) -> Result<Option<Filter>, FilterError> {
        match expr {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) if map.is_empty() => Ok(None),
            Some(value) => parse_expr(schema, value, "where").map(Some),
        }
    }

    /// Append this predicate to `sql`, binding its values as parameters.
    pub fn render(&self, sql: &mut SqlBuilder) {
        match self {
            Self::And(items) => render_group(sql, items, " AND ", "TRUE"),
            Self::Or(items) => render_group(sql, items, " OR ", "FALSE"),
            Self::Not(inner) => {
                sql.push("NOT (");
                inner.render(sql);
                sql.push(")");
            }
            Self::Compare { column, op, value } => {
                sql.push(column);
                match op {
                    CompareOp::In => {
                        sql.push(" = ANY(").push_param(value.clone()).push(")");
                    }
                    CompareOp::NotIn => {
                        sql.push(" <> ALL(").push_param(value.clone()).push(")");
                    }
                    other => {
                        sql.push(" ").push(sql_operator(*other)).push(" ");
                        sql.push_param(value.clone());
                    }
                }
            }
            Self::IsNull { column, is_null } => {
                sql.push(column);
                sql.push(if *is_null { " IS NULL" } else { " IS NOT NULL" });
            }
        }
    }
}

fn render_group(sql: &mut SqlBuilder, items: &[Filter], joiner: &str, empty: &str) {
    match items {
        [] => {
            sql.push(empty);
        }
        [single] => single.render(sql),
        _ => {
            sql.push("(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    sql.push(joiner);
                }
                item.render(sql);
            }
            sql.push(")");
        }
    }
}

fn sql_operator(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Neq => "<>",
        CompareOp::Gt => ">",
        CompareOp::Gte => ">=",
        CompareOp::Lt => "<",
        CompareOp::Lte => "<=",
        CompareOp::Like => "LIKE",
        CompareOp::NotLike => "NOT LIKE",
        CompareOp::ILike => "ILIKE",
        CompareOp::NotILike => "NOT ILIKE",
        // Rendered as ANY/ALL by the caller.
        CompareOp::In | CompareOp::NotIn => unreachable!("list operators are rendered separately"),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_expr(schema: &EntitySchema, value: &Value, context: &str) -> Result<Filter, FilterError> {
    let map = value
        .as_object()
        .ok_or_else(|| FilterError::ExpectedObject(context.to_owned()))?;

    let mut clauses = Vec::with_capacity(map.len());
    for (key, entry) in map {
        match key.as_str() {
            "_and" => clauses.push(Filter::And(parse_list(schema, entry, "_and")?)),
            "_or" => clauses.push(Filter::Or(parse_list(schema, entry, "_or")?)),
            "_not" => clauses.push(Filter::Not(Box::new(parse_expr(schema, entry, "_not")?))),
            name => {
                let field = schema
                    .field(name)
                    .ok_or_else(|| FilterError::UnknownField(name.to_owned()))?;
                clauses.extend(parse_field(schema, field, entry)?);
            }
        }
    }

    Ok(match clauses.len() {
        1 => clauses.remove(0),
        _ => Filter::And(clauses),
    })
}

fn parse_list(schema: &EntitySchema, value: &Value, op: &str) -> Result<Vec<Filter>, FilterError> {
    let items = value
        .as_array()
        .ok_or_else(|| FilterError::ExpectedArray(op.to_owned()))?;
    items.iter().map(|item| parse_expr(schema, item, op)).collect()
}

fn parse_field(schema: &EntitySchema, field: &'static FieldDef, value: &Value) -> Result<Vec<Filter>, FilterError> {
    let ops: Map<String, Value> = match value {
        Value::Object(ops) if ops.is_empty() => {
            return Err(FilterError::EmptyOperators(field.name.to_owned()))
        }
        Value::Object(ops) => ops.clone(),
        Value::Array(_) => return Err(FilterError::ExpectedObject(field.name.to_owned())),
        scalar => {
            let mut ops = Map::new();
            ops.insert("_eq".to_owned(), scalar.clone());
            ops
        }
    };

    ops.iter()
        .map(|(name, operand)| parse_operator(schema, field, name, operand))
        .collect()
}

fn parse_operator(
    schema: &EntitySchema,
    field: &'static FieldDef,
    name: &str,
    operand: &Value,
) -> Result<Filter, FilterError> {
    if name == "_is_null" {
        let is_null = operand
            .as_bool()
            .ok_or_else(|| FilterError::ExpectedBool(field.name.to_owned()))?;
        return Ok(Filter::IsNull {
            column: field.name,
            is_null,
        });
    }

    let op = CompareOp::from_name(name).ok_or_else(|| FilterError::UnknownOperator {
        field: field.name.to_owned(),
        op: name.to_owned(),
    })?;

    if op.is_pattern() && field.field_type != FieldType::String {
        return Err(FilterError::UnsupportedOperator {
            field: field.name.to_owned(),
            op: op.name(),
            field_type: field.field_type,
        });
    }

    // `= NULL` never matches anything; treat it as the null test callers mean.
    if operand.is_null() && matches!(op, CompareOp::Eq | CompareOp::Neq) {
        return Ok(Filter::IsNull {
            column: field.name,
            is_null: op == CompareOp::Eq,
        });
    }

    let value = if op.is_list() {
        list_value(schema, field, operand, op)?
    } else {
        schema.to_sql_value(field, operand)?
    };

    Ok(Filter::Compare {
        column: field.name,
        op,
        value,
    })
}

fn list_value(
    schema: &EntitySchema,
    field: &FieldDef,
    operand: &Value,
    op: CompareOp,
) -> Result<SqlValue, FilterError> {
    let items = operand
        .as_array()
        .ok_or_else(|| FilterError::ExpectedArray(format!("{} on '{}'", op.name(), field.name)))?;

    let null_in_list = || FilterError::NullInList(format!("{} on '{}'", op.name(), field.name));

    if field.field_type.is_integer() {
        let mut ints = Vec::with_capacity(items.len());
        for item in items {
            match schema.to_sql_value(field, item)? {
                SqlValue::Int(v) => ints.push(v),
                _ => return Err(null_in_list()),
            }
        }
        Ok(SqlValue::IntArray(ints))
    } else {
        let mut texts = Vec::with_capacity(items.len());
        for item in items {
            match schema.to_sql_value(field, item)? {
                SqlValue::Text(v) => texts.push(v),
                _ => return Err(null_in_list()),
            }
        }
        Ok(SqlValue::TextArray(texts))
    }
}
