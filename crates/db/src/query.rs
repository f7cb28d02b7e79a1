//! Parameterized SQL assembly.
//!
//! Statements are built as plain strings with `$n` placeholders while the
//! values travel alongside in a `Vec<SqlValue>`.  Nothing supplied by a caller
//! is ever spliced into the SQL text; only schema column names are.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{FromRow, Postgres};

use crate::schema::FieldType;

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    IntArray(Vec<i64>),
    TextArray(Vec<String>),
    /// Typed `NULL`, so Postgres can infer the parameter type.
    Null(FieldType),
}

/// Incrementally builds a statement and its parameter list.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlBuilder {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append the next placeholder and record its value.
    pub fn push_param(&mut self, value: SqlValue) -> &mut Self {
        self.params.push(value);
        self.sql.push('$');
        self.sql.push_str(&self.params.len().to_string());
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn build(self) -> BuiltQuery {
        BuiltQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// A finished statement, ready to be bound and executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for value in $params {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.as_str()),
                SqlValue::IntArray(v) => query.bind(v.as_slice()),
                SqlValue::TextArray(v) => query.bind(v.as_slice()),
                SqlValue::Null(FieldType::String) => query.bind(Option::<String>::None),
                SqlValue::Null(_) => query.bind(Option::<i64>::None),
            };
        }
        query
    }};
}

impl BuiltQuery {
    /// For statements whose result is only a row count.
    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        bind_params!(sqlx::query(&self.sql), &self.params)
    }

    pub fn query_as<T>(&self) -> QueryAs<'_, Postgres, T, PgArguments>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        bind_params!(sqlx::query_as::<_, T>(&self.sql), &self.params)
    }

    pub fn query_scalar<T>(&self) -> QueryScalar<'_, Postgres, T, PgArguments>
    where
        (T,): for<'r> FromRow<'r, PgRow>,
    {
        bind_params!(sqlx::query_scalar::<_, T>(&self.sql), &self.params)
    }
}
