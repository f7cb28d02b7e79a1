//! Row structs and result shapes returned by the repository.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// books
// ---------------------------------------------------------------------------

/// A persisted book row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    /// Assigned by the store on insert.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i64,
}

// ---------------------------------------------------------------------------
// mutation results
// ---------------------------------------------------------------------------

/// Outcome of an insert, update or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    /// Number of rows the mutation touched, as reported by the store.
    pub affected_rows: u64,
    /// The touched rows, for mutations that return them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returning: Option<Vec<Book>>,
}

impl MutationResult {
    pub fn affected(rows: u64) -> Self {
        Self {
            affected_rows: rows,
            returning: None,
        }
    }

    pub fn with_rows(rows: Vec<Book>) -> Self {
        Self {
            affected_rows: rows.len() as u64,
            returning: Some(rows),
        }
    }
}
