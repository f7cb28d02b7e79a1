//! Typed error type for the db crate.

use thiserror::Error;

use crate::filter::FilterError;

#[derive(Debug, Error)]
pub enum DbError {
    /// The operation arguments were rejected before touching the store.
    #[error("validation error: {0}")]
    Validation(String),

    /// The `where` expression could not be translated into SQL.
    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("sql execution failed: {0}")]
    Execution(#[source] sqlx::Error),

    /// A row did not have the shape of the entity.
    #[error("failed to decode row: {0}")]
    Decode(#[source] sqlx::Error),

    #[error("failed to {stage} transaction: {source}")]
    Transaction {
        stage: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` for errors caused by the caller's arguments rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Filter(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. } => Self::Decode(err),
            other => Self::Execution(other),
        }
    }
}
