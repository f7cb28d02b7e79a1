//! One transaction per operation.
//!
//! Every repository operation calls [`begin`] once and then exactly one of
//! [`commit`] or [`rollback`].  No savepoints, no nesting, no retries.

use sqlx::{Postgres, Transaction};
use tracing::{debug, error, warn};

use crate::{DbError, DbPool};

pub type PgTransaction = Transaction<'static, Postgres>;

pub async fn begin(pool: &DbPool) -> Result<PgTransaction, DbError> {
    let tx = pool.begin().await.map_err(|source| {
        error!(error = %source, "failed to start transaction");
        DbError::Transaction {
            stage: "begin",
            source,
        }
    })?;
    debug!("transaction started");
    Ok(tx)
}

/// Commit `tx`.  A failed commit is an error for the whole operation.
pub async fn commit(tx: PgTransaction) -> Result<(), DbError> {
    tx.commit().await.map_err(|source| {
        error!(error = %source, "failed to commit transaction");
        DbError::Transaction {
            stage: "commit",
            source,
        }
    })?;
    debug!("transaction committed");
    Ok(())
}

/// Roll back `tx` after a failed step.
///
/// The caller surfaces the step's error; a rollback failure is only logged
/// (the server discards the transaction when the connection resets anyway).
pub async fn rollback(tx: PgTransaction) {
    match tx.rollback().await {
        Ok(()) => debug!("transaction rolled back"),
        Err(e) => warn!(error = %e, "failed to roll back transaction"),
    }
}
