//! Postgres-backed [`BookStore`].

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::models::{Book, MutationResult};
use crate::repository::params::{DeleteArgs, InsertArgs, ListArgs, UpdateArgs};
use crate::repository::{sql, transaction, BookStore};
use crate::schema::{EntitySchema, BOOK_SCHEMA};
use crate::{DbError, DbPool};

/// Runs the generic operations against the `books` table.
///
/// Cheap to clone; all clones share the same pool.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: DbPool,
}

impl BookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        &BOOK_SCHEMA
    }
}

#[async_trait]
impl BookStore for BookRepository {
    #[instrument(skip_all)]
    async fn list(&self, args: ListArgs) -> Result<Vec<Book>, DbError> {
        let query = sql::select(&BOOK_SCHEMA, &args)?;
        debug!(sql = %query.sql, "list");

        let mut tx = transaction::begin(&self.pool).await?;
        let books = match query.query_as::<Book>().fetch_all(&mut *tx).await {
            Ok(books) => books,
            Err(e) => {
                transaction::rollback(tx).await;
                return Err(e.into());
            }
        };
        transaction::commit(tx).await?;

        debug!(rows = books.len(), "list finished");
        Ok(books)
    }

    #[instrument(skip_all, fields(objects = args.objects.len()))]
    async fn insert(&self, args: InsertArgs) -> Result<MutationResult, DbError> {
        args.validate()?;
        let statements = args
            .objects
            .iter()
            .map(|object| sql::insert(&BOOK_SCHEMA, object))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = transaction::begin(&self.pool).await?;

        let mut ids = Vec::with_capacity(statements.len());
        for statement in &statements {
            match statement.query_scalar::<i64>().fetch_one(&mut *tx).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    transaction::rollback(tx).await;
                    return Err(e.into());
                }
            }
        }

        if ids.is_empty() {
            transaction::rollback(tx).await;
            return Ok(MutationResult::with_rows(Vec::new()));
        }

        let reselect = sql::select_by_ids(&BOOK_SCHEMA, &ids);
        let books = match reselect.query_as::<Book>().fetch_all(&mut *tx).await {
            Ok(books) => books,
            Err(e) => {
                transaction::rollback(tx).await;
                return Err(e.into());
            }
        };
        transaction::commit(tx).await?;

        info!(inserted = books.len(), "books inserted");
        Ok(MutationResult::with_rows(books))
    }

    #[instrument(skip_all, fields(fields = args.set.len()))]
    async fn update(&self, args: UpdateArgs) -> Result<MutationResult, DbError> {
        let query = sql::update(&BOOK_SCHEMA, &args)?;
        debug!(sql = %query.sql, "update");

        let mut tx = transaction::begin(&self.pool).await?;
        let books = match query.query_as::<Book>().fetch_all(&mut *tx).await {
            Ok(books) => books,
            Err(e) => {
                transaction::rollback(tx).await;
                return Err(e.into());
            }
        };
        transaction::commit(tx).await?;

        info!(updated = books.len(), "books updated");
        Ok(MutationResult::with_rows(books))
    }

    #[instrument(skip_all)]
    async fn delete(&self, args: DeleteArgs) -> Result<MutationResult, DbError> {
        let query = sql::delete(&BOOK_SCHEMA, &args)?;
        debug!(sql = %query.sql, "delete");

        let mut tx = transaction::begin(&self.pool).await?;
        let result = match query.query().execute(&mut *tx).await {
            Ok(result) => result,
            Err(e) => {
                transaction::rollback(tx).await;
                return Err(e.into());
            }
        };
        transaction::commit(tx).await?;

        info!(deleted = result.rows_affected(), "books deleted");
        Ok(MutationResult::affected(result.rows_affected()))
    }
}
