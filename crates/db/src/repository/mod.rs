//! Repository layer — the four generic operations over the `books` table.
//!
//! [`BookStore`] is the seam the API layer depends on.  [`BookRepository`]
//! implements it on Postgres; [`mock::MockBookStore`] is a recording test
//! double.

pub mod books;
pub mod mock;
pub mod params;
pub mod sql;
pub mod transaction;

use async_trait::async_trait;

use crate::models::{Book, MutationResult};
use crate::DbError;

pub use books::BookRepository;
pub use params::{DeleteArgs, FieldValues, InsertArgs, ListArgs, OrderBy, SortDirection, UpdateArgs};

/// The operations the API layer binds to the book entity.
///
/// Each call runs in its own transaction.  Validation and filter errors are
/// returned before the store is touched; execution and decode errors roll the
/// transaction back before they are returned.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Rows matching the filter, in the store's natural order unless
    /// `order_by` is given.
    async fn list(&self, args: ListArgs) -> Result<Vec<Book>, DbError>;

    /// Insert every object or none of them; returns the created rows.
    async fn insert(&self, args: InsertArgs) -> Result<MutationResult, DbError>;

    /// Apply `set` to every matching row; returns the updated rows.
    async fn update(&self, args: UpdateArgs) -> Result<MutationResult, DbError>;

    /// Remove every matching row (all rows when no filter is given).
    async fn delete(&self, args: DeleteArgs) -> Result<MutationResult, DbError>;
}
