//! `db` crate — persistence layer for the book entity.
//!
//! Provides connection configuration, a connection pool, the entity schema
//! description, filter translation, and the repository that turns generic
//! list/insert/update/delete arguments into parameterized SQL.

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pool;
pub mod query;
pub mod repository;
pub mod schema;

pub use config::DbConfig;
pub use error::DbError;
pub use models::{Book, MutationResult};
pub use pool::DbPool;
pub use repository::{BookRepository, BookStore};
pub use schema::{EntitySchema, BOOK_SCHEMA};
