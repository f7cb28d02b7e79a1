//! Shared fixtures for the database integration tests.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p db -- --ignored

#![allow(dead_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use db::repository::{FieldValues, InsertArgs};
use db::{pool, BookRepository, DbConfig};
use serde_json::json;

pub async fn repository() -> BookRepository {
    let config = DbConfig::from_env().expect("valid database config");
    let pool = pool::create_pool(&config).await.expect("pool creation failed");
    pool::run_migrations(&pool).await.expect("migrations failed");
    BookRepository::new(pool)
}

/// An author name no other test uses, so tests can scope their filters.
pub fn unique_author(test: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    format!("{test}-{}-{nanos}", std::process::id())
}

pub fn book(title: &str, author: &str, year: i64) -> FieldValues {
    json!({ "title": title, "author": author, "year": year })
        .as_object()
        .cloned()
        .expect("json object")
}

pub fn insert_args(books: Vec<FieldValues>) -> InsertArgs {
    InsertArgs::new(books)
}
