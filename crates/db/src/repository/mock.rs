//! `MockBookStore` — a test double for `BookStore`.
//!
//! Records every call it receives and answers with programmer-specified
//! data.  Argument preconditions are still enforced so callers see the same
//! validation errors as with the real repository.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::models::{Book, MutationResult};
use crate::repository::params::{DeleteArgs, InsertArgs, ListArgs, UpdateArgs};
use crate::repository::{sql, BookStore};
use crate::schema::BOOK_SCHEMA;
use crate::DbError;

/// A call seen by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    List(ListArgs),
    Insert(InsertArgs),
    Update(UpdateArgs),
    Delete(DeleteArgs),
}

/// Behaviour injected into `MockBookStore` at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Answer with the given rows.
    Rows(Vec<Book>),
    /// Fail every call that gets past validation with an execution error.
    FailExecution(String),
}

pub struct MockBookStore {
    pub behaviour: MockBehaviour,
    /// Every call that passed validation.
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockBookStore {
    /// A mock that answers `list` and mutations with `rows`.
    pub fn returning(rows: Vec<Book>) -> Self {
        Self {
            behaviour: MockBehaviour::Rows(rows),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            behaviour: MockBehaviour::FailExecution(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of calls that reached the store.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) -> Result<Vec<Book>, DbError> {
        self.calls.lock().unwrap().push(call);
        match &self.behaviour {
            MockBehaviour::Rows(rows) => Ok(rows.clone()),
            MockBehaviour::FailExecution(msg) => Err(DbError::Execution(sqlx::Error::Protocol(msg.clone()))),
        }
    }
}

#[async_trait]
impl BookStore for MockBookStore {
    async fn list(&self, args: ListArgs) -> Result<Vec<Book>, DbError> {
        sql::select(&BOOK_SCHEMA, &args)?;
        self.record(RecordedCall::List(args))
    }

    async fn insert(&self, args: InsertArgs) -> Result<MutationResult, DbError> {
        args.validate()?;
        for object in &args.objects {
            sql::insert(&BOOK_SCHEMA, object)?;
        }
        self.record(RecordedCall::Insert(args)).map(MutationResult::with_rows)
    }

    async fn update(&self, args: UpdateArgs) -> Result<MutationResult, DbError> {
        sql::update(&BOOK_SCHEMA, &args)?;
        self.record(RecordedCall::Update(args)).map(MutationResult::with_rows)
    }

    async fn delete(&self, args: DeleteArgs) -> Result<MutationResult, DbError> {
        sql::delete(&BOOK_SCHEMA, &args)?;
        self.record(RecordedCall::Delete(args))
            .map(|rows| MutationResult::affected(rows.len() as u64))
    }
}
