//! The query-object endpoint.
//!
//! One `POST` path accepts a JSON object naming the operation and carrying
//! its arguments:
//!
//! ```text
//! { "operation": "list",   "where": {..}, "order_by": [..], "limit": 10, "offset": 0 }
//! { "operation": "insert", "objects": [ {..}, .. ] }
//! { "operation": "update", "set": {..}, "where": {..} }
//! { "operation": "delete", "where": {..} }
//! ```
//!
//! and answers `{"data": [book, ..]}` for `list` or
//! `{"data": {"affected_rows": n, "returning": [..]}}` for mutations.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use db::repository::{DeleteArgs, InsertArgs, ListArgs, UpdateArgs};
use db::{Book, MutationResult};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    List(ListArgs),
    Insert(InsertArgs),
    Update(UpdateArgs),
    Delete(DeleteArgs),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    Rows(Vec<Book>),
    Mutation(MutationResult),
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

pub async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<Operation>, JsonRejection>,
) -> Result<Json<Envelope<OperationOutput>>, ApiError> {
    let Json(operation) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!(operation = operation.name(), entity = state.schema.name, "executing operation");

    let store = &state.store;
    let output = match operation {
        Operation::List(args) => OperationOutput::Rows(store.list(args).await?),
        Operation::Insert(args) => OperationOutput::Mutation(store.insert(args).await?),
        Operation::Update(args) => OperationOutput::Mutation(store.update(args).await?),
        Operation::Delete(args) => OperationOutput::Mutation(store.delete(args).await?),
    };

    Ok(Json(Envelope { data: output }))
}
