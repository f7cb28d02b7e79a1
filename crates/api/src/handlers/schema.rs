//! Entity shape, as declared by the schema description.

use axum::extract::State;
use axum::Json;

use db::EntitySchema;

use crate::AppState;

pub async fn describe(State(state): State<AppState>) -> Json<&'static EntitySchema> {
    Json(state.schema)
}
