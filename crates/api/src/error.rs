//! API error type with `IntoResponse`.
//!
//! Errors become JSON bodies `{"error": <kind>, "message": <text>}`.  Store
//! failures are logged and masked.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use db::DbError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Operation arguments rejected by the repository (400).
    #[error("{0}")]
    Validation(String),

    /// Malformed `where` expression (400).
    #[error("{0}")]
    InvalidFilter(String),

    /// Body is not a well-formed query object (400).
    #[error("{0}")]
    BadRequest(String),

    /// Store failure (500, logged).
    #[error(transparent)]
    Database(DbError),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::InvalidFilter(_) => (StatusCode::BAD_REQUEST, "filter_error"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Validation(msg) => Self::Validation(msg),
            DbError::Filter(e) => Self::InvalidFilter(e.to_string()),
            other => Self::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use db::filter::FilterError;
    use db::repository::mock::MockBookStore;
    use db::repository::ListArgs;
    use db::BookStore;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err: ApiError = DbError::validation("you should pass any field to store in 'set'").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "you should pass any field to store in 'set'");
    }

    #[tokio::test]
    async fn filter_error_is_400() {
        let err: ApiError = DbError::Filter(FilterError::UnknownField("isbn".into())).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "filter_error");
    }

    #[tokio::test]
    async fn database_error_is_500_and_masked() {
        let db_err = MockBookStore::failing("password authentication failed")
            .list(ListArgs::default())
            .await
            .unwrap_err();
        let err: ApiError = db_err.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("password"));
    }
}
