//! JSON REST API over the archive, plus the Slack Events endpoint.
//!
//! `{user}` path segments go through the identity resolver, so a person can be
//! addressed by platform id, display name or ghost id.

pub mod people;
pub mod quotes;
pub mod slack_events;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::bot::NostalgiaBot;
use crate::db::SharedDb;
use crate::error::ArchiveError;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: SharedDb,
    pub bot: NostalgiaBot,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/people", get(people::list).post(people::create))
        .route(
            "/people/{user}",
            get(people::show).patch(people::update).delete(people::remove),
        )
        .route("/people/{user}/quotes", get(quotes::list_for_person))
        .route("/people/{user}/quotes/{quote_id}", get(quotes::show_for_person))
        .route("/quotes", post(quotes::create))
        .route("/quotes/random", get(quotes::random))
        .route(
            "/quotes/{id}",
            get(quotes::show).patch(quotes::update).delete(quotes::remove),
        )
        .route("/slack/events", post(slack_events::handle))
        .with_state(state)
}

/// An error response: `{"message": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<ArchiveError> for ApiError {
    fn from(err: ArchiveError) -> Self {
        let status = match &err {
            ArchiveError::PersonNotFound(_) | ArchiveError::QuoteNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ArchiveError::MultiplePersonsFound(_)
            | ArchiveError::QuoteAlreadyExists
            | ArchiveError::PersonAlreadyExists { .. } => StatusCode::CONFLICT,
            ArchiveError::EmptyRequiredField(_) => StatusCode::BAD_REQUEST,
            ArchiveError::Directory(_) => StatusCode::BAD_GATEWAY,
            ArchiveError::Database(_) | ArchiveError::Internal(_) => {
                tracing::error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `?include=quotes` (comma-separated field list).
#[derive(Debug, Default, Deserialize)]
pub struct IncludeParams {
    pub include: Option<String>,
}

impl IncludeParams {
    pub fn includes(&self, field: &str) -> bool {
        self.include
            .as_deref()
            .map(|list| list.split(',').any(|f| f.trim() == field))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let status = |e: ArchiveError| ApiError::from(e).status;
        assert_eq!(status(ArchiveError::PersonNotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(ArchiveError::QuoteAlreadyExists), StatusCode::CONFLICT);
        assert_eq!(
            status(ArchiveError::empty_fields(&["content"])),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn include_list() {
        let params = IncludeParams {
            include: Some("foo, quotes".into()),
        };
        assert!(params.includes("quotes"));
        assert!(!IncludeParams::default().includes("quotes"));
    }
}
