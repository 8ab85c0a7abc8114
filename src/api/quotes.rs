//! `/quotes` endpoints and the per-person quote views.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, AppState};
use crate::archive::{self, Person, Quote, QuoteUpdate};
use crate::db::with_db;
use crate::error::{ArchiveError, ArchiveResult};

#[derive(Debug, Deserialize)]
pub struct CreateQuote {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub content: String,
}

/// Edit body. `user_id` moves the quote to another person.
#[derive(Debug, Deserialize)]
pub struct PatchQuote {
    pub content: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RandomQuote {
    pub quote: Quote,
    pub person: Person,
}

pub async fn list_for_person(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> ApiResult<Json<Vec<Quote>>> {
    let quotes = with_db(&state.db, move |conn| {
        let person = archive::resolve_person(conn, &user)?;
        archive::quotes_for_person(conn, &person.id)
    })
    .await?;
    Ok(Json(quotes))
}

pub async fn show_for_person(
    State(state): State<AppState>,
    Path((user, quote_id)): Path<(String, String)>,
) -> ApiResult<Json<Quote>> {
    let quote = with_db(&state.db, move |conn| {
        let person = archive::resolve_person(conn, &user)?;
        archive::quote_for_person(conn, &person.id, &quote_id)?
            .ok_or(ArchiveError::QuoteNotFound(quote_id))
    })
    .await?;
    Ok(Json(quote))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateQuote>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    let mut missing = Vec::new();
    if body.user_id.trim().is_empty() {
        missing.push("user_id");
    }
    if body.content.trim().is_empty() {
        missing.push("content");
    }
    if !missing.is_empty() {
        return Err(ArchiveError::empty_fields(&missing).into());
    }

    let quote = with_db(&state.db, move |conn| {
        let person = archive::resolve_person(conn, &body.user_id)?;
        archive::create_quote(conn, &person.id, &body.content)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

pub async fn random(State(state): State<AppState>) -> ApiResult<Json<RandomQuote>> {
    let picked = with_db(&state.db, |conn| archive::random_quote_any_person(conn)).await?;
    match picked {
        Some((quote, person)) => Ok(Json(RandomQuote { quote, person })),
        None => Err(ApiError::not_found("No memories to remember.")),
    }
}

pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Quote>> {
    let quote = with_db(&state.db, move |conn| {
        archive::get_quote(conn, &id)?.ok_or(ArchiveError::QuoteNotFound(id))
    })
    .await?;
    Ok(Json(quote))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PatchQuote>,
) -> ApiResult<Json<Quote>> {
    let quote = with_db(&state.db, move |conn| -> ArchiveResult<Quote> {
        let person_id = match &body.user_id {
            Some(user) => Some(archive::resolve_person(conn, user)?.id),
            None => None,
        };
        let update = QuoteUpdate {
            content: body.content,
            person_id,
        };
        archive::update_quote(conn, &id, &update)
    })
    .await?;
    Ok(Json(quote))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    with_db(&state.db, move |conn| archive::delete_quote(conn, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
