//! `/people` endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::{ApiError, ApiResult, AppState, IncludeParams};
use crate::archive::{self, NewPerson, Person, PersonUpdate};
use crate::db::with_db;
use crate::error::{ArchiveError, ArchiveResult};

/// A person as returned by the API, optionally with their quote contents.
#[derive(Debug, Serialize)]
pub struct PersonView {
    #[serde(flatten)]
    pub person: Person,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotes: Option<Vec<String>>,
}

fn view(conn: &rusqlite::Connection, person: Person, with_quotes: bool) -> ArchiveResult<PersonView> {
    let quotes = if with_quotes {
        let quotes = archive::quotes_for_person(conn, &person.id)?;
        Some(quotes.into_iter().map(|q| q.content).collect())
    } else {
        None
    };
    Ok(PersonView { person, quotes })
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<IncludeParams>,
) -> ApiResult<Json<Vec<PersonView>>> {
    let with_quotes = params.includes("quotes");
    let people = with_db(&state.db, move |conn| {
        archive::all_people(conn)?
            .into_iter()
            .map(|person| view(conn, person, with_quotes))
            .collect::<ArchiveResult<Vec<_>>>()
    })
    .await?;
    Ok(Json(people))
}

pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewPerson>,
) -> ApiResult<(StatusCode, Json<Person>)> {
    let person = with_db(&state.db, move |conn| archive::create_person(conn, &new)).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn show(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Query(params): Query<IncludeParams>,
) -> ApiResult<Json<PersonView>> {
    let with_quotes = params.includes("quotes");
    let person = with_db(&state.db, move |conn| {
        let person = archive::resolve_person(conn, &user)?;
        view(conn, person, with_quotes)
    })
    .await?;
    Ok(Json(person))
}

pub async fn update(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(update): Json<PersonUpdate>,
) -> ApiResult<Json<Person>> {
    let person = with_db(&state.db, move |conn| {
        let person = archive::resolve_person(conn, &user)?;
        archive::update_person(conn, &person.id, &update)
    })
    .await
    .map_err(|e| match e {
        // the record exists, the edit would break it
        ArchiveError::EmptyRequiredField(_) => {
            ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        other => other.into(),
    })?;
    Ok(Json(person))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> ApiResult<StatusCode> {
    with_db(&state.db, move |conn| {
        let person = archive::resolve_person(conn, &user)?;
        archive::delete_person(conn, &person.id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
