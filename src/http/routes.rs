//! The three `history` endpoints: append, positional get, and search.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppState;
use crate::store::{SearchIn, Snapshot, StoreError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:name/items/", post(add_item))
        .route("/:name/items/:index", get(get_item))
        .route("/:name/search/", get(search))
}

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    OutOfRange(#[from] StoreError),
    #[error("unknown search_in value {0:?}, expected user_view|command_view|both")]
    BadSearchIn(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::OutOfRange(err @ StoreError::OutOfRange { .. }) => {
                (StatusCode::NOT_FOUND, Json(ErrorBody { detail: err.to_string() })).into_response()
            }
            ApiError::BadSearchIn(_) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { detail: self.to_string() })).into_response()
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Serialize)]
struct AddItemResponse {
    message: String,
    list_length: usize,
}

async fn add_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(snapshot): Json<Snapshot>,
) -> Json<AddItemResponse> {
    let list_length = state.store.append(snapshot);
    Json(AddItemResponse {
        message: format!("Item added to {name}"),
        list_length,
    })
}

#[derive(Serialize)]
struct GetItemResponse {
    snapshot: Snapshot,
    index: i64,
    list_name: String,
}

async fn get_item(
    State(state): State<AppState>,
    Path((name, index)): Path<(String, i64)>,
) -> Result<Json<GetItemResponse>, ApiError> {
    let snapshot = state.store.get(index)?;
    Ok(Json(GetItemResponse { snapshot, index, list_name: name }))
}

#[derive(Deserialize)]
struct SearchParams {
    pattern: String,
    #[serde(default = "default_search_in")]
    search_in: String,
    limit: Option<usize>,
}

fn default_search_in() -> String {
    "both".to_string()
}

#[derive(Serialize)]
struct SearchResult {
    id: usize,
    snapshot: Snapshot,
}

#[derive(Serialize)]
struct SearchResponse {
    message: String,
    results: Vec<SearchResult>,
    list_name: String,
}

async fn search(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let search_in = SearchIn::parse(&params.search_in)
        .ok_or_else(|| ApiError::BadSearchIn(params.search_in.clone()))?;

    let results = state
        .store
        .search(&params.pattern, search_in, params.limit)
        .into_iter()
        .map(|(id, snapshot)| SearchResult { id, snapshot })
        .collect::<Vec<_>>();

    Ok(Json(SearchResponse {
        message: format!("{} result(s) for {:?} in {}", results.len(), params.pattern, name),
        results,
        list_name: name,
    }))
}
