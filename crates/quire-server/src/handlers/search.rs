//! Search API endpoint.
//!
//! `GET /api/search?q=widget&limit=5` answers from the indexes of the last
//! completed build.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quire_search::SearchHit;
use serde::{Deserialize, Serialize};

use super::not_ready;
use crate::state::AppState;

/// Query string of GET /api/search.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

/// Response for GET /api/search.
#[derive(Serialize)]
pub(crate) struct SearchResponse {
    query: String,
    results: Vec<SearchHit>,
}

/// Handle GET /api/search.
pub(crate) async fn get_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    if !state.search_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }
    let Some(snapshot) = state.snapshot.get() else {
        return not_ready();
    };

    let limit = effective_limit(params.limit, state.search_max_results);
    let results = snapshot.search(&params.q, limit);
    Json(SearchResponse {
        query: params.q,
        results,
    })
    .into_response()
}

/// Requested limit, capped by the configured maximum.
fn effective_limit(requested: Option<usize>, max: usize) -> usize {
    requested.map_or(max, |n| n.min(max))
}
