//! HTTP request handlers.

pub(crate) mod menu;
pub(crate) mod search;
pub(crate) mod status;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Body returned while the first build is still running.
#[derive(Serialize)]
struct NotReady {
    status: &'static str,
}

/// `503` telling the client to retry once the site is built.
pub(crate) fn not_ready() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(NotReady { status: "building" }),
    )
        .into_response()
}
