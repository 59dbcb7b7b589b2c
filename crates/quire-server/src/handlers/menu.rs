//! Menu API endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use quire_site::MenuNode;
use serde::Serialize;

use super::not_ready;
use crate::state::AppState;

/// Response for GET /api/menu.
#[derive(Serialize)]
pub(crate) struct MenuResponse<'a> {
    items: &'a [MenuNode],
}

/// Handle GET /api/menu.
pub(crate) async fn get_menu(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = state.snapshot.get() else {
        return not_ready();
    };
    Json(MenuResponse {
        items: &snapshot.menu,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_response_serialization() {
        let items = vec![MenuNode::link("Guide", "/guide", "/guide.html")];

        let json = serde_json::to_value(MenuResponse { items: &items }).unwrap();

        assert_eq!(json["items"][0]["label"], "Guide");
        assert_eq!(json["items"][0]["href"], "/guide.html");
    }
}
