//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::live_reload;
use crate::site_files;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/menu", get(handlers::menu::get_menu))
        .route("/api/search", get(handlers::search::get_search))
        .route("/api/status", get(handlers::status::get_status));

    let mut router = Router::new().merge(api_routes);

    if state.live_reload_enabled() {
        router = router.route("/ws/live-reload", get(live_reload::ws_handler));
    }

    router
        .fallback(site_files::serve_site)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use quire_build::{BuildOptions, SiteBuilder, SiteLayout};
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    use crate::live_reload::{Dispatcher, LiveReloadManager};
    use crate::snapshot::SnapshotStore;

    struct Fixture {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
        output: PathBuf,
    }

    fn fixture(live_reload: bool) -> Fixture {
        fixture_with(live_reload, true)
    }

    fn fixture_with(live_reload: bool, search_enabled: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("docs");
        let output = dir.path().join("site");
        std::fs::create_dir_all(source.join("img")).unwrap();
        std::fs::write(source.join("index.md"), "# Home\n\nWelcome.\n").unwrap();
        std::fs::write(source.join("guide.md"), "# Guide\n\nInstall the widget.\n").unwrap();
        std::fs::write(source.join("img/logo.png"), "png").unwrap();

        let snapshot = Arc::new(SnapshotStore::default());
        let (tx, _rx) = broadcast::channel(16);
        let builder = SiteBuilder::new(BuildOptions::new(&source, &output)).unwrap();
        let dispatcher = Arc::new(Dispatcher::new(builder, Arc::clone(&snapshot), tx.clone()));
        let live_reload = live_reload.then(|| {
            let layout = SiteLayout {
                source_dir: source.clone(),
                output_dir: output.clone(),
                ..SiteLayout::default()
            };
            LiveReloadManager::new(layout, Arc::clone(&dispatcher), tx, Duration::from_millis(10))
        });

        let state = Arc::new(AppState {
            output_dir: output.clone(),
            snapshot,
            dispatcher,
            live_reload,
            search_enabled,
            search_max_results: 10,
            version: "0.0.0-test".to_owned(),
        });
        Fixture {
            _dir: dir,
            state,
            output,
        }
    }

    async fn get(state: &Arc<AppState>, uri: &str) -> (StatusCode, String) {
        let response = create_router(Arc::clone(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_placeholder_until_first_build() {
        let fx = fixture(false);

        let (status, body) = get(&fx.state, "/guide").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("being built"));

        let (status, body) = get(&fx.state, "/api/menu").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("building"));

        let (status, _) = get(&fx.state, "/api/search?q=widget").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_serves_pages_after_build() {
        let fx = fixture(false);
        fx.state.dispatcher.initial_build().await;
        assert!(fx.output.join("guide.html").exists());

        let (status, body) = get(&fx.state, "/guide").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Install the widget."));
        assert!(!body.contains("/ws/live-reload"));

        let (status, body) = get(&fx.state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome."));

        let (status, body) = get(&fx.state, "/img/logo.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "png");

        let (status, _) = get(&fx.state, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_after_build() {
        let fx = fixture(false);
        fx.state.dispatcher.initial_build().await;

        let (status, body) = get(&fx.state, "/api/menu").await;
        assert_eq!(status, StatusCode::OK);
        let menu: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(!menu["items"].as_array().unwrap().is_empty());

        let (status, body) = get(&fx.state, "/api/search?q=widget").await;
        assert_eq!(status, StatusCode::OK);
        let search: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(search["query"], "widget");
        assert_eq!(search["results"][0]["url"], "/guide.html");

        let (status, body) = get(&fx.state, "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        let status_json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(status_json["ready"], true);
        assert_eq!(status_json["building"], false);
        assert_eq!(status_json["liveReload"], false);
    }

    #[tokio::test]
    async fn test_search_disabled_keeps_artifacts() {
        let fx = fixture_with(false, false);
        fx.state.dispatcher.initial_build().await;

        let (status, _) = get(&fx.state, "/api/search?q=widget").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get(&fx.state, "/search-index.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Guide"));
    }

    #[tokio::test]
    async fn test_live_reload_script_injected() {
        let fx = fixture(true);
        fx.state.dispatcher.initial_build().await;

        let (status, body) = get(&fx.state, "/guide.html").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/ws/live-reload"));
        assert!(body.find("<script>").unwrap() < body.rfind("</body>").unwrap());
    }
}
