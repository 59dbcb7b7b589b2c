//! Serving the generated site.
//!
//! Files come from the output root through `tower-http`'s `ServeDir`.
//! Extensionless page paths (`/guide`) are mapped to their `.html` file.
//! Until the first build completes, page requests get a placeholder that
//! refreshes itself; so does a request for a page the last build knows
//! about but has not written. With live reload on, HTML pages get a small client
//! script that listens on `/ws/live-reload`.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Largest page that gets the live reload script injected.
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

const LIVE_RELOAD_SCRIPT: &str = r#"<script>
(function () {
  var proto = location.protocol === "https:" ? "wss:" : "ws:";
  var socket = new WebSocket(proto + "//" + location.host + "/ws/live-reload");
  var page = location.pathname.replace(/\.html$/, "").replace(/\/index$/, "").replace(/\/$/, "") || "/";
  socket.onmessage = function (msg) {
    var event = JSON.parse(msg.data);
    if (event.type !== "reload") return;
    var isAsset = /\.[a-z0-9]+$/i.test(event.path);
    if (event.path === "/" || event.path === page || isAsset) location.reload();
  };
})();
</script>
"#;

const PLACEHOLDER_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="1">
<title>Building...</title>
</head>
<body>
<p>The site is being built. This page reloads when it is ready.</p>
</body>
</html>
"#;

/// Serve a generated file, or the placeholder while nothing is built.
pub(crate) async fn serve_site(State(state): State<Arc<AppState>>, req: Request<Body>) -> Response {
    let path = req.uri().path().to_owned();
    let snapshot = state.snapshot.get();
    if snapshot.is_none() && is_page_request(&path) {
        return placeholder();
    }

    let req = map_extensionless(req, &state.output_dir).await;
    let response = match ServeDir::new(&state.output_dir).oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(infallible) => match infallible {},
    };

    // A known page that is not on disk yet is still being written
    let known_page = snapshot.is_some_and(|s| s.valid_paths.contains(&path));
    if response.status() == StatusCode::NOT_FOUND && known_page && is_page_request(&path) {
        return placeholder();
    }

    if state.live_reload_enabled() && is_html(&response) {
        return inject_live_reload(response).await;
    }
    response
}

fn placeholder() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Html(PLACEHOLDER_PAGE)).into_response()
}

/// Whether a request path names a page rather than an asset.
fn is_page_request(path: &str) -> bool {
    path.ends_with('/')
        || Path::new(path)
            .extension()
            .is_none_or(|ext| ext.eq_ignore_ascii_case("html"))
}

/// Rewrite `/guide` to `/guide.html` when that file exists.
async fn map_extensionless(req: Request<Body>, output_dir: &Path) -> Request<Body> {
    let path = req.uri().path().to_owned();
    if path.ends_with('/') || path.contains("..") || Path::new(&path).extension().is_some() {
        return req;
    }

    let candidate = output_dir.join(format!("{}.html", path.trim_start_matches('/')));
    if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        return req;
    }

    let target = match req.uri().query() {
        Some(query) => format!("{path}.html?{query}"),
        None => format!("{path}.html"),
    };
    let Ok(uri) = target.parse::<Uri>() else {
        return req;
    };
    let (mut parts, body) = req.into_parts();
    parts.uri = uri;
    Request::from_parts(parts, body)
}

fn is_html(response: &Response) -> bool {
    response.status().is_success()
        && response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"))
}

async fn inject_live_reload(response: Response) -> Response {
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read page body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let Ok(html) = String::from_utf8(bytes.to_vec()) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    let html = with_script(&html);
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );
    Response::from_parts(parts, Body::from(html))
}

/// Insert the live reload script before the closing body tag.
fn with_script(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + LIVE_RELOAD_SCRIPT.len());
    match html.rfind("</body>") {
        Some(pos) => {
            out.push_str(&html[..pos]);
            out.push_str(LIVE_RELOAD_SCRIPT);
            out.push_str(&html[pos..]);
        }
        None => {
            out.push_str(html);
            out.push_str(LIVE_RELOAD_SCRIPT);
        }
    }
    out
}
