use crate::config::Config;
use crate::fonts::available_fonts;
use crate::pipeline::Pipeline;
use crate::resolve::RawRequest;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    started: Instant,
}

#[derive(Debug, Deserialize)]
struct ImageQuery {
    text: Option<String>,
    font: Option<String>,
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        pipeline: Arc::new(Pipeline::new(config)),
        started: Instant::now(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(homepage))
        .route("/health", get(health))
        .route("/:size", get(image1))
        .route("/:size/:p2", get(image2))
        .route("/:size/:p2/:p3", get(image3))
        .route("/:size/:p2/:p3/:p4", get(image4))
        .fallback(not_found)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
                .expose_headers([
                    HeaderName::from_static("x-cache"),
                    header::CACHE_CONTROL,
                ])
                .max_age(Duration::from_secs(86400)),
        )
        .layer(TraceLayer::new_for_http())
}

async fn image1(
    State(state): State<AppState>,
    uri: Uri,
    Path(size): Path<String>,
    Query(query): Query<ImageQuery>,
) -> Response {
    respond(state, uri, size, Vec::new(), query).await
}

async fn image2(
    State(state): State<AppState>,
    uri: Uri,
    Path((size, p2)): Path<(String, String)>,
    Query(query): Query<ImageQuery>,
) -> Response {
    respond(state, uri, size, vec![p2], query).await
}

async fn image3(
    State(state): State<AppState>,
    uri: Uri,
    Path((size, p2, p3)): Path<(String, String, String)>,
    Query(query): Query<ImageQuery>,
) -> Response {
    respond(state, uri, size, vec![p2, p3], query).await
}

async fn image4(
    State(state): State<AppState>,
    uri: Uri,
    Path((size, p2, p3, p4)): Path<(String, String, String, String)>,
    Query(query): Query<ImageQuery>,
) -> Response {
    respond(state, uri, size, vec![p2, p3, p4], query).await
}

/// Common image handler. The cache signature is the request URI exactly
/// as received: equivalent parameterizations with different raw URLs are
/// deliberately distinct entries.
async fn respond(
    state: AppState,
    uri: Uri,
    size: String,
    positional: Vec<String>,
    query: ImageQuery,
) -> Response {
    let signature = uri.to_string();
    let raw = RawRequest {
        size,
        positional,
        text: query.text,
        font: query.font,
    };

    match state.pipeline.handle(&signature, raw).await {
        Ok(rendered) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(rendered.content_type),
            );
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            );
            headers.insert(
                "x-cache",
                HeaderValue::from_static(if rendered.cache_hit { "HIT" } else { "MISS" }),
            );
            (headers, rendered.body).into_response()
        }
        Err(err) => {
            warn!("render failed for {signature}: {err}");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid request",
                    "message": "Check your URL parameters and try again.",
                })),
            )
                .into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "cache": state.pipeline.cache_stats(),
        "raster": {
            "in_flight": state.pipeline.raster_in_flight(),
            "peak_in_flight": state.pipeline.raster_peak(),
        },
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}

async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("No route for {}", uri.path()),
        })),
    )
        .into_response()
}

async fn homepage() -> Html<String> {
    let fonts: Vec<&str> = available_fonts().collect();
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>placeholder-rs</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 860px; margin: 0 auto; padding: 2rem 1rem; line-height: 1.6; color: #1d1d1f; }}
code {{ background: #f5f5f7; padding: 2px 6px; border-radius: 4px; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ text-align: left; padding: 8px 12px; border-bottom: 1px solid #d2d2d7; }}
img {{ border-radius: 4px; vertical-align: middle; }}
</style>
</head>
<body>
<h1>placeholder-rs</h1>
<p>Placeholder image generator. Add dimensions to the URL:</p>
<p><code>/{{size}}/{{background}}/{{textColor}}/{{format}}?text={{text}}&amp;font={{font}}</code></p>
<table>
<tr><th>Segment</th><th>Meaning</th><th>Examples</th></tr>
<tr><td><code>size</code></td><td>WxH, W (square), optional @Nx scale, optional extension</td><td><code>600x400</code>, <code>400</code>, <code>300@2x</code>, <code>600x400.png</code></td></tr>
<tr><td><code>background</code></td><td>Hex (no #), color name, or <code>transparent</code></td><td><code>ff5733</code>, <code>blue</code></td></tr>
<tr><td><code>textColor</code></td><td>Same as background</td><td><code>ffffff</code></td></tr>
<tr><td><code>format</code></td><td>svg (default), png, webp, jpeg, avif</td><td><code>png</code></td></tr>
</table>
<h2>Examples</h2>
<p><img src="/240x120" alt="240x120"> <code>/240x120</code></p>
<p><img src="/240x120/3498db/ffffff" alt="colors"> <code>/240x120/3498db/ffffff</code></p>
<p><img src="/240x120/png" alt="png"> <code>/240x120/png</code></p>
<p><img src="/240x120?text=Hello+World" alt="text"> <code>/240x120?text=Hello+World</code></p>
<h2>Fonts</h2>
<p>{}</p>
</body>
</html>"#,
        fonts
            .iter()
            .map(|f| format!("<code>{f}</code>"))
            .collect::<Vec<_>>()
            .join(" ")
    ))
}
