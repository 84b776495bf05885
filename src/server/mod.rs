//! HTTP/WebSocket server for Bhai Ki Advice
//!
//! Exposes advice generation, REST access to the feed and a live feed
//! WebSocket. No authentication and no rate limiting.

mod events;
pub mod routes;
pub mod state;

pub use state::ServerAppState;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue,
    },
    routing::{get, post},
    Json, Router,
};
use routes::{advice_routes, feed_routes};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Version information for the server
#[derive(serde::Serialize)]
struct VersionInfo {
    name: String,
    version: String,
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.is_empty() {
        // Permissive CORS: allow any origin (default for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([CONTENT_TYPE, ACCEPT])
    } else {
        let allowed_origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods(Any)
            .allow_headers([CONTENT_TYPE, ACCEPT])
    }
}

/// Build the application router
pub fn build_router(state: ServerAppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/generate-advice", post(advice_routes::generate_advice))
        .route("/api/generate-advice", post(advice_routes::generate_advice))
        .route(
            "/api/advices",
            get(feed_routes::list_advices).post(feed_routes::create_advice),
        )
        .route("/api/advices/:id", get(feed_routes::get_advice))
        .route("/api/advices/:id/vote", post(feed_routes::vote_advice))
        .route("/ws/feed", get(events::ws_feed_handler))
        .route("/health", get(health_handler))
        .route("/api/version", get(version_handler))
        .route("/", get(index_handler))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Run the HTTP/WebSocket server until a shutdown is requested
pub async fn run_server(
    port: u16,
    bind: &str,
    state: ServerAppState,
    cors_origins: &[String],
) -> Result<(), String> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let shutdown_state = state.shutdown_state.clone();
    let timeout_secs = state.advice.timeout().as_secs();
    let app = build_router(state, cors_origins);

    let cors_display = if cors_origins.is_empty() {
        "*".to_string()
    } else {
        cors_origins.join(", ")
    };

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Bhai Ki Advice Server                       ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║                                                               ║");
    println!("║  Server URL: http://{}:{:<24}  ║", bind, port);
    println!("║  CORS Origins: {:<45}║", cors_display);
    println!("║  AI Timeout: {:<47}║", format!("{}s", timeout_secs));
    println!("║                                                               ║");
    println!("║  Endpoints:                                                   ║");
    println!("║    POST /generate-advice     - Ask Bhai                      ║");
    println!("║    GET  /api/advices         - Advice feed                   ║");
    println!("║    POST /api/advices/:id/vote - Up-vote an advice            ║");
    println!("║    GET  /ws/feed             - Live feed WebSocket           ║");
    println!("║    GET  /health              - Health check                  ║");
    println!("║                                                               ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);

    let shutdown_signal = async move {
        shutdown_state.wait().await;
        log::info!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Version endpoint
async fn version_handler() -> Json<VersionInfo> {
    Json(VersionInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Index handler - lists the endpoints
async fn index_handler() -> axum::response::Html<&'static str> {
    axum::response::Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Bhai Ki Advice</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 600px;
            margin: 50px auto;
            padding: 20px;
            background: #1a1a2e;
            color: #eee;
        }
        h1 { color: #f97316; }
        code {
            background: #2a2a4e;
            padding: 2px 6px;
            border-radius: 4px;
            font-family: 'Monaco', 'Consolas', monospace;
        }
        .endpoint {
            background: #2a2a4e;
            padding: 10px;
            border-radius: 8px;
            margin: 10px 0;
        }
    </style>
</head>
<body>
    <h1>Bhai Ki Advice</h1>
    <p>Apni problem bata, Bhai solution dega.</p>
    <h2>Endpoints</h2>
    <div class="endpoint">
        <strong>POST /generate-advice</strong><br>
        Body <code>{"problem": "..."}</code>, returns <code>{"advice": "..."}</code>
    </div>
    <div class="endpoint">
        <strong>GET /api/advices?order=latest|popular</strong><br>
        The advice feed
    </div>
    <div class="endpoint">
        <strong>POST /api/advices/:id/vote</strong><br>
        Up-vote an advice
    </div>
    <div class="endpoint">
        <strong>GET /ws/feed?order=latest|popular</strong><br>
        WebSocket pushing the whole feed on every change
    </div>
    <div class="endpoint">
        <strong>GET /health</strong><br>
        Health check endpoint
    </div>
</body>
</html>"#,
    )
}
