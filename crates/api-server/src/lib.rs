use audit_orchestrator::{AuditorConfig, HealthAuditor};
use axum::{
    extract::Request,
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yahoo_client::YahooClient;

pub mod audit_routes;
pub mod request_id;

use request_id::request_id_middleware;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

#[derive(Clone)]
pub struct AppState {
    pub auditor: Arc<HealthAuditor>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(audit_routes::audit_routes())
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(CorsLayer::permissive())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn init_tracing() {
    let json_logging = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api_server=info,audit_orchestrator=info,yahoo_client=warn,tower_http=info".into());

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AuditorConfig::from_env();
    tracing::info!(
        "Auditing {} symbols, fetch timeout {}s, cache ttl {}s",
        config.exchange_suffix,
        config.fetch_timeout.as_secs(),
        config.cache_ttl.as_secs()
    );

    let provider = Arc::new(YahooClient::new());
    let auditor = Arc::new(HealthAuditor::new(provider, config));
    let app = build_router(AppState { auditor });

    let addr = std::env::var("AUDIT_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Health audit API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
