//! AutoModeler dashboard server.
//!
//! Serves the model API, the workbook download, the OpenAPI docs, and the
//! embedded single-page frontend. The server keeps no per-ticker state:
//! every generate fetches, derives, and projects from scratch, so concurrent
//! users cannot see each other's models.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use model_core::{FinancialDataProvider, ModelError};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use yahoo_client::YahooClient;

mod embedded_frontend;
mod model_routes;

use embedded_frontend::FrontendAssets;

/// Standard JSON envelope for API payloads.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Handler-level error. Converts into the same JSON envelope as success
/// responses, with a status code that reflects where the pipeline failed.
#[derive(Debug)]
pub enum AppError {
    Model(ModelError),
    Internal(anyhow::Error),
}

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        AppError::Model(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Model(e @ ModelError::DataUnavailable(_)) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            AppError::Model(e @ ModelError::Fetch(_)) => (StatusCode::BAD_GATEWAY, e.to_string()),
            AppError::Model(e @ ModelError::Workbook(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": message,
            })),
        )
            .into_response()
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn FinancialDataProvider>,
}

/// Environment-driven server configuration.
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Override for the data provider endpoint (tests, proxies).
    pub yahoo_base_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;
        let yahoo_base_url = std::env::var("YAHOO_BASE_URL").ok();
        Ok(Self {
            bind_addr,
            yahoo_base_url,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(model_routes::get_model, model_routes::download_workbook),
    components(schemas(
        model_core::CompanyMeta,
        model_core::Timeline,
        model_routes::ModelResponse,
        model_routes::KpiCard,
        model_routes::PerformancePayload,
        model_routes::MarginsPayload,
        model_routes::CashFlowPayload,
        model_routes::StatementSection,
        model_routes::StatementLine,
    )),
    tags((name = "Model", description = "3-statement model generation"))
)]
struct ApiDoc;

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let config = ServerConfig::from_env()?;
    let provider: Arc<dyn FinancialDataProvider> = match &config.yahoo_base_url {
        Some(base) => Arc::new(YahooClient::with_base_url(base.clone(), base.clone())),
        None => Arc::new(YahooClient::new()),
    };
    tracing::info!("Data provider: {}", provider.provider_name());

    let app = build_router(AppState { provider });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Dashboard listening on http://{}", config.bind_addr);
    tracing::info!("API docs at http://{}/docs", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(model_routes::model_routes())
        .route("/api/health", get(health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(frontend_handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "automodeler" }))
}

/// Serves the embedded frontend; unknown paths fall back to 404 rather than
/// the index so API typos stay visible.
async fn frontend_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match FrontendAssets::get(path) {
        Some(file) => {
            ([(header::CONTENT_TYPE, content_type_for(path))], file.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
