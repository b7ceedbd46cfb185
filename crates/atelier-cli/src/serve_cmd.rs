use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use atelier_core::envelope::{KeyFeatures, SummaryOutcome};
use atelier_core::images::GeneratedImageSet;
use atelier_core::{Stage, StageContext, Studio, StudioError};

pub const REGENERATE_IMAGES_PATH: &str = "/api/regenerate-images";
pub const SUMMARY_PATH: &str = "/api/generate_summary";
pub const KEY_FEATURES_PATH: &str = "/api/generate_key_features";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn internal(err: StudioError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "detail": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of every stage, summary and key-features request.
#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub data: StageContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateRequest {
    pub idea_name: String,
    pub instruction: String,
    pub data: StageContext,
}

#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub images: GeneratedImageSet,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(studio: Arc<Studio>) -> Router {
    let mut router = Router::new().route("/", get(index));

    for stage in Stage::ALL {
        router = router.route(
            &stage.path(),
            post(
                move |State(studio): State<Arc<Studio>>, Json(request): Json<StageRequest>| async move {
                    Json(studio.process_stage(stage, request.data).await)
                },
            ),
        );
    }

    router
        .route(REGENERATE_IMAGES_PATH, post(regenerate_images))
        .route(SUMMARY_PATH, post(generate_summary))
        .route(KEY_FEATURES_PATH, post(generate_key_features))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(studio)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(studio: Studio, bind: &str, port: u16) -> Result<()> {
    let app = build_router(Arc::new(studio));
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("atelier serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("atelier serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "Hello": "World" }))
}

async fn regenerate_images(
    State(studio): State<Arc<Studio>>,
    Json(request): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, AppError> {
    let images = studio
        .regenerate_images(&request.idea_name, &request.instruction, &request.data)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(RegenerateResponse { images }))
}

async fn generate_summary(
    State(studio): State<Arc<Studio>>,
    Json(request): Json<StageRequest>,
) -> Json<SummaryOutcome> {
    Json(studio.generate_summary(&request.data).await)
}

async fn generate_key_features(
    State(studio): State<Arc<Studio>>,
    Json(request): Json<StageRequest>,
) -> Result<Json<KeyFeatures>, AppError> {
    let features = studio
        .generate_key_features(&request.data)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(features))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
