//! HTTP API.
//!
//! - POST /api/v1/generate
//! - POST /api/v1/translate
//! - GET /health

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::model::client::Connector;
use crate::prompt::template::ChatPromptTemplate;
use crate::prompt::translation::{translation_template, translation_variables};
use crate::server::error::GatewayError;
use crate::server::pipeline::{run_pipeline, PipelineInput};

/// Application state shared across handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub connector: Arc<dyn Connector>,
    pub translation: ChatPromptTemplate,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            translation: translation_template(),
            start_time: Instant::now(),
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/generate", post(generate))
        .route("/translate", post(translate));

    Router::new()
        .nest("/api/v1", v1)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// Body of POST /api/v1/generate.
#[derive(Debug, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
}

/// Body of POST /api/v1/translate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub output_lang: String,
    pub text: String,
}

/// Successful response for both endpoints.
#[derive(Debug, Serialize)]
pub struct GatewayResponse {
    #[serde(rename = "Response")]
    pub response: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub uptime_secs: u64,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GatewayResponse>, GatewayError> {
    let span = info_span!("generate", request_id = %Uuid::new_v4());
    async move {
        let req: GenerationRequest = decode(&body)?;
        info!(prompt_bytes = req.prompt.len(), "Generate request");
        respond(&state, PipelineInput::Prompt(req.prompt)).await
    }
    .instrument(span)
    .await
}

async fn translate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GatewayResponse>, GatewayError> {
    let span = info_span!("translate", request_id = %Uuid::new_v4());
    async move {
        let req: TranslationRequest = decode(&body)?;
        info!(
            output_lang = %req.output_lang,
            text_bytes = req.text.len(),
            "Translate request"
        );
        let input = PipelineInput::Templated {
            template: &state.translation,
            variables: translation_variables(&req.output_lang, &req.text),
        };
        respond(&state, input).await
    }
    .instrument(span)
    .await
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.config.model.name.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Decode a JSON body regardless of the request's Content-Type.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Rejected request body");
        GatewayError::InvalidJson
    })
}

async fn respond(
    state: &AppState,
    input: PipelineInput<'_>,
) -> Result<Json<GatewayResponse>, GatewayError> {
    match run_pipeline(state.connector.as_ref(), &state.config.model.name, input).await {
        Ok(response) => {
            info!(response_bytes = response.len(), "Request complete");
            Ok(Json(GatewayResponse { response }))
        }
        Err(e) => {
            warn!(error = %e, "Request failed");
            Err(e)
        }
    }
}
