use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use image_generator::{preprocess, transform_room, GenerationError, HttpImageGenerator, ImageGenerator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use style_engine::{
    build_prompt, EngineError, FormChoices, GenerationParams, QuizCatalog, QuizOutcome, QuizSubmission,
    RoomEditRequest,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod config;

use config::ServerConfig;

// Room photos arrive base64 encoded inside JSON
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared, read-only handles built once at startup
#[derive(Clone)]
pub struct AppState {
    pub quiz: Arc<QuizCatalog>,
    pub choices: Arc<FormChoices>,
    pub generator: Option<Arc<dyn ImageGenerator>>,
}

impl AppState {
    pub fn new(quiz: QuizCatalog, generator: Option<Arc<dyn ImageGenerator>>) -> Self {
        Self {
            quiz: Arc::new(quiz),
            choices: Arc::new(FormChoices::default()),
            generator,
        }
    }

    /// Load the quiz table and connect the image model named in the environment
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let quiz = match &config.quiz_catalog_path {
            Some(path) => QuizCatalog::from_path(path)?,
            None => QuizCatalog::builtin()?,
        };
        info!("Style quiz ready with {} questions", quiz.len());

        let generator: Option<Arc<dyn ImageGenerator>> = match HttpImageGenerator::from_env() {
            Ok(generator) => {
                info!("Image model endpoint: {}", generator.endpoint());
                Some(Arc::new(generator))
            }
            Err(e) => {
                warn!("Room transformation disabled: {}", e);
                None
            }
        };

        Ok(Self::new(quiz, generator))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// Unwrap a JSON body, answering malformed ones in the usual error shape
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        api_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
    })
}

fn engine_error(e: EngineError) -> ApiError {
    match &e {
        EngineError::InvalidInput(_) => api_error(StatusCode::BAD_REQUEST, "INVALID_INPUT", e.user_message()),
        EngineError::IncompleteSubmission { .. } => {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, "INCOMPLETE_SUBMISSION", e.user_message())
        }
        EngineError::InvalidCatalog(_) => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "INVALID_CATALOG", e.user_message())
        }
    }
}

fn generation_error(e: GenerationError) -> ApiError {
    match e {
        GenerationError::Engine(inner) => engine_error(inner),
        GenerationError::Image(err) => api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_IMAGE",
            format!("Failed to read room image: {}", err),
        ),
        GenerationError::Decode(msg) => api_error(StatusCode::BAD_REQUEST, "INVALID_IMAGE", msg),
        GenerationError::ModelInvocation(msg) => {
            api_error(StatusCode::BAD_GATEWAY, "MODEL_INVOCATION_FAILURE", msg)
        }
        GenerationError::Config(msg) => api_error(StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION", msg),
        GenerationError::Task(err) => api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", err.to_string()),
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    model_available: bool,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_available: state.generator.is_some(),
    })
}

async fn choices_handler(State(state): State<AppState>) -> Json<FormChoices> {
    Json(state.choices.as_ref().clone())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
}

async fn quiz_questions_handler(State(state): State<AppState>) -> Json<Vec<QuestionView>> {
    Json(
        state
            .quiz
            .questions()
            .iter()
            .map(|q| QuestionView {
                question: q.question.clone(),
                options: q.options.clone(),
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
struct QuizSubmitRequest {
    answers: Vec<Option<String>>,
}

#[derive(Debug, Serialize)]
struct QuizSubmitResponse {
    #[serde(flatten)]
    outcome: QuizOutcome,
    title: String,
    message: String,
}

async fn quiz_submit_handler(
    State(state): State<AppState>,
    payload: Result<Json<QuizSubmitRequest>, JsonRejection>,
) -> Result<Json<QuizSubmitResponse>, ApiError> {
    let request = json_body(payload)?;
    info!("Received quiz submission with {} answers", request.answers.len());

    let outcome = state
        .quiz
        .evaluate(&QuizSubmission::new(request.answers))
        .map_err(engine_error)?;

    Ok(Json(QuizSubmitResponse {
        title: outcome.title().to_string(),
        message: outcome.message().to_string(),
        outcome,
    }))
}

#[derive(Debug, Serialize)]
struct PromptResponse {
    prompt: String,
    params: GenerationParams,
}

async fn prompt_preview_handler(
    payload: Result<Json<RoomEditRequest>, JsonRejection>,
) -> Result<Json<PromptResponse>, ApiError> {
    let request = json_body(payload)?;
    let prompt = build_prompt(&request).map_err(engine_error)?;
    Ok(Json(PromptResponse {
        prompt,
        params: GenerationParams::default(),
    }))
}

#[derive(Debug, Deserialize)]
struct TransformRequest {
    /// Base64 room photo, optionally as a data URI
    #[serde(default)]
    image: Option<String>,
    #[serde(flatten)]
    edit: RoomEditRequest,
}

#[derive(Debug, Serialize)]
struct TransformResponse {
    /// Base64 PNG
    image: String,
    prompt: String,
}

async fn transform_handler(
    State(state): State<AppState>,
    payload: Result<Json<TransformRequest>, JsonRejection>,
) -> Result<Json<TransformResponse>, ApiError> {
    let request = json_body(payload)?;
    let request_id = uuid::Uuid::new_v4();
    info!("[{}] Transform request for {}", request_id, request.edit.room_type);

    let image_bytes = match request.image.as_deref() {
        Some(encoded) => Some(preprocess::from_base64(encoded).map_err(generation_error)?),
        None => None,
    };

    // Input problems are reported even when no model is configured
    if image_bytes.as_deref().map_or(true, <[u8]>::is_empty) {
        warn!("[{}] Rejected: no input image", request_id);
        return Err(engine_error(EngineError::InvalidInput("No input image provided".to_string())));
    }

    let Some(generator) = state.generator.clone() else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "MODEL_UNAVAILABLE",
            "No image model is configured. Set SD_API_URL and restart the server.",
        ));
    };

    let output = transform_room(generator.as_ref(), image_bytes.as_deref(), &request.edit)
        .await
        .map_err(|e| {
            warn!("[{}] Transform failed: {}", request_id, e);
            generation_error(e)
        })?;

    info!("[{}] Transform complete", request_id);

    Ok(Json(TransformResponse {
        image: preprocess::to_base64(&output.image),
        prompt: output.prompt,
    }))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

pub fn create_app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/choices", get(choices_handler))
        .route("/quiz", get(quiz_questions_handler))
        .route("/quiz/submit", post(quiz_submit_handler))
        .route("/prompt", post(prompt_preview_handler))
        .route("/transform", post(transform_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
