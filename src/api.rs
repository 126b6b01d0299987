use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{ApiError, ErrorContext, ErrorDetail},
    models::*,
    quiz_service::QuizService,
};

// Import logging macros
use crate::{log_api_error, log_api_start, log_api_success, log_api_warn};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorDetail>)>;

pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuizRequest>,
) -> ApiResult<Quiz> {
    log_api_start!("generate_quiz", url = request.url);

    match state.quiz_service.generate_quiz(&request.url).await {
        Ok(quiz) => {
            log_api_success!("generate_quiz", quiz_id = quiz.id, "quiz generated and stored");
            Ok(Json(quiz))
        }
        Err(e) => {
            let context = ErrorContext::new("generate_quiz", "quiz").with_id(&request.url);
            Err(ApiError::Pipeline(e).to_response_with_context(context))
        }
    }
}

pub async fn get_history(State(state): State<AppState>) -> ApiResult<Vec<QuizHistoryEntry>> {
    log_api_start!("get_history");

    match state.quiz_service.history().await {
        Ok(entries) => {
            log_api_success!("get_history", count = entries.len(), "history listed");
            Ok(Json(entries))
        }
        Err(e) => {
            log_api_error!("get_history", error = e, "could not list quizzes");
            Err(ApiError::from(e).to_response_with_context(ErrorContext::new("get_history", "quiz")))
        }
    }
}

pub async fn get_quiz(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Quiz> {
    log_api_start!("get_quiz", quiz_id = id);

    match state.quiz_service.get_quiz(id).await {
        Ok(quiz) => {
            log_api_success!("get_quiz", quiz_id = id, "quiz retrieved");
            Ok(Json(quiz))
        }
        Err(e) => {
            let context = ErrorContext::new("get_quiz", "quiz").with_id(&id.to_string());
            Err(ApiError::from(e).to_response_with_context(context))
        }
    }
}

pub async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<MessageResponse> {
    log_api_start!("delete_quiz", quiz_id = id);

    match state.quiz_service.delete_quiz(id).await {
        Ok(()) => {
            log_api_success!("delete_quiz", quiz_id = id, "quiz deleted");
            Ok(Json(MessageResponse {
                message: "Quiz deleted successfully".to_string(),
            }))
        }
        Err(e) => {
            if matches!(e, crate::errors::PipelineError::NotFound(_)) {
                log_api_warn!("delete_quiz", quiz_id = id, "quiz not found");
            }
            let context = ErrorContext::new("delete_quiz", "quiz").with_id(&id.to_string());
            Err(ApiError::from(e).to_response_with_context(context))
        }
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/generate_quiz", post(generate_quiz))
        .route("/history", get(get_history))
        .route("/quiz/:id", get(get_quiz).delete(delete_quiz))
        .route("/health", get(health_check))
        .with_state(state)
}
