use axum::{http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Pipeline stage a quiz request is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Fetching,
    Extracting,
    Generating,
    Persisting,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Generating => "generating",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors raised by the scrape, generate and store components
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid Wikipedia URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch from Wikipedia: {0}")]
    Fetch(String),

    #[error("No content found in the article")]
    EmptyContent,

    #[error("Quiz generation failed: {0}")]
    Generation(String),

    #[error("Quiz {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored quiz {id} is corrupt: {source}")]
    CorruptRecord {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// The stage whose component raised this error
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::InvalidUrl(_) | PipelineError::Fetch(_) => PipelineStage::Fetching,
            PipelineError::EmptyContent => PipelineStage::Extracting,
            PipelineError::Generation(_) => PipelineStage::Generating,
            PipelineError::NotFound(_)
            | PipelineError::Database(_)
            | PipelineError::CorruptRecord { .. } => PipelineStage::Persisting,
        }
    }

    /// Short machine-readable kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidUrl(_) => "invalid_url",
            PipelineError::Fetch(_) => "fetch",
            PipelineError::EmptyContent => "empty_content",
            PipelineError::Generation(_) => "generation",
            PipelineError::NotFound(_) => "not_found",
            PipelineError::Database(_) => "database",
            PipelineError::CorruptRecord { .. } => "corrupt_record",
        }
    }
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// HTTP-facing errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Pipeline failed: {0}")]
    Pipeline(PipelineError),

    #[error("Database error: {0}")]
    DatabaseError(PipelineError),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(id) => ApiError::NotFound(format!("Quiz {} not found", id)),
            PipelineError::Database(_) | PipelineError::CorruptRecord { .. } => {
                ApiError::DatabaseError(err)
            }
            other => ApiError::Pipeline(other),
        }
    }
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }
}

impl ApiError {
    /// Convert to an HTTP response, logging at a level that matches the error kind
    pub fn to_response_with_context(self, context: ErrorContext) -> (StatusCode, Json<ErrorDetail>) {
        match &self {
            ApiError::NotFound(_) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                (
                    StatusCode::NOT_FOUND,
                    Json(ErrorDetail::new("Quiz not found")),
                )
            }
            ApiError::Pipeline(cause) => {
                match cause {
                    PipelineError::InvalidUrl(_) | PipelineError::EmptyContent => warn!(
                        operation = %context.operation,
                        resource_type = %context.resource_type,
                        resource_id = ?context.resource_id,
                        failed_stage = %cause.stage(),
                        error_kind = cause.kind(),
                        error = %cause,
                        "Quiz pipeline rejected input"
                    ),
                    _ => error!(
                        operation = %context.operation,
                        resource_type = %context.resource_type,
                        resource_id = ?context.resource_id,
                        failed_stage = %cause.stage(),
                        error_kind = cause.kind(),
                        error = ?cause,
                        "Quiz pipeline failed"
                    ),
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorDetail::new(format!(
                        "Failed to generate quiz. Internal error: {}",
                        cause
                    ))),
                )
            }
            ApiError::DatabaseError(cause) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %cause,
                    "Database error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorDetail::new(
                        "Database operation failed. Please try again.",
                    )),
                )
            }
        }
    }
}
