//! Standardized logging macros so quiz, fetch and backend events share field names.

// ============================================================================
// API Operation Logging Macros
// ============================================================================

/// Log the start of an API operation
#[macro_export]
macro_rules! log_api_start {
    ($operation:expr, quiz_id = $quiz_id:expr) => {
        tracing::debug!(
            operation = $operation,
            quiz_id = $quiz_id,
            "API operation started"
        );
    };
    ($operation:expr, url = $url:expr) => {
        tracing::debug!(
            operation = $operation,
            url = %$url,
            "API operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(operation = $operation, "API operation started");
    };
}

/// Log successful completion of an API operation
#[macro_export]
macro_rules! log_api_success {
    ($operation:expr, quiz_id = $quiz_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            quiz_id = $quiz_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(operation = $operation, "API operation completed: {}", $msg);
    };
}

/// Log API operation errors
#[macro_export]
macro_rules! log_api_error {
    ($operation:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
}

/// Log API warnings
#[macro_export]
macro_rules! log_api_warn {
    ($operation:expr, quiz_id = $quiz_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            quiz_id = $quiz_id,
            "API operation warning: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::warn!(operation = $operation, "API operation warning: {}", $msg);
    };
}

// ============================================================================
// Pipeline Logging Macros
// ============================================================================

/// Log a quiz pipeline stage transition
#[macro_export]
macro_rules! log_pipeline_stage {
    ($request_id:expr, failed = $error:expr) => {
        tracing::error!(
            component = "quiz_pipeline",
            request_id = %$request_id,
            stage = "failed",
            failed_stage = %$error.stage(),
            error_kind = $error.kind(),
            error = %$error,
            "Pipeline failed"
        );
    };
    ($request_id:expr, $stage:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = "quiz_pipeline",
            request_id = %$request_id,
            stage = %$stage,
            duration_ms = $duration,
            "Pipeline finished"
        );
    };
    ($request_id:expr, $stage:expr) => {
        tracing::debug!(
            component = "quiz_pipeline",
            request_id = %$request_id,
            stage = %$stage,
            "Pipeline stage entered"
        );
    };
}

/// Log a retried network attempt
#[macro_export]
macro_rules! log_fetch_retry {
    ($target:expr, attempt = $attempt:expr, max_attempts = $max:expr, delay_ms = $delay:expr, error = $error:expr) => {
        tracing::warn!(
            component = "fetcher",
            target_url = %$target,
            attempt = $attempt,
            max_attempts = $max,
            delay_ms = $delay,
            error = %$error,
            "Transient fetch failure, retrying"
        );
    };
    ($target:expr, attempt = $attempt:expr, max_attempts = $max:expr, error = $error:expr) => {
        tracing::error!(
            component = "fetcher",
            target_url = %$target,
            attempt = $attempt,
            max_attempts = $max,
            error = %$error,
            "Fetch attempts exhausted"
        );
    };
}

// ============================================================================
// Database Operation Logging Macros
// ============================================================================

/// Log database operation results
#[macro_export]
macro_rules! log_db_operation {
    (debug, $operation:expr, quiz_id = $quiz_id:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            component = "database",
            operation = $operation,
            quiz_id = $quiz_id,
            duration_ms = $duration,
            "Database operation completed"
        );
    };
    (debug, $operation:expr, count = $count:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            component = "database",
            operation = $operation,
            result_count = $count,
            duration_ms = $duration,
            "Database operation completed"
        );
    };
    (info, $operation:expr, $msg:expr) => {
        tracing::info!(
            component = "database",
            operation = $operation,
            "Database operation: {}", $msg
        );
    };
    (error, $operation:expr, error = $error:expr) => {
        tracing::error!(
            component = "database",
            operation = $operation,
            error = %$error,
            "Database operation failed"
        );
    };
}

// ============================================================================
// LLM Service Logging Macros
// ============================================================================

/// Log generator operations with backend context
#[macro_export]
macro_rules! log_llm_operation {
    (start, $operation:expr, backend = $backend:expr, content_length = $len:expr) => {
        tracing::info!(
            component = "quiz_generator",
            operation = $operation,
            backend = %$backend,
            content_length = $len,
            "LLM operation started"
        );
    };
    (success, $operation:expr, backend = $backend:expr, duration_ms = $duration:expr, questions = $count:expr) => {
        tracing::info!(
            component = "quiz_generator",
            operation = $operation,
            backend = %$backend,
            duration_ms = $duration,
            question_count = $count,
            "LLM operation completed successfully"
        );
    };
    (error, $operation:expr, backend = $backend:expr, error = $error:expr) => {
        tracing::error!(
            component = "quiz_generator",
            operation = $operation,
            backend = %$backend,
            error = %$error,
            "LLM operation failed"
        );
    };
    (warn, $operation:expr, $msg:expr) => {
        tracing::warn!(
            component = "quiz_generator",
            operation = $operation,
            "LLM operation warning: {}", $msg
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and configuration events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::errors::{PipelineError, PipelineStage};
    use uuid::Uuid;

    #[test]
    fn test_logging_macros_compile() {
        let request_id = Uuid::new_v4();
        let error = PipelineError::Fetch("connection refused".to_string());

        log_api_start!("get_quiz", quiz_id = 1_i64);
        log_api_start!("generate_quiz", url = "https://en.wikipedia.org/wiki/Rust");
        log_api_start!("history");

        log_api_success!("get_quiz", quiz_id = 1_i64, "quiz retrieved");
        log_api_success!("history", count = 3, "history listed");
        log_api_warn!("delete_quiz", quiz_id = 9_i64, "quiz not found");
        log_api_error!("generate_quiz", error = error, "pipeline failed");

        log_pipeline_stage!(request_id, PipelineStage::Fetching);
        log_pipeline_stage!(request_id, PipelineStage::Done, duration_ms = 120);
        log_pipeline_stage!(request_id, failed = error);

        log_fetch_retry!(
            "https://en.wikipedia.org/wiki/Rust",
            attempt = 1,
            max_attempts = 3,
            delay_ms = 2000,
            error = "timed out"
        );

        log_db_operation!(debug, "save_quiz", quiz_id = 1_i64, duration_ms = 3);
        log_db_operation!(debug, "list_quizzes", count = 2, duration_ms = 1);
        log_db_operation!(info, "migration", "schema ready");
        log_db_operation!(error, "get_quiz", error = error);

        log_llm_operation!(start, "generate_quiz", backend = "stub", content_length = 10);
        log_llm_operation!(warn, "generate_quiz", "no credential");

        log_system_event!(startup, component = "server", "server starting");
        log_system_event!(config, "configuration loaded");
        log_validation!(success, "configuration", "ok");
        log_validation!(failure, "configuration", error = "port is 0");
    }
}
