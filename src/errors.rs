use crate::api::ApiResponse;
use axum::{http::StatusCode, response::Json};
use tracing::{error, info, warn};

/// Centralized error types for consistent API error handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(#[from] anyhow::Error),

    #[error("LLM service error: {0}")]
    LLMError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
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
    /// Convert API error to HTTP response with consistent structure and logging
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ApiResponse<()>>) {
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
                    Json(ApiResponse::error(format!(
                        "{} not found",
                        context.resource_type
                    ))),
                )
            }
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Invalid request"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::LLMError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "LLM service error"
                );
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiResponse::error(
                        "AI service temporarily unavailable. Please try again.".to_string(),
                    )),
                )
            }
            ApiError::StoreError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Store error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(
                        "Storage operation failed. Please try again.".to_string(),
                    )),
                )
            }
        }
    }

    /// Simple conversion without context
    #[allow(dead_code)]
    pub fn to_response(self) -> (StatusCode, Json<ApiResponse<()>>) {
        let context = ErrorContext::new("unknown", "resource");
        self.to_response_with_context(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("answer_card", "card").with_id("123");

        assert_eq!(context.operation, "answer_card");
        assert_eq!(context.resource_type, "card");
        assert_eq!(context.resource_id, Some("123".to_string()));
    }

    #[test]
    fn test_api_error_status_mapping() {
        let error = ApiError::NotFound("Card not found".to_string());
        let context = ErrorContext::new("get_card", "card").with_id("123");
        let (status, _response) = error.to_response_with_context(context);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let error = ApiError::ValidationError("Invalid data".to_string());
        let (status, _) = error.to_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let error = ApiError::BadRequest("deck_id is required".to_string());
        let (status, _) = error.to_response();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let error = ApiError::LLMError("provider unreachable".to_string());
        let (status, _) = error.to_response();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let error = ApiError::StoreError(anyhow::anyhow!("disk full"));
        let (status, _) = error.to_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_error_from_anyhow() {
        fn fails() -> Result<(), ApiError> {
            Err(anyhow::anyhow!("broken file"))?
        }
        assert!(matches!(fails(), Err(ApiError::StoreError(_))));
    }
}
