//! HTTP mapping of `DomainError`. Body is always `{"error": "<message>"}`.

use crate::domain::DomainError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) | DomainError::InvalidSignature => StatusCode::BAD_REQUEST,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            DomainError::Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::Gateway(_) | DomainError::Meeting(_) | DomainError::Mail(_) => {
                StatusCode::BAD_GATEWAY
            }
            DomainError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "internal error".to_string()
        } else {
            if status.is_server_error() {
                error!(error = %self, "upstream failure");
            }
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DomainError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(DomainError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(DomainError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(DomainError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(DomainError::InvalidSignature.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(DomainError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            DomainError::PaymentRequired("x".into()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(DomainError::repo("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(DomainError::Gateway("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            DomainError::GatewayUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
