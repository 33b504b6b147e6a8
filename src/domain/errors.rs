//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these; the HTTP adapter maps these into status codes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Gateway credentials are not configured on this deployment.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Webhook signature mismatch")]
    InvalidSignature,

    #[error("Meeting provider error: {0}")]
    Meeting(String),

    #[error("Mail delivery failed: {0}")]
    Mail(String),
}

impl DomainError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn repo(e: impl std::fmt::Display) -> Self {
        DomainError::Repo(e.to_string())
    }
}
