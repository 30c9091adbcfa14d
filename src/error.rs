use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised while signing or verifying a URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignError {
    #[error("only absolute urls can be signed: {0}")]
    InvalidReference(String),

    #[error("signature is a reserved query parameter")]
    ReservedParameterConflict,
}

/// Errors raised while loading the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SIGNING_KEY is not set")]
    MissingKey,

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid DEFAULT_TTL: {0}")]
    InvalidTtl(String),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Outcome of a request the access gate refused.
///
/// Every refusal caused by the link itself collapses into `Forbidden`, so a
/// client cannot tell which check failed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GateRejection {
    #[error("403 Forbidden")]
    Forbidden,

    #[error("Internal Server Error")]
    Internal,
}

impl GateRejection {
    pub fn status(self) -> StatusCode {
        match self {
            GateRejection::Forbidden => StatusCode::FORBIDDEN,
            GateRejection::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
