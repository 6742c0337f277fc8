use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Request-scoped failure of one of the relays
#[derive(Error, Debug)]
pub enum RelayError {
    /// Client input missing or malformed; detected before any outbound call
    #[error("{0}")]
    Validation(String),

    /// Network-level failure talking to an upstream (timeout, refused, reset)
    #[error("Upstream request failed: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {status}")]
    UpstreamStatus { status: u16, body: Value },

    #[error("Upstream returned non-JSON")]
    NonJson,

    /// Translation collaborator failed for any reason
    #[error("Translation failed: {0}")]
    Translation(String),
}

impl RelayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Transport(_) | Self::NonJson | Self::Translation(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::UpstreamStatus { body, .. } => json!({ "error": body }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Startup failure; the gateway must not accept requests
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {0} in environment or .env")]
    MissingSecret(&'static str),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = RelayError::validation("Missing audio file");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing audio file");
    }

    #[test]
    fn test_upstream_status_is_relayed() {
        let err = RelayError::UpstreamStatus {
            status: 429,
            body: json!({"detail": "quota"}),
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_invalid_upstream_status_falls_back_to_bad_gateway() {
        let err = RelayError::UpstreamStatus {
            status: 1000,
            body: Value::Null,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_transport_and_parse_failures_are_bad_gateway() {
        assert_eq!(
            RelayError::Transport("connection refused".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(RelayError::NonJson.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            RelayError::NonJson.to_string(),
            "Upstream returned non-JSON"
        );
    }
}
