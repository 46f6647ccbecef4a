use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;
use crate::parser::Section;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Model endpoint {endpoint} failed: {detail}")]
    Model { endpoint: String, detail: String },

    #[error("Model response is missing the {section} section")]
    Format { section: Section },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl AppError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn model(endpoint: impl Into<String>, detail: impl ToString) -> Self {
        AppError::Model {
            endpoint: endpoint.into(),
            detail: detail.to_string(),
        }
    }

    /// Short machine-readable name used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Fetch { .. } => "fetch",
            AppError::Model { .. } => "model",
            AppError::Format { .. } => "format",
            AppError::Config(_) => "config",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Timeout(_) => "timeout",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Fetch { .. } => StatusCode::BAD_GATEWAY,
            AppError::Model { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Format { .. } => StatusCode::BAD_GATEWAY,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        response::error(self.status_code(), self.kind(), self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_failure_kind_has_its_own_status() {
        let cases = [
            (AppError::fetch("https://a.test", "dns"), StatusCode::BAD_GATEWAY, "fetch"),
            (AppError::model("http://m", "refused"), StatusCode::SERVICE_UNAVAILABLE, "model"),
            (AppError::Format { section: Section::Title }, StatusCode::BAD_GATEWAY, "format"),
            (AppError::Config("bad".into()), StatusCode::INTERNAL_SERVER_ERROR, "config"),
            (AppError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST, "invalid_request"),
            (AppError::Timeout(Duration::from_secs(5)), StatusCode::GATEWAY_TIMEOUT, "timeout"),
        ];

        for (err, status, kind) in cases {
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn messages_name_the_failing_party() {
        let err = AppError::fetch("https://a.test/page", "connection reset");
        assert_eq!(err.to_string(), "Failed to fetch https://a.test/page: connection reset");

        let err = AppError::Format { section: Section::Summary };
        assert_eq!(err.to_string(), "Model response is missing the SUMMARY section");

        let err = AppError::Timeout(Duration::from_secs(90));
        assert_eq!(err.to_string(), "Request timed out after 90s");
    }
}
