use serde::Serialize;
use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;

use crate::api::models::ErrorBody;

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn error(status: StatusCode, kind: &str, message: String) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message,
            kind: kind.to_string(),
            status_code: status.as_u16(),
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}
