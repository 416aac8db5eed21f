use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// The thin ingress's only error surface: a validation failure (400), a
/// missing resource (404), or an internal failure worth logging but not
/// worth detailing to the caller (500).
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "INVALID_REQUEST"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::Internal(msg) => {
                tracing::error!(target: "http", error = %msg, "internal error handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": { "code": code, "message": message } })),
        )
            .into_response()
    }
}
