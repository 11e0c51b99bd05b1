// HTTP API error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::domain::{DomainError, ErrorKind};

/// HTTP API error with a status code and a client-safe message.
#[derive(Debug)]
pub enum ApiError {
    // 401 Unauthorized
    Unauthorized(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // Status and code follow the error kind
    Domain(DomainError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Domain(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Client-safe message. Internal failures never describe their cause.
    pub fn message(&self) -> String {
        match self {
            ApiError::Unauthorized(msg) | ApiError::InternalServerError(msg) => msg.clone(),
            ApiError::Domain(DomainError::Internal) => "Internal server error".to_string(),
            ApiError::Domain(err) => err.to_string(),
        }
    }

    /// Error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::Domain(err) => err.code(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": {
                "code": self.error_code(),
                "message": self.message(),
            }
        })
    }
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entity;

    #[test]
    fn domain_errors_map_by_kind() {
        let cases = [
            (DomainError::NotFound(Entity::Course), StatusCode::NOT_FOUND),
            (DomainError::CourseReference, StatusCode::NOT_FOUND),
            (DomainError::PositionCourseUsed, StatusCode::CONFLICT),
            (DomainError::EmailAlreadyExists, StatusCode::CONFLICT),
            (DomainError::LessonNameNotEmpty, StatusCode::BAD_REQUEST),
            (DomainError::MissingField("email"), StatusCode::BAD_REQUEST),
            (DomainError::Unauthorized, StatusCode::UNAUTHORIZED),
            (DomainError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err.clone()).status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn envelope_carries_code_and_message() {
        let body = ApiError::from(DomainError::PositionCourseUsed).to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "POSITION_COURSE_USED");
        assert_eq!(body["error"]["message"], "course already assigned to position");
    }

    #[test]
    fn transport_errors_keep_their_message() {
        let err = ApiError::unauthorized("Missing Authorization header");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_json()["error"]["message"], "Missing Authorization header");

        let err = ApiError::internal_server_error("Failed to serialize response data");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn internal_message_is_generic() {
        let err = ApiError::from(DomainError::Internal);
        assert_eq!(err.message(), "Internal server error");
        assert_eq!(err.error_code(), "INTERNAL");
    }
}
