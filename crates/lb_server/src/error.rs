//! Handler errors, rendered as `{name, status, id}` envelopes.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lb_proto::StatusResponse;
use lb_store::StoreError;
use tracing::error;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: StatusCode,
    pub status: String,
    pub name: String,
}

impl ApiError {
    pub fn new(code: StatusCode, status: impl Into<String>) -> Self {
        Self {
            code,
            status: status.into(),
            name: String::new(),
        }
    }

    pub fn bad_request(status: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, status)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Access Denied")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Not Found"),
            StoreError::AlreadyExists(_) => Self::new(StatusCode::CONFLICT, "Already Exists"),
            StoreError::Invalid(msg) => Self::bad_request(msg),
            StoreError::Proto(e) => Self::bad_request(e.to_string()),
            other => {
                error!(error = %other, "store failure");
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Cannot Parse Body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = StatusResponse {
            name: self.name,
            status: self.status,
            id: 0,
        };
        (self.code, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;
