//! HTTP error responses
//!
//! Every failure leaves the server as `{"message": ..., "code": ...}` with a
//! status derived from the error kind. Request bodies that fail to parse
//! take the same shape through [`JsonBody`].

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, KeepError};

/// JSON error body shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_PARENT" | "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<KeepError> for HttpError {
    fn from(err: KeepError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(error = %err, "request failed");
        }
        HttpError::new(err.to_string(), kind.as_str())
    }
}

/// `Json` extractor whose rejections are `VALIDATION_ERROR` bodies
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected_body(rejection)),
        }
    }
}

fn rejected_body(rejection: JsonRejection) -> HttpError {
    tracing::debug!(status = %rejection.status(), "rejected request body");
    HttpError::new(rejection.body_text(), ErrorKind::Validation.as_str())
}
