//! Structured error responses: `{"error": {"kind": ..., "message": ...}}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use socio_core::{Error, ErrorKind};
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Keep the extractor's own status (400, 413, 415) with our body shape.
    fn rejected(status: StatusCode, message: String) -> Self {
        let kind = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "payload_too_large"
        } else {
            "bad_request"
        };
        Self {
            status,
            kind,
            message,
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidRecord => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Crypto
        | ErrorKind::Storage
        | ErrorKind::Config
        | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        Self {
            status: status_for(kind),
            kind: kind.as_str(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(kind = self.kind, error = %self.message, "Request failed");
        } else {
            warn!(kind = self.kind, status = %self.status, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind,
                message: &self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socio_core::{CryptoError, UpstreamError};

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                Error::invalid_record("x", "no ciphertext"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                Error::Upstream(UpstreamError::Network("timeout".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                Error::Crypto(CryptoError::DecryptionFailed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::Storage("disk full".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn bad_request_kind() {
        let err = ApiError::bad_request("No text provided");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, "bad_request");
    }
}
