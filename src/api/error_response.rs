//! HTTP error response handling for the API
//!
//! Errors are answered in plain text, one line per body. Server-side
//! failures only expose the canonical reason phrase; details go to the log.

use crate::error::{Error, ToHttpStatus};
use axum::{
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Header carrying the machine-readable error code
pub const ERROR_CODE_HEADER: HeaderName = HeaderName::from_static("x-error-code");

/// Build a `text/plain` response whose body is `message` plus a newline
pub fn plain_text(status: StatusCode, message: impl AsRef<str>) -> Response {
    let body = format!("{}\n", message.as_ref());
    (
        status,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        body,
    )
        .into_response()
}

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            match &self {
                Error::BadRequest(message) => message.clone(),
                other => other.to_string(),
            }
        };

        let mut response = plain_text(status, message);
        if let Ok(code) = HeaderValue::from_str(self.error_code()) {
            response.headers_mut().insert(ERROR_CODE_HEADER, code);
        }
        response
    }
}
