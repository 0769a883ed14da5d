//! HTTP mapping of dispatch failures
//!
//! Usage faults become 400 with a JSON:API style error document naming the
//! problem. Provider faults are logged and surfaced as an opaque 500; their
//! messages can carry upstream details that are for operators, not clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use provider::FaultKind;
use tracing::error;

/// `{"errors":[{"status":<code>,"title":"<title>"}]}`
pub fn error_document(status: StatusCode, title: &str) -> Response {
    let body = serde_json::json!({
        "errors": [{
            "status": status.as_u16(),
            "title": title,
        }]
    });
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

/// A dispatch error on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub provider::Error);

impl From<provider::Error> for ApiError {
    fn from(err: provider::Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            FaultKind::Usage => StatusCode::BAD_REQUEST,
            FaultKind::Provider => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.0.kind() {
            FaultKind::Usage => error_document(status, &self.0.to_string()),
            FaultKind::Provider => {
                error!(error = %self.0, "login step failed");
                error_document(status, "Internal Server Error")
            }
        }
    }
}
