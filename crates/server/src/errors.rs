use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

use crate::render::render_page;

/// A failed web part action: the status to answer with and the notice shown above the table.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PageError {
    pub status: StatusCode,
    pub message: String,
}

impl PageError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn empty_list() -> Self {
        Self::new(StatusCode::NOT_FOUND, "The Claas Intro Source list is empty.")
    }

    /// Page with the error notice; `table` is the previously rendered output, left unchanged.
    pub fn into_page(self, action: &str, table: &str) -> Response {
        if self.status.is_server_error() {
            error!(action, status = %self.status, error = %self.message, "web part action failed");
        } else {
            warn!(action, status = %self.status, error = %self.message, "web part action rejected");
        }
        (self.status, Html(render_page(table, Some(&self.message)))).into_response()
    }
}

impl From<ServiceError> for PageError {
    fn from(e: ServiceError) -> Self {
        let status = match &e {
            ServiceError::Validation(_) | ServiceError::Model(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Transport(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}
