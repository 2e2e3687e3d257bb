use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::db::StoreError;
use crate::views;

/// Errors that end a request with an error page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("invalid multipart request: {0}")]
    MultipartRequest(#[from] MultipartRejection),

    #[error("invalid form body: {0}")]
    Form(#[from] FormRejection),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(_) | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Multipart(e) => e.status(),
            AppError::MultipartRequest(e) => e.status(),
            AppError::Form(e) => e.status(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Rejected request body");
        }
        (status, Html(views::error_page(status))).into_response()
    }
}
