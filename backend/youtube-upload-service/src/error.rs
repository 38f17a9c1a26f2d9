/// Error types for youtube-upload-service
///
/// JSON endpoints answer with `{"basarili": false, "hata": "..."}`, which is
/// the shape the upload page script reads. Page routes wrap errors in
/// [`PageError`] so the browser gets the HTML error page instead.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use askama::Template;
use serde::Serialize;
use std::io;
use thiserror::Error;

use crate::services::oauth::OAuthError;
use crate::services::youtube::YouTubeError;

/// Result type for youtube-upload-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    /// OAuth state missing or tampered with
    #[error("Güvenlik hatası: {0}")]
    Security(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Oturum bulunamadı")]
    Unauthorized,

    #[error("Kimlik doğrulama hatası: {0}")]
    OAuth(#[from] OAuthError),

    #[error("Yükleme hatası: {0}")]
    YouTube(#[from] YouTubeError),

    #[error("Dosya hatası: {0}")]
    Io(#[from] io::Error),

    #[error("Sunucu hatası: {0}")]
    Internal(String),
}

/// Body returned by JSON endpoints on failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "basarili")]
    pub success: bool,
    #[serde(rename = "hata")]
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Security(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::OAuth(_)
            | AppError::YouTube(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        HttpResponse::build(status).json(ErrorResponse::new(self.to_string()))
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Internal(format!("template render failed: {}", err))
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Form okunamadı: {}", err))
    }
}

/// Generic error page used for 404/500 and for failures on HTML routes.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage<'a> {
    pub status_code: u16,
    pub message: &'a str,
}

impl ErrorPage<'_> {
    /// Renders the page, falling back to plain text if the template fails.
    pub fn into_response(self, status: StatusCode) -> HttpResponse {
        match self.render() {
            Ok(body) => HttpResponse::build(status)
                .content_type("text/html; charset=utf-8")
                .body(body),
            Err(err) => {
                tracing::error!("error page render failed: {}", err);
                HttpResponse::build(status)
                    .content_type("text/plain; charset=utf-8")
                    .body(self.message.to_string())
            }
        }
    }
}

/// Wraps an [`AppError`] raised by an HTML route.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct PageError(#[from] pub AppError);

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        self.0.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "page request failed");
        }
        let message = self.0.to_string();
        ErrorPage {
            status_code: status.as_u16(),
            message: &message,
        }
        .into_response(status)
    }
}

impl From<askama::Error> for PageError {
    fn from(err: askama::Error) -> Self {
        PageError(err.into())
    }
}
