/// HTML pages and the liveness probe
use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use askama::Template;

use crate::app_state::AppState;
use crate::error::{ErrorPage, PageError};
use crate::middleware::AuthenticatedSession;
use crate::models::format_size;

pub const UPLOAD_PAGE_PATH: &str = "/video-yukle";
const DEFAULT_DISPLAY_NAME: &str = "Kullanıcı";

#[derive(Template)]
#[template(path = "login_success.html")]
struct LoginSuccessTemplate<'a> {
    display_name: &'a str,
}

#[derive(Template)]
#[template(path = "upload.html")]
struct UploadTemplate<'a> {
    display_name: &'a str,
    upload_url: &'a str,
    result_url: &'a str,
    max_upload_bytes: u64,
    max_upload_label: String,
}

#[derive(Template)]
#[template(path = "result.html")]
struct ResultTemplate;

#[derive(Template)]
#[template(path = "privacy.html")]
struct PrivacyTemplate;

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// GET /: only reachable with a session, so straight to the upload form.
pub async fn index() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, UPLOAD_PAGE_PATH))
        .finish()
}

/// GET /video-yukle-basarili
pub async fn login_success(session: AuthenticatedSession) -> Result<HttpResponse, PageError> {
    let display_name = session.0.display_name.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME);
    Ok(html(LoginSuccessTemplate { display_name }.render()?))
}

/// GET /video-yukle
pub async fn upload_page(
    state: web::Data<AppState>,
    session: AuthenticatedSession,
) -> Result<HttpResponse, PageError> {
    let page = UploadTemplate {
        display_name: session.0.display_name.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME),
        upload_url: "/upload-video",
        result_url: "/sonuc",
        max_upload_bytes: state.config.upload.max_upload_bytes,
        max_upload_label: format_size(state.config.upload.max_upload_bytes),
    };
    Ok(html(page.render()?))
}

/// GET /sonuc
pub async fn result_page() -> Result<HttpResponse, PageError> {
    Ok(html(ResultTemplate.render()?))
}

/// GET /gizlilik
pub async fn privacy() -> Result<HttpResponse, PageError> {
    Ok(html(PrivacyTemplate.render()?))
}

pub async fn not_found() -> HttpResponse {
    ErrorPage {
        status_code: 404,
        message: "Sayfa bulunamadı",
    }
    .into_response(StatusCode::NOT_FOUND)
}

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
