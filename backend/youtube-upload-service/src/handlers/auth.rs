/// Login, OAuth callback and logout
use actix_web::http::header::LOCATION;
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::error::{AppError, PageError};
use crate::middleware::{AuthenticatedSession, LOGIN_PATH};
use crate::services::oauth::generate_state_token;

pub const LOGIN_SUCCESS_PATH: &str = "/video-yukle-basarili";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

/// GET /giris
pub async fn login_page() -> Result<HttpResponse, PageError> {
    let body = LoginTemplate.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// POST /giris: store a fresh state token and send the browser to Google.
pub async fn login_start(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, PageError> {
    let session = state.sessions.load_or_create(&req);
    let oauth_state = generate_state_token();

    state
        .sessions
        .update(session.id, |s| s.oauth_state = Some(oauth_state.clone()))
        .ok_or_else(|| AppError::Internal("session vanished during login".to_string()))?;

    tracing::info!(session_id = %session.id, "starting Google OAuth flow");

    Ok(HttpResponse::SeeOther()
        .cookie(state.sessions.session_cookie(session.id))
        .insert_header((LOCATION, state.oauth.authorization_url(&oauth_state)))
        .finish())
}

/// GET /oauth2callback
pub async fn oauth_callback(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<CallbackQuery>,
) -> Result<HttpResponse, PageError> {
    let query = query.into_inner();

    let session = state
        .sessions
        .load_from_request(&req)
        .ok_or_else(|| AppError::Security("Oturum bulunamadı".to_string()))?;
    let expected = session
        .oauth_state
        .as_deref()
        .ok_or_else(|| AppError::Security("State bulunamadı".to_string()))?;

    if query.state.as_deref() != Some(expected) {
        tracing::warn!(session_id = %session.id, "OAuth state mismatch");
        return Err(AppError::Security("State eşleşmiyor".to_string()).into());
    }

    if let Some(error) = query.error {
        return Err(AppError::BadRequest(format!("Google yetkilendirmesi reddedildi: {}", error)).into());
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Yetkilendirme kodu eksik".to_string()))?;

    let credentials = state.oauth.exchange_code(&code).await.map_err(AppError::from)?;

    let display_name = match state.youtube.channel_title(&credentials.access_token).await {
        Ok(name) => name,
        Err(err) => {
            tracing::warn!(session_id = %session.id, error = %err, "channel lookup failed");
            None
        }
    };

    let signed_in = state
        .sessions
        .sign_in(session.id, credentials, display_name)
        .ok_or_else(|| AppError::Security("Oturum bulunamadı".to_string()))?;

    tracing::info!(session_id = %signed_in.id, "user signed in");

    Ok(HttpResponse::SeeOther()
        .cookie(state.sessions.session_cookie(signed_in.id))
        .insert_header((LOCATION, LOGIN_SUCCESS_PATH))
        .finish())
}

/// GET /cikis
pub async fn logout(state: web::Data<AppState>, session: AuthenticatedSession) -> HttpResponse {
    state.sessions.destroy(session.0.id);
    tracing::info!(session_id = %session.0.id, "user signed out");

    HttpResponse::SeeOther()
        .cookie(state.sessions.removal_cookie())
        .insert_header((LOCATION, LOGIN_PATH))
        .finish()
}
