/// HTTP handlers for youtube-upload-service
///
/// - Auth: login page, Google OAuth start/callback, logout
/// - Pages: upload form, result and privacy pages, health
/// - Uploads: multipart video upload to YouTube
use actix_web::web;

use crate::middleware::RequireSession;

pub mod auth;
pub mod pages;
pub mod uploads;

pub use auth::{login_page, login_start, logout, oauth_callback};
pub use pages::{health, index, login_success, not_found, privacy, result_page, upload_page};
pub use uploads::upload_video;

/// Open routes first; everything else sits behind [`RequireSession`].
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/gizlilik", web::get().to(privacy))
        .service(
            web::resource("/giris")
                .route(web::get().to(login_page))
                .route(web::post().to(login_start)),
        )
        .route("/oauth2callback", web::get().to(oauth_callback))
        .service(
            web::scope("")
                .wrap(RequireSession)
                .route("/", web::get().to(index))
                .route("/video-yukle-basarili", web::get().to(login_success))
                .route("/video-yukle", web::get().to(upload_page))
                .route("/sonuc", web::get().to(result_page))
                .route("/upload-video", web::post().to(upload_video))
                .route("/cikis", web::get().to(logout)),
        )
        .default_service(web::to(not_found));
}
