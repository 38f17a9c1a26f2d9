/// YouTube Upload Service - HTTP Server
///
/// Serves the login and upload pages and forwards uploaded videos to YouTube.
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use youtube_upload_service::handlers;
use youtube_upload_service::session::SessionStore;
use youtube_upload_service::{AppState, Config};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    let bind_address = config.bind_address();

    tracing::info!("Starting youtube-upload-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let state = AppState::from_config(config).context("failed to build HTTP client")?;
    state.temp_storage.ensure_dir().await.with_context(|| {
        format!(
            "failed to create upload directory {}",
            state.temp_storage.dir().display()
        )
    })?;

    spawn_session_sweeper(state.sessions.clone());

    let data = web::Data::new(state);

    tracing::info!("HTTP server listening on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .run()
    .await?;

    tracing::info!("youtube-upload-service shutting down");
    Ok(())
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(json.then(|| fmt::layer().json().with_current_span(true)))
        .with((!json).then(fmt::layer))
        .init();
}

fn spawn_session_sweeper(sessions: Arc<SessionStore>) {
    actix_rt::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = sessions.len(), "expired sessions purged");
            }
        }
    });
}
