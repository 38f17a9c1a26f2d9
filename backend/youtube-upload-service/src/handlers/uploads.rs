/// Upload handler - POST /upload-video
///
/// Reads the multipart form sent by the upload page, streams the video to a
/// temporary file and hands it to [`UploadService`](crate::services::UploadService).
/// The extension is checked before a single byte reaches the disk, and the
/// file is owned by a [`TempFile`] guard from the moment its path exists.
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedSession;
use crate::models::{
    format_size, parse_tags, RequestedKind, UploadForm, VideoContainer, Visibility,
    DEFAULT_DESCRIPTION, DEFAULT_TITLE,
};
use crate::services::oauth::OAuthError;
use crate::services::temp_storage::{TempFile, TempStorage};
use crate::session::Session;

pub const FILE_FIELD: &str = "video_dosyasi";
pub const TITLE_FIELD: &str = "video_baslik";
pub const DESCRIPTION_FIELD: &str = "video_aciklamasi";
pub const TAGS_FIELD: &str = "video_taglari";
pub const VISIBILITY_FIELD: &str = "gizlilik_secenegi";
pub const KIND_FIELD: &str = "video_tipi";

/// Upper bound for any single text field.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

struct ReceivedFile {
    file: TempFile,
    original_filename: String,
    container: VideoContainer,
}

#[derive(Default)]
struct TextFields {
    title: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    visibility: Option<String>,
    kind: Option<String>,
}

impl TextFields {
    fn into_form(self, file: ReceivedFile) -> UploadForm {
        UploadForm {
            file: file.file,
            original_filename: file.original_filename,
            container: file.container,
            title: non_blank(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: non_blank(self.description)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            tags: self.tags.as_deref().map(parse_tags).unwrap_or_default(),
            visibility: Visibility::normalize(self.visibility.as_deref()),
            requested_kind: RequestedKind::parse(self.kind.as_deref()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /upload-video
pub async fn upload_video(
    state: web::Data<AppState>,
    session: AuthenticatedSession,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = receive_upload(
        &state.temp_storage,
        state.config.upload.max_upload_bytes,
        payload,
    )
    .await?;

    tracing::info!(
        session_id = %session.0.id,
        file = %form.original_filename,
        "upload received"
    );

    let access_token = match fresh_access_token(&state, &session.0).await {
        Ok(token) => token,
        Err(err) => {
            form.file.remove().await;
            return Err(err);
        }
    };

    let response = state.uploads.publish(&access_token, form).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Drain the multipart stream into an [`UploadForm`]. On any error the
/// partially written file is removed before returning; if the stream is
/// abandoned the guard removes it on drop.
async fn receive_upload(
    storage: &TempStorage,
    max_bytes: u64,
    mut payload: Multipart,
) -> Result<UploadForm> {
    let mut file = None;
    let mut text = TextFields::default();

    let outcome = read_fields(&mut payload, storage, max_bytes, &mut file, &mut text).await;

    match (outcome, file) {
        (Ok(()), Some(file)) => Ok(text.into_form(file)),
        (Ok(()), None) => Err(AppError::BadRequest("Video dosyası bulunamadı".to_string())),
        (Err(err), file) => {
            if let Some(received) = file {
                received.file.remove().await;
            }
            Err(err)
        }
    }
}

async fn read_fields(
    payload: &mut Multipart,
    storage: &TempStorage,
    max_bytes: u64,
    file: &mut Option<ReceivedFile>,
    text: &mut TextFields,
) -> Result<()> {
    while let Some(field) = payload.next().await {
        let mut field = field?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            FILE_FIELD if file.is_none() => {
                *file = Some(receive_file(&mut field, storage, max_bytes).await?);
            }
            TITLE_FIELD => text.title = Some(read_text(&mut field).await?),
            DESCRIPTION_FIELD => text.description = Some(read_text(&mut field).await?),
            TAGS_FIELD => text.tags = Some(read_text(&mut field).await?),
            VISIBILITY_FIELD => text.visibility = Some(read_text(&mut field).await?),
            KIND_FIELD => text.kind = Some(read_text(&mut field).await?),
            _ => drain(&mut field).await?,
        }
    }
    Ok(())
}

async fn receive_file(
    field: &mut Field,
    storage: &TempStorage,
    max_bytes: u64,
) -> Result<ReceivedFile> {
    let original_filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(str::to_string)
        .unwrap_or_default();

    if original_filename.trim().is_empty() {
        return Err(AppError::BadRequest("Dosya seçilmedi".to_string()));
    }

    let container = VideoContainer::from_filename(&original_filename).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Desteklenmeyen dosya türü. İzin verilenler: {}",
            VideoContainer::allowed_list()
        ))
    })?;

    let file = TempFile::new(storage.allocate(&original_filename));
    match write_to_disk(field, file.path(), max_bytes).await {
        Ok(size) => {
            tracing::debug!(path = %file.path().display(), size, "video written to temporary file");
            Ok(ReceivedFile {
                file,
                original_filename,
                container,
            })
        }
        Err(err) => {
            file.remove().await;
            Err(err)
        }
    }
}

async fn write_to_disk(field: &mut Field, path: &Path, max_bytes: u64) -> Result<u64> {
    let mut out = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        if written > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Dosya çok büyük. En fazla {} olabilir",
                format_size(max_bytes)
            )));
        }
        out.write_all(&chunk).await?;
    }

    out.flush().await?;
    Ok(written)
}

async fn read_text(field: &mut Field) -> Result<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::BadRequest("Form alanı çok uzun".to_string()));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| AppError::BadRequest("Form alanı UTF-8 değil".to_string()))
}

async fn drain(field: &mut Field) -> Result<()> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}

/// Access token for the upload, refreshed first when it is about to expire.
async fn fresh_access_token(state: &AppState, session: &Session) -> Result<String> {
    let credentials = session.credentials.as_ref().ok_or(AppError::Unauthorized)?;

    if !credentials.is_expired_at(Utc::now()) {
        return Ok(credentials.access_token.clone());
    }
    if !credentials.can_refresh() {
        return Err(OAuthError::MissingRefreshToken.into());
    }

    let refreshed = state.oauth.refresh(credentials).await?;
    let access_token = refreshed.access_token.clone();
    state
        .sessions
        .update(session.id, |s| s.credentials = Some(refreshed));

    tracing::info!(session_id = %session.id, "access token refreshed");
    Ok(access_token)
}
