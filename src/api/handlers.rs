use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{HealthResponse, TextForm};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::tts::{artifact, TempArtifact};

const ACCEPTED_EXTENSION: &str = ".txt";

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        voice: state.tts.voice().to_string(),
    })
}

pub async fn convert_text(
    State(state): State<Arc<AppState>>,
    form: TextForm,
) -> Result<Response, AppError> {
    // Validate input
    if form.text.trim().is_empty() {
        return Err(AppError::InvalidInput("Textul nu poate fi gol".into()));
    }

    let artifact = state.tts.speak(&form.text, artifact::DEFAULT_PREFIX).await?;

    audio_response(artifact)
        .await
        .map_err(|e| AppError::Synthesis(e.to_string()))
}

pub async fn convert_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart
        .map_err(|rejection| AppError::Rejected(rejection.status(), rejection.body_text()))?;

    let (filename, content) = read_upload(&mut multipart).await?;

    // Accept only .txt
    if !filename.to_lowercase().ends_with(ACCEPTED_EXTENSION) {
        return Err(AppError::InvalidInput(
            "Doar fisiere .txt sunt acceptate".into(),
        ));
    }

    let text = String::from_utf8(content)
        .map_err(|_| AppError::InvalidInput("Fisierul nu este UTF-8 valid".into()))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput("Fisierul este gol".into()));
    }

    let prefix = artifact::prefix_from_filename(&filename);
    let artifact = state
        .tts
        .speak(text, &prefix)
        .await
        .map_err(AppError::into_processing)?;

    audio_response(artifact)
        .await
        .map_err(|e| AppError::Processing(e.to_string()))
}

/// Pull the `file` part out of the upload. A part without a file name is
/// reported with an empty name so it fails the extension check.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await?;

        return Ok((filename, content.to_vec()));
    }

    Err(AppError::MissingField("file".into()))
}

/// Stream the artifact back as an MP3 download. The artifact is deleted
/// once the body is finished or dropped.
async fn audio_response(artifact: TempArtifact) -> std::io::Result<Response> {
    let disposition = format!("attachment; filename=\"{}\"", artifact.name());
    let (len, stream) = artifact.into_stream().await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact::MEDIA_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
