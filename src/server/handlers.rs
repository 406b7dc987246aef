use super::types::{AnalysisResponse, ReportRequest};
use crate::{
    Error, Result,
    config::Config,
    report::{Report, report_file_name},
    scratch::ScratchFile,
    vision::{ImageData, VisionClient},
};
use axum::{
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use chrono::{Local, Utc};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info};
use uuid::Uuid;

/// Scratch directories for request-scoped files.
#[derive(Debug, Clone)]
pub struct Storage {
    pub upload_dir: PathBuf,
    pub reports_dir: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub vision: Arc<dyn VisionClient>,
    pub storage: Arc<Storage>,
    pub prompt: Arc<str>,
}

impl AppState {
    pub fn new(config: &Config, vision: Arc<dyn VisionClient>) -> Self {
        Self {
            vision,
            storage: Arc::new(Storage {
                upload_dir: config.server.upload_dir.clone(),
                reports_dir: config.server.reports_dir.clone(),
            }),
            prompt: Arc::from(config.llm.prompt.as_str()),
        }
    }
}

#[derive(Debug)]
struct UploadedImage {
    file_name: String,
    mime_type: String,
    bytes: Bytes,
}

pub async fn analyze(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Rejected non-multipart upload: {}", e);
        Error::validation("No image file uploaded")
    })?;
    let upload = read_single_file(&mut multipart).await?;

    info!(
        "Received image {} ({}, {} bytes)",
        upload.file_name,
        upload.mime_type,
        upload.bytes.len()
    );

    // Removed when dropped, whichever way this handler exits
    let scratch = ScratchFile::create(
        &state.storage.upload_dir,
        &Uuid::new_v4().to_string(),
        &upload.bytes,
    )
    .await?;
    let bytes = scratch.read().await?;
    let image = ImageData::from_bytes(upload.mime_type, &bytes);

    let result = state.vision.analyze_image(&state.prompt, &image).await?;
    drop(scratch);

    info!("Analysis complete ({} characters)", result.len());

    Ok(Json(AnalysisResponse {
        result,
        image: image.to_data_uri(),
    }))
}

async fn read_single_file(multipart: &mut Multipart) -> Result<UploadedImage> {
    let mut upload: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| body_error(e.status(), format!("Invalid multipart body: {}", e.body_text())))?
    {
        // Browsers send an empty filename when no file was chosen
        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                debug!("Ignoring form field {:?}", field.name());
                continue;
            }
        };

        if upload.is_some() {
            return Err(Error::validation("Only one image file may be uploaded"));
        }

        let declared = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| body_error(e.status(), format!("Failed to read upload: {}", e.body_text())))?;

        upload = Some(UploadedImage {
            mime_type: resolve_mime_type(declared.as_deref(), &file_name)?,
            file_name,
            bytes,
        });
    }

    let upload = upload.ok_or_else(|| Error::validation("No image file uploaded"))?;
    if upload.bytes.is_empty() {
        return Err(Error::validation("Uploaded image is empty"));
    }
    Ok(upload)
}

/// Maps a body extraction failure to 413 when the body limit was hit and to
/// a validation error otherwise.
fn body_error(status: StatusCode, message: String) -> Error {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        Error::payload_too_large("Request body exceeds the upload size limit")
    } else {
        Error::validation(message)
    }
}

/// Picks the MIME type of an upload: the declared one when it is specific,
/// otherwise a guess from the file extension. Only `image/*` is accepted.
pub fn resolve_mime_type(declared: Option<&str>, file_name: &str) -> Result<String> {
    let declared = declared
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty() && m != "application/octet-stream");

    let mime_type = match declared {
        Some(mime_type) => mime_type,
        None => mime_guess::from_path(file_name)
            .first()
            .map(|m| m.essence_str().to_string())
            .ok_or_else(|| Error::validation("Could not determine the image type"))?,
    };

    if !mime_type.starts_with("image/") {
        return Err(Error::validation(format!(
            "Uploaded file is not an image ({})",
            mime_type
        )));
    }
    Ok(mime_type)
}

pub async fn download(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReportRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| body_error(e.status(), e.body_text()))?;

    info!(
        "Generating report ({} characters, image: {})",
        request.result.len(),
        request.image.is_some()
    );

    let mut report = Report::new(Local::now().date_naive(), request.result);
    if let Some(uri) = request.image.as_deref().filter(|uri| !uri.trim().is_empty()) {
        report = report.with_image(ImageData::parse_data_uri(uri)?.decode()?);
    }

    let pdf = tokio::task::spawn_blocking(move || report.render())
        .await
        .map_err(|e| Error::internal(format!("Report rendering task failed: {}", e)))??;

    let file_name = report_file_name(&Utc::now());
    let scratch = ScratchFile::create(&state.storage.reports_dir, &file_name, &pdf).await?;
    let body = scratch.read().await?;
    drop(scratch);

    info!("Sending report {} ({} bytes)", file_name, body.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    ))
}
