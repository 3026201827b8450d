// src/utils/upload.rs

use std::{collections::HashMap, path::Path};

use axum::{body::Bytes, extract::Multipart};

use crate::error::AppError;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Public URL of a stored upload.
pub fn media_url(path: &str) -> String {
    format!("/media/{}", path)
}

/// An uploaded image kept in memory until the rest of the form is accepted.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub extension: String,
    pub bytes: Bytes,
}

/// Text fields of a multipart form plus its file, if any.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<PendingFile>,
}

impl UploadForm {
    /// A text field, with blank values treated as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// A numeric field. Present but malformed values are a 400.
    pub fn number(&self, name: &str) -> Result<Option<i64>, AppError> {
        self.text(name)
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| AppError::BadRequest(format!("{} must be a number", name)))
            })
            .transpose()
    }

    /// Writes the file, if any, under `media_root/subdir` with a random name
    /// and returns its path relative to the media root.
    pub async fn store_file(&self, media_root: &Path, subdir: &str) -> Result<Option<String>, AppError> {
        let Some(file) = &self.file else {
            return Ok(None);
        };

        let dir = media_root.join(subdir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let stored = format!("{}.{}", uuid::Uuid::new_v4(), file.extension);
        tokio::fs::write(dir.join(&stored), &file.bytes)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        tracing::debug!(path = %stored, size = file.bytes.len(), "stored upload");
        Ok(Some(format!("{}/{}", subdir, stored)))
    }
}

fn image_extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&extension.as_str()).then_some(extension)
}

/// Reads a multipart form. The part named `file_field` must be an image and
/// is kept in memory; every other part is read as text.
/// An empty file part counts as no file. Nothing touches the disk here.
pub async fn read_multipart(mut multipart: Multipart, file_field: &str) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name != file_field {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.fields.insert(name, value);
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if bytes.is_empty() {
            continue;
        }

        let extension = image_extension(&file_name)
            .ok_or_else(|| AppError::BadRequest(format!("{} must be an image file", file_field)))?;

        form.file = Some(PendingFile { extension, bytes });
    }

    Ok(form)
}
