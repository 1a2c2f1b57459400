use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use super::AssetUploader;
use crate::models::FilePart;

const MAX_EXTENSION_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid storage folder: {0}")]
    InvalidFolder(String),

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes asset bytes below a root directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalFileUploader {
    root: PathBuf,
}

impl LocalFileUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, folder: &str) -> Result<PathBuf, UploadError> {
        let relative = Path::new(folder);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if folder.is_empty() || !is_plain {
            return Err(UploadError::InvalidFolder(folder.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// Extension for common media types, used when the client name carries none.
fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let ext = match essence.as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "application/pdf" => "pdf",
        _ => return None,
    };
    Some(ext)
}

/// `<uuid>[.<ext>]`, keeping a short alphanumeric extension from the client
/// name, or else one derived from the content type.
pub fn generate_file_name(original: Option<&str>, content_type: Option<&str>) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    let extension = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .or_else(|| {
            content_type
                .and_then(extension_for_content_type)
                .map(str::to_string)
        });

    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

/// Writes `data` to an already created file; on failure the partial file at
/// `path` is removed before the error is returned.
async fn write_or_discard<W>(mut file: W, path: &Path, data: &[u8]) -> Result<(), UploadError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path).await {
            tracing::warn!(
                path = %path.display(),
                error = %cleanup,
                "Failed to remove partially written asset file"
            );
        }
        return Err(UploadError::Io(e));
    }
    Ok(())
}

#[async_trait]
impl AssetUploader for LocalFileUploader {
    async fn upload_file(&self, part: &FilePart, folder: &str) -> Result<String, UploadError> {
        let dir = self.resolve(folder)?;
        fs::create_dir_all(&dir).await?;

        let name = generate_file_name(part.file_name.as_deref(), part.content_type.as_deref());
        let path = dir.join(&name);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => UploadError::AlreadyExists(name.clone()),
                _ => UploadError::Io(e),
            })?;
        write_or_discard(file, &path, &part.data).await?;

        tracing::debug!(path = %path.display(), bytes = part.data.len(), "Stored asset file");
        Ok(name)
    }

    async fn remove_file(&self, folder: &str, name: &str) -> Result<(), UploadError> {
        let dir = self.resolve(folder)?;
        if Path::new(name).components().count() != 1 {
            return Err(UploadError::InvalidFolder(name.to_string()));
        }
        fs::remove_file(dir.join(name)).await?;
        Ok(())
    }
}
