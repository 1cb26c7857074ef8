use bytes::Bytes;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];
pub const PUBLIC_PREFIX: &str = "/uploads";
const RESUME_SUBDIR: &str = "resumes";

const PDF_MAGIC: &[u8] = b"%PDF";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// A résumé file received from a multipart form.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub data: Bytes,
}

impl ResumeUpload {
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default()
    }
}

/// Checks size, extension and content signature. Returns the extension the
/// file will be stored under.
pub fn check_resume(upload: &ResumeUpload) -> Result<String> {
    if upload.data.is_empty() {
        return Err(Error::BadRequest("Résumé file is empty".to_string()));
    }
    if upload.data.len() > MAX_RESUME_BYTES {
        return Err(Error::PayloadTooLarge(format!(
            "Résumé must be at most {} MB",
            MAX_RESUME_BYTES / (1024 * 1024)
        )));
    }
    let extension = upload.extension();
    let magic = match extension.as_str() {
        "pdf" => PDF_MAGIC,
        "doc" => OLE_MAGIC,
        "docx" => ZIP_MAGIC,
        _ => {
            return Err(Error::BadRequest(format!(
                "File type not allowed. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )))
        }
    };
    if !upload.data.starts_with(magic) {
        return Err(Error::BadRequest(format!(
            "File content does not match the .{} extension",
            extension
        )));
    }
    Ok(extension)
}

#[derive(Clone)]
pub struct ResumeService {
    root: PathBuf,
}

impl ResumeService {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: uploads_dir.into(),
        }
    }

    /// Writes the file under a fresh name and returns its public URL.
    pub async fn save(&self, upload: &ResumeUpload) -> Result<String> {
        let extension = check_resume(upload)?;
        let dir = self.root.join(RESUME_SUBDIR);
        tokio::fs::create_dir_all(&dir).await?;
        let saved_filename = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(dir.join(&saved_filename), &upload.data).await?;
        tracing::info!(file = %saved_filename, bytes = upload.data.len(), "résumé stored");
        Ok(format!("{}/{}/{}", PUBLIC_PREFIX, RESUME_SUBDIR, saved_filename))
    }

    /// Deletes a file previously returned by `save`. Failures are logged and
    /// swallowed; URLs outside the résumé directory are ignored.
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.local_path(url) else {
            tracing::warn!(%url, "not a stored résumé, leaving it");
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!(%url, "résumé removed"),
            Err(e) => tracing::warn!(%url, error = %e, "failed to remove résumé"),
        }
    }

    fn local_path(&self, url: &str) -> Option<PathBuf> {
        let name = url
            .strip_prefix(PUBLIC_PREFIX)?
            .strip_prefix('/')?
            .strip_prefix(RESUME_SUBDIR)?
            .strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(self.root.join(RESUME_SUBDIR).join(name))
    }
}
