//! Local storage for uploaded lecture media.
//!
//! Two directories under the storage root hold the uploads, one for PDF
//! notes and one for video files. Files are written once under a generated
//! unique name and never overwritten; the database stores the
//! root-relative path.

use actix_web::web;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

pub const PDF_DIR: &str = "uploads/pdf";
pub const VIDEO_DIR: &str = "uploads/videos";

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    /// File not found
    NotFound(String),
    /// I/O error
    Io(std::io::Error),
    /// Path escapes the upload directories
    InvalidPath(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::InvalidPath(p) => write!(f, "Invalid media path: {}", p),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

/// Create the upload directories.
/// Panics when the storage root is unusable; there is no degraded mode
/// for a portal whose whole purpose is serving uploaded files.
pub fn init() {
    let root = crate::app_config::storage().local_path;
    for dir in [PDF_DIR, VIDEO_DIR] {
        let path = PathBuf::from(&root).join(dir);
        fs::create_dir_all(&path).expect("failed to create upload directory");
    }
    log::info!("media storage initialized at {}", root);
}

/// Collision-resistant name for a stored upload, e.g. `pdf_3f0e….pdf`.
pub fn unique_media_name(prefix: &str, extension: &str) -> String {
    format!("{}_{}.{}", prefix, Uuid::new_v4().simple(), extension)
}

/// Resolve a database-stored relative path against the storage root.
/// Only paths inside the two upload directories resolve.
pub(crate) fn resolve(relative: &str) -> Result<PathBuf, StorageError> {
    let inside_uploads = relative.starts_with(&format!("{}/", PDF_DIR))
        || relative.starts_with(&format!("{}/", VIDEO_DIR));
    if !inside_uploads || relative.contains("..") {
        return Err(StorageError::InvalidPath(relative.to_owned()));
    }
    Ok(PathBuf::from(crate::app_config::storage().local_path).join(relative))
}

pub async fn store_pdf(data: Vec<u8>, extension: &str) -> Result<String, StorageError> {
    store(PDF_DIR, "pdf", data, extension).await
}

pub async fn store_video(data: Vec<u8>, extension: &str) -> Result<String, StorageError> {
    store(VIDEO_DIR, "video", data, extension).await
}

async fn store(
    dir: &str,
    prefix: &str,
    data: Vec<u8>,
    extension: &str,
) -> Result<String, StorageError> {
    let relative = format!("{}/{}", dir, unique_media_name(prefix, extension));
    let path = resolve(&relative)?;
    log::info!("storing upload at {:?}", path);

    // Use web::block for blocking file operations
    web::block(move || fs::write(&path, data))
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

    Ok(relative)
}

pub fn media_exists(relative: &str) -> bool {
    resolve(relative).map(|path| path.exists()).unwrap_or(false)
}

/// Best-effort unlink of a stored file. A file that is already gone is not
/// an error; anything else is logged for the operator and swallowed, since
/// the database row it backed is already deleted.
pub async fn remove_media(relative: &str) {
    let path = match resolve(relative) {
        Ok(path) => path,
        Err(e) => {
            log::warn!("refusing to delete media: {}", e);
            return;
        }
    };

    let shown = path.clone();
    let result = web::block(move || fs::remove_file(&path)).await;
    match result {
        Ok(Ok(())) => log::info!("deleted media file {:?}", shown),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("media file already missing: {:?}", shown)
        }
        Ok(Err(e)) => log::error!("failed to delete media file {:?}: {}", shown, e),
        Err(e) => log::error!("failed to delete media file {:?}: {}", shown, e),
    }
}
