//! Hero image storage on local disk.
//!
//! Files are written under random names and served back from `/uploads/`.
//! A stored URL only ever maps to a bare file name inside the upload
//! directory.

use std::{
  io,
  path::{Path, PathBuf},
};

use folio_core::entry::is_local_upload;
use rand_core::{OsRng, RngCore};
use thiserror::Error;

/// 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const URL_PREFIX: &str = "/uploads/";

#[derive(Debug, Error)]
pub enum UploadError {
  #[error("Unsupported image type: {0:?}")]
  UnsupportedType(String),
  #[error("File too large (limit is {} MiB)", MAX_UPLOAD_BYTES / (1024 * 1024))]
  TooLarge,
  #[error(transparent)]
  Io(#[from] io::Error),
}

/// File extension for an accepted image MIME type.
pub fn extension_for(mime: &str) -> Option<&'static str> {
  match mime {
    "image/jpeg" => Some("jpg"),
    "image/png" => Some("png"),
    "image/webp" => Some("webp"),
    "image/gif" => Some("gif"),
    _ => None,
  }
}

pub struct UploadDir {
  root: PathBuf,
}

impl UploadDir {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Validate and store an image, returning its public URL.
  pub async fn save(&self, mime: &str, bytes: &[u8]) -> Result<String, UploadError> {
    let ext =
      extension_for(mime).ok_or_else(|| UploadError::UnsupportedType(mime.to_owned()))?;
    if bytes.len() > MAX_UPLOAD_BYTES {
      return Err(UploadError::TooLarge);
    }

    let mut id = [0u8; 16];
    OsRng.fill_bytes(&mut id);
    let name = format!("{}.{ext}", hex::encode(id));

    tokio::fs::create_dir_all(&self.root).await?;
    tokio::fs::write(self.root.join(&name), bytes).await?;
    tracing::info!(file = %name, size = bytes.len(), "stored upload");

    Ok(format!("{URL_PREFIX}{name}"))
  }

  /// On-disk location of a local upload URL. `None` for external URLs.
  pub fn path_for(&self, url: &str) -> Option<PathBuf> {
    if !is_local_upload(url) {
      return None;
    }
    let name = Path::new(url.strip_prefix(URL_PREFIX)?).file_name()?;
    Some(self.root.join(name))
  }

  /// Delete the file behind `url` if it is a local upload. Failures are
  /// logged, never returned.
  pub async fn remove(&self, url: &str) {
    let Some(path) = self.path_for(url) else { return };
    if let Err(e) = tokio::fs::remove_file(&path).await {
      tracing::warn!(path = %path.display(), error = %e, "could not remove upload");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn external_urls_have_no_path() {
    let dir = UploadDir::new("/srv/uploads");
    assert_eq!(dir.path_for("https://cdn.test/a.png"), None);
    assert_eq!(dir.path_for(""), None);
    assert_eq!(
      dir.path_for("/uploads/abc.png"),
      Some(PathBuf::from("/srv/uploads/abc.png"))
    );
  }

  #[test]
  fn traversal_collapses_to_file_name() {
    let dir = UploadDir::new("/srv/uploads");
    assert_eq!(
      dir.path_for("/uploads/../../etc/passwd"),
      Some(PathBuf::from("/srv/uploads/passwd"))
    );
  }

  #[tokio::test]
  async fn save_and_remove() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = UploadDir::new(tmp.path());

    let url = dir.save("image/webp", b"RIFF0000WEBP").await.unwrap();
    assert!(url.starts_with("/uploads/") && url.ends_with(".webp"), "{url}");
    let path = dir.path_for(&url).unwrap();
    assert!(path.exists());

    dir.remove(&url).await;
    assert!(!path.exists());
    // Removing again only logs.
    dir.remove(&url).await;
  }

  #[tokio::test]
  async fn rejects_bad_type_and_size() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = UploadDir::new(tmp.path());

    assert!(matches!(
      dir.save("image/svg+xml", b"<svg/>").await,
      Err(UploadError::UnsupportedType(_))
    ));
    let big = vec![0u8; MAX_UPLOAD_BYTES + 1];
    assert!(matches!(dir.save("image/png", &big).await, Err(UploadError::TooLarge)));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
  }
}
