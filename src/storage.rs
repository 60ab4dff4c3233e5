// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for captured photos

use crate::errors::AppError;
use crate::sequencer::CapturedFrame;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default folder name for saved captures
const DEFAULT_SAVE_FOLDER: &str = "SkinCam";

/// Default photo directory (`~/Pictures/SkinCam`)
pub fn default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}

/// Save a captured frame to a timestamped file in `output_dir`
pub async fn save_capture(frame: &CapturedFrame, output_dir: &Path) -> Result<PathBuf, AppError> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filepath = output_dir.join(format!("IMG_{}.jpg", timestamp));

    let data = std::sync::Arc::clone(&frame.jpeg);
    let dir = output_dir.to_path_buf();
    let path_clone = filepath.clone();
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&path_clone, &data)
    })
    .await
    .map_err(|e| AppError::Storage(format!("save task error: {}", e)))??;

    info!(path = %filepath.display(), "Photo saved");
    Ok(filepath)
}

/// Find the most recently modified JPEG in `photos_dir`.
///
/// Used to restore the thumbnail on startup. Returns the path and the file
/// contents, or `None` when the directory is empty or unreadable.
pub async fn latest_capture(photos_dir: PathBuf) -> Option<(PathBuf, Vec<u8>)> {
    let entries = tokio::task::spawn_blocking(move || {
        let mut files = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&photos_dir) {
            for entry in entries.flatten() {
                if is_jpeg(&entry.path()) {
                    files.push(entry);
                }
            }
        }
        files.sort_by_key(|e| {
            e.metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(std::cmp::Reverse)
        });
        files.first().map(|e| e.path())
    })
    .await
    .ok()?;

    let latest_path = entries?;
    debug!(path = ?latest_path, "Loading latest capture");

    let bytes = tokio::fs::read(&latest_path).await.ok()?;
    Some((latest_path, bytes))
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_capture_finds_newest_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("IMG_20250101_000000.jpg");
        let new = dir.path().join("IMG_20250601_000000.jpg");
        std::fs::write(&old, b"old").unwrap();
        std::fs::write(&new, b"new").unwrap();

        // Make the modification times distinct
        let earlier = std::time::SystemTime::now() - std::time::Duration::from_secs(60);
        let file = std::fs::File::options().write(true).open(&old).unwrap();
        file.set_modified(earlier).unwrap();

        let (path, bytes) = latest_capture(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(path, new);
        assert_eq!(bytes, b"new");
    }

    #[tokio::test]
    async fn test_save_capture_writes_timestamped_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let frame = CapturedFrame {
            jpeg: std::sync::Arc::from(vec![0xFF, 0xD8, 0xFF, 0xD9].into_boxed_slice()),
            width: 640,
            height: 480,
            mirrored: false,
        };

        let path = save_capture(&frame, dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("IMG_") && name.ends_with(".jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), frame.jpeg.as_ref());
    }

    #[tokio::test]
    async fn test_latest_capture_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        assert!(latest_capture(dir.path().to_path_buf()).await.is_none());
    }
}
