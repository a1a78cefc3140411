//! Best-effort helpers the correlator leans on for ranked inputs.
//!
//! Neither is allowed to fail a correlation: a missing capture time is
//! simply absent and a failed preview is only logged.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use image::imageops::FilterType;
use image::{ImageDecoder, ImageFormat, ImageReader};
use lapse_db::models::Item;

/// Default edge length of generated previews, in pixels.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 128;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preview task failed: {0}")]
    Task(String),
}

/// Produces a small preview of an item's image.
#[async_trait]
pub trait ThumbnailService: Send + Sync {
    /// Render a preview of `source` for `item`, returning where it was written.
    async fn generate(&self, item: &Item, source: &Path) -> Result<PathBuf, ThumbnailError>;
}

/// Reads the capture time of an image.
#[async_trait]
pub trait TakenDateExtractor: Send + Sync {
    async fn taken_at(&self, source: &Path) -> Option<NaiveDateTime>;
}

/// Square, centre-cropped JPEG previews written next to the source file.
#[derive(Debug, Clone)]
pub struct ImageThumbnailer {
    size: u32,
}

impl ImageThumbnailer {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    /// `<dir>/<stem>.preview.jpg` beside `source`.
    pub fn preview_path(source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "item".to_string());
        source.with_file_name(format!("{stem}.preview.jpg"))
    }

    fn render(source: &Path, size: u32) -> Result<PathBuf, ThumbnailError> {
        let target = Self::preview_path(source);
        let preview = image::open(source)?
            .resize_to_fill(size, size, FilterType::Triangle)
            .to_rgb8();
        preview.save_with_format(&target, ImageFormat::Jpeg)?;
        Ok(target)
    }
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_SIZE)
    }
}

#[async_trait]
impl ThumbnailService for ImageThumbnailer {
    async fn generate(&self, item: &Item, source: &Path) -> Result<PathBuf, ThumbnailError> {
        let source = source.to_path_buf();
        let size = self.size;
        let target = tokio::task::spawn_blocking(move || Self::render(&source, size))
            .await
            .map_err(|e| ThumbnailError::Task(e.to_string()))??;

        tracing::debug!(
            item_id = %item.id,
            preview = %target.display(),
            size,
            "Preview generated",
        );
        Ok(target)
    }
}

/// Reads EXIF `DateTimeOriginal` through the image decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifDateExtractor;

impl ExifDateExtractor {
    fn read(source: &Path) -> Option<NaiveDateTime> {
        let mut decoder = ImageReader::open(source)
            .ok()?
            .with_guessed_format()
            .ok()?
            .into_decoder()
            .ok()?;
        let raw = decoder.exif_metadata().ok()??;
        lapse_core::exif::date_time_original(&raw)
    }
}

#[async_trait]
impl TakenDateExtractor for ExifDateExtractor {
    async fn taken_at(&self, source: &Path) -> Option<NaiveDateTime> {
        let source = source.to_path_buf();
        match tokio::task::spawn_blocking(move || Self::read(&source)).await {
            Ok(taken_at) => taken_at,
            Err(e) => {
                tracing::warn!(error = %e, "Capture time extraction task failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use image::{Rgb, RgbImage};

    use super::*;

    fn item() -> Item {
        Item {
            id: uuid::Uuid::now_v7(),
            folder_id: uuid::Uuid::now_v7(),
            name: "00001_scan.png".into(),
            original_name: Some("scan.png".into()),
            taken_at: None,
            is_series: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn preview_sits_next_to_source() {
        assert_eq!(
            ImageThumbnailer::preview_path(Path::new("/store/ab/scan.png")),
            PathBuf::from("/store/ab/scan.preview.jpg")
        );
    }

    #[tokio::test]
    async fn renders_square_preview() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("wide.png");
        RgbImage::from_pixel(300, 150, Rgb([200, 10, 10]))
            .save(&source)
            .unwrap();

        let written = ImageThumbnailer::default()
            .generate(&item(), &source)
            .await
            .unwrap();

        let preview = image::open(&written).unwrap();
        assert_eq!((preview.width(), preview.height()), (128, 128));
    }

    #[tokio::test]
    async fn undecodable_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.png");
        std::fs::write(&source, b"not an image").unwrap();

        let result = ImageThumbnailer::default().generate(&item(), &source).await;
        assert_matches!(result, Err(ThumbnailError::Image(_)));
    }

    #[tokio::test]
    async fn missing_exif_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plain.png");
        RgbImage::new(4, 4).save(&source).unwrap();

        assert_eq!(ExifDateExtractor.taken_at(&source).await, None);
        assert_eq!(ExifDateExtractor.taken_at(&dir.path().join("nope.jpg")).await, None);
    }
}
