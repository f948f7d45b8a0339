// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image optimiser — prepares the selected page image for OCR submission.
// Optimisation is best effort: any failure degrades to an unmodified copy.

use std::path::{Path, PathBuf};

use scanrelay_core::error::{Result, ScanrelayError};
use tracing::{debug, info, instrument, warn};

use super::processor::ImageProcessor;
use crate::artifacts::ArtifactTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settings {
    max_dimension: u32,
    jpeg_quality: u8,
}

/// Resizes and recompresses images, or copies them when disabled.
#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    settings: Option<Settings>,
}

impl ImageOptimizer {
    pub fn new(max_dimension: u32, jpeg_quality: u8) -> Self {
        Self {
            settings: Some(Settings {
                max_dimension,
                jpeg_quality,
            }),
        }
    }

    /// An optimiser that always takes the copy fallback.
    pub fn copy_only() -> Self {
        Self { settings: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.is_some()
    }

    /// Produce an OCR-ready file next to `image_path` and record it in `tracker`.
    ///
    /// Never fails: if optimisation is unavailable or errors, the source is
    /// copied unchanged; if even the copy fails, the source path itself is
    /// returned.
    #[instrument(skip_all, fields(image = %image_path.display()))]
    pub async fn optimize(&self, image_path: &Path, tracker: &mut ArtifactTracker) -> PathBuf {
        if let Some(settings) = self.settings {
            match optimize_to_jpeg(image_path, settings).await {
                Ok(out) => {
                    tracker.record(&out);
                    return out;
                }
                Err(err) => warn!(error = %err, "optimisation failed — copying original"),
            }
        } else {
            debug!("optimisation disabled — copying original");
        }

        let copy = sibling_path(image_path, "copy", extension_of(image_path));
        match tokio::fs::copy(image_path, &copy).await {
            Ok(_) => {
                tracker.record(&copy);
                copy
            }
            Err(err) => {
                warn!(error = %err, "copy fallback failed — using source image");
                image_path.to_path_buf()
            }
        }
    }
}

async fn optimize_to_jpeg(image_path: &Path, settings: Settings) -> Result<PathBuf> {
    let source = image_path.to_path_buf();
    let target = sibling_path(image_path, "ocr", "jpg");
    let dest = target.clone();

    let written = tokio::task::spawn_blocking(move || -> Result<usize> {
        let bytes = ImageProcessor::open(&source)?
            .fit_within(settings.max_dimension)
            .to_jpeg_bytes(settings.jpeg_quality)?;
        std::fs::write(&dest, &bytes)?;
        Ok(bytes.len())
    })
    .await
    .map_err(|err| ScanrelayError::Optimization(format!("optimisation task failed: {err}")))??;

    info!(output = %target.display(), bytes = written, "image optimised");
    Ok(target)
}

fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("img")
}

/// `<dir>/<stem>_<suffix>.<ext>` next to `path`.
fn sibling_path(path: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());
    path.with_file_name(format!("{stem}_{suffix}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
            .save(path)
            .unwrap();
    }

    #[tokio::test]
    async fn png_is_bounded_and_recompressed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let page = dir.path().join("scan_page-1.png");
        write_png(&page, 300, 150);

        let mut tracker = ArtifactTracker::new();
        let out = ImageOptimizer::new(100, 85).optimize(&page, &mut tracker).await;

        assert_eq!(out, dir.path().join("scan_page-1_ocr.jpg"));
        let img = image::open(&out).unwrap();
        assert_eq!((img.width(), img.height()), (100, 50));
        assert_eq!(tracker.paths(), &[out]);
    }

    #[tokio::test]
    async fn undecodable_image_falls_back_to_copy() {
        let dir = tempfile::tempdir().expect("temp dir");
        let page = dir.path().join("broken.png");
        std::fs::write(&page, b"not really a png").unwrap();

        let mut tracker = ArtifactTracker::new();
        let out = ImageOptimizer::new(100, 85).optimize(&page, &mut tracker).await;

        assert_eq!(out, dir.path().join("broken_copy.png"));
        assert_eq!(std::fs::read(&out).unwrap(), b"not really a png");
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test]
    async fn copy_only_never_decodes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let page = dir.path().join("page.png");
        write_png(&page, 20, 20);

        let mut tracker = ArtifactTracker::new();
        let out = ImageOptimizer::copy_only().optimize(&page, &mut tracker).await;
        assert_eq!(out, dir.path().join("page_copy.png"));
        assert_eq!(std::fs::read(&out).unwrap(), std::fs::read(&page).unwrap());
    }

    #[tokio::test]
    async fn missing_source_returns_source_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let page = dir.path().join("vanished.png");

        let mut tracker = ArtifactTracker::new();
        let out = ImageOptimizer::new(100, 85).optimize(&page, &mut tracker).await;
        assert_eq!(out, page);
        assert!(tracker.is_empty());
    }
}
