// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — bounded resize and JPEG recompression of page images.
// Operates on in-memory images using the `image` crate.

use std::path::Path;

use image::DynamicImage;
use scanrelay_core::error::ScanrelayError;
use tracing::{debug, info, instrument};

/// Processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, enabling
/// method chaining:
///
/// ```ignore
/// let jpeg = ImageProcessor::open("scan_page-1.png")?
///     .fit_within(4096)
///     .to_jpeg_bytes(90)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanrelayError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ScanrelayError::Optimization(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Transformations ------------------------------------------------------

    /// Downscale so neither side exceeds `max_side`, preserving aspect ratio.
    /// Images already inside the bound are returned untouched; nothing is
    /// ever upscaled.
    #[instrument(skip(self))]
    pub fn fit_within(self, max_side: u32) -> Self {
        if self.image.width() <= max_side && self.image.height() <= max_side {
            return self;
        }
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            max_side,
            "Resizing image"
        );
        let resized = self
            .image
            .resize(max_side, max_side, image::imageops::FilterType::Lanczos3);
        debug!(new_w = resized.width(), new_h = resized.height(), "Resize complete");
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, ScanrelayError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder).map_err(|err| {
            ScanrelayError::Optimization(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }
}
