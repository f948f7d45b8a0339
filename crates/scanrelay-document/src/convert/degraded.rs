// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Degraded conversion — used when no page rasteriser is installed. The
// `image` crate has no PDF decoder, so for real PDFs this is a soft failure
// that hands control to passthrough. It stays in the chain so that a decoder
// registered with `image` later is picked up without touching the chain.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scanrelay_core::error::{Result, ScanrelayError};
use tracing::{info, instrument};

use super::{ConversionStrategy, ConvertOptions};

pub struct DegradedStrategy;

#[async_trait]
impl ConversionStrategy for DegradedStrategy {
    fn name(&self) -> &'static str {
        "degraded"
    }

    #[instrument(skip_all, fields(pdf = %pdf_path.display()))]
    async fn convert(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        _options: &ConvertOptions,
    ) -> Result<Vec<PathBuf>> {
        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());
        let target = output_dir.join(format!("{stem}_degraded-1.png"));

        let source = pdf_path.to_path_buf();
        let dest = target.clone();
        let decoded = tokio::task::spawn_blocking(move || -> Result<()> {
            let img = image::open(&source).map_err(|err| {
                ScanrelayError::Conversion(format!(
                    "image library cannot decode PDF pages: {err}"
                ))
            })?;
            img.save(&dest).map_err(|err| {
                ScanrelayError::Conversion(format!("failed to save {}: {err}", dest.display()))
            })
        })
        .await
        .map_err(|err| ScanrelayError::Conversion(format!("decode task failed: {err}")))?;

        decoded?;
        info!(output = %target.display(), "first page decoded by image library");
        Ok(vec![target])
    }
}
