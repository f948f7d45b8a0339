// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate selection among generated page images.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Picks the image most likely to OCR well. File size is the proxy for
/// rendering completeness: a blank or half-rendered page compresses smaller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSelector;

impl ImageSelector {
    pub fn new() -> Self {
        Self
    }

    /// Choose one path out of the conversion output.
    ///
    /// The original PDF (and anything else ending in `.pdf`) is never a
    /// candidate; with no candidates left the original is returned. Ties go to
    /// the first candidate. A candidate that cannot be stat'ed is skipped.
    pub async fn select_best(&self, paths: &[PathBuf], original: &Path) -> PathBuf {
        let candidates: Vec<&PathBuf> = paths
            .iter()
            .filter(|p| p.as_path() != original && !is_pdf(p))
            .collect();

        match candidates.as_slice() {
            [] => {
                debug!("no image candidates — keeping original");
                return original.to_path_buf();
            }
            [only] => return (*only).clone(),
            _ => {}
        }

        let mut best: Option<(&PathBuf, u64)> = None;
        for candidate in candidates {
            let size = match tokio::fs::metadata(candidate).await {
                Ok(meta) => meta.len(),
                Err(err) => {
                    warn!(path = %candidate.display(), error = %err, "cannot stat candidate — skipping");
                    continue;
                }
            };
            if best.is_none_or(|(_, best_size)| size > best_size) {
                best = Some((candidate, size));
            }
        }

        match best {
            Some((path, size)) => {
                debug!(path = %path.display(), size, "selected largest candidate");
                path.clone()
            }
            None => {
                warn!("every candidate failed to stat — keeping original");
                original.to_path_buf()
            }
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
