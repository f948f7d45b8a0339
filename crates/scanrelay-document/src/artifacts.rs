// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-request artifact tracking. Every file generated while preparing a
// document is recorded here so it can be removed once extraction finishes,
// including after a failure part-way through the conversion chain.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Ordered set of generated files owned by one pipeline invocation.
///
/// PDFs are never deleted: anything with a `.pdf` extension is treated as
/// source input even if it was recorded by mistake.
#[derive(Debug, Default)]
pub struct ArtifactTracker {
    paths: Vec<PathBuf>,
}

impl ArtifactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generated file. Duplicates are ignored.
    pub fn record(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            debug!(path = %path.display(), "artifact recorded");
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Remove every recorded non-PDF file that still exists.
    ///
    /// Individual failures are logged and skipped. The recorded set is
    /// drained, so a second call is a no-op. Returns the number of files removed.
    pub async fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.paths.drain(..) {
            if is_pdf(&path) {
                debug!(path = %path.display(), "never deleting PDF");
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to remove artifact");
                }
            }
        }
        if removed > 0 {
            info!(removed, "artifacts cleaned up");
        }
        removed
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
