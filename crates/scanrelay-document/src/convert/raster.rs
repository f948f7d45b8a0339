// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation via poppler's `pdftoppm`. Each page becomes its own
// numbered PNG in the output directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lopdf::Document;
use scanrelay_core::error::{Result, ScanrelayError};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::{ConversionStrategy, ConvertOptions};

/// Primary strategy: render every page (up to the page cap) at the configured DPI.
pub struct RasterStrategy {
    /// Rasteriser executable, normally `pdftoppm`.
    binary: String,
}

impl RasterStrategy {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ConversionStrategy for RasterStrategy {
    fn name(&self) -> &'static str {
        "raster"
    }

    #[instrument(skip_all, fields(pdf = %pdf_path.display(), dpi = options.dpi))]
    async fn convert(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        options: &ConvertOptions,
    ) -> Result<Vec<PathBuf>> {
        if let Some(pages) = page_count(pdf_path).await {
            if pages == 0 {
                return Err(ScanrelayError::Conversion("PDF has no pages".into()));
            }
            if pages > options.max_pages {
                warn!(pages, max = options.max_pages, "rendering only the first pages");
            }
        }

        let stem = file_stem(pdf_path);
        let prefix = format!("{stem}_page");
        let output_root = output_dir.join(&prefix);

        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(options.dpi.to_string())
            .arg("-png")
            .arg("-l")
            .arg(options.max_pages.to_string())
            .arg(pdf_path)
            .arg(&output_root)
            .output()
            .await
            .map_err(|err| {
                ScanrelayError::Conversion(format!("failed to spawn {}: {err}", self.binary))
            })?;

        if !output.status.success() {
            discard_partial_pages(output_dir, &prefix).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanrelayError::Conversion(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let pages = collect_pages(output_dir, &prefix).await?;
        info!(pages = pages.len(), "PDF rasterised");
        Ok(pages)
    }
}

/// Page count from the PDF page tree, or `None` when lopdf cannot parse the
/// file (the rasteriser is more forgiving, so it still gets a chance).
async fn page_count(pdf_path: &Path) -> Option<usize> {
    let path = pdf_path.to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || Document::load(&path)).await;
    match loaded {
        Ok(Ok(doc)) => {
            let pages = doc.get_pages().len();
            debug!(pages, "page tree read");
            Some(pages)
        }
        Ok(Err(err)) => {
            debug!(error = %err, "lopdf could not parse PDF");
            None
        }
        Err(err) => {
            debug!(error = %err, "page count task failed");
            None
        }
    }
}

/// Find `<prefix>-<n>.png` files written by the rasteriser, ordered by page.
///
/// The page number is zero-padded to the width of the page count, so the
/// number is parsed rather than relying on lexical order.
async fn collect_pages(output_dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let page_prefix = format!("{prefix}-");
    let mut numbered: Vec<(usize, PathBuf)> = Vec::new();

    let mut entries = tokio::fs::read_dir(output_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let page = name
            .strip_prefix(&page_prefix)
            .and_then(|rest| rest.strip_suffix(".png"))
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(page) = page {
            numbered.push((page, entry.path()));
        }
    }

    numbered.sort_by_key(|(page, _)| *page);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

/// Remove pages a failed run wrote before exiting. The error path returns no
/// paths, so nothing downstream would ever track these files.
async fn discard_partial_pages(output_dir: &Path, prefix: &str) {
    let pages = match collect_pages(output_dir, prefix).await {
        Ok(pages) => pages,
        Err(err) => {
            warn!(dir = %output_dir.display(), error = %err, "cannot list partial pages");
            return;
        }
    };
    for page in pages {
        if let Err(err) = tokio::fs::remove_file(&page).await {
            warn!(path = %page.display(), error = %err, "failed to remove partial page");
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactTracker;
    use crate::convert::ConversionChain;

    #[tokio::test]
    async fn pages_are_ordered_numerically() {
        let dir = tempfile::tempdir().expect("temp dir");
        for name in ["scan_page-10.png", "scan_page-02.png", "scan_page-1.png", "other-1.png", "scan_page-x.png"] {
            std::fs::write(dir.path().join(name), b"png").unwrap();
        }

        let pages = collect_pages(dir.path(), "scan_page").await.unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["scan_page-1.png", "scan_page-02.png", "scan_page-10.png"]);
    }

    #[tokio::test]
    async fn missing_binary_is_a_conversion_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();

        let strategy = RasterStrategy::new("scanrelay-no-such-rasterizer");
        let result = strategy
            .convert(&pdf, dir.path(), &ConvertOptions::default())
            .await;
        assert!(matches!(result, Err(ScanrelayError::Conversion(_))));
    }

    /// Write an executable stand-in for `pdftoppm`. It logs its arguments to
    /// `<script dir>/argv.txt`, writes the given page suffixes under the
    /// output root (its last argument), then exits with `status`.
    #[cfg(unix)]
    fn fake_rasterizer(dir: &Path, pages: &[&str], status: i32) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-pdftoppm");
        let argv_log = dir.join("argv.txt");
        let writes: String = pages
            .iter()
            .map(|suffix| format!("printf png > \"$root-{suffix}.png\"\n"))
            .collect();
        let body = format!(
            "#!/bin/sh\nfor a; do root=\"$a\"; done\necho \"$@\" > \"{}\"\n{writes}exit {status}\n",
            argv_log.display()
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_run_returns_pages_in_order() {
        let tools = tempfile::tempdir().expect("temp dir");
        let work = tempfile::tempdir().expect("temp dir");
        let pdf = work.path().join("scan.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let out = work.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let strategy = RasterStrategy::new(fake_rasterizer(tools.path(), &["2", "1"], 0));
        let options = ConvertOptions { dpi: 150, max_pages: 2 };
        let pages = strategy.convert(&pdf, &out, &options).await.unwrap();

        assert_eq!(pages, vec![out.join("scan_page-1.png"), out.join("scan_page-2.png")]);

        let argv = std::fs::read_to_string(tools.path().join("argv.txt")).unwrap();
        let expected = format!(
            "-r 150 -png -l 2 {} {}",
            pdf.display(),
            out.join("scan_page").display()
        );
        assert_eq!(argv.trim(), expected);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_run_leaves_no_partial_pages() {
        let tools = tempfile::tempdir().expect("temp dir");
        let work = tempfile::tempdir().expect("temp dir");
        let pdf = work.path().join("scan.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let out = work.path().join("out");

        let chain = ConversionChain::new(vec![Box::new(RasterStrategy::new(fake_rasterizer(
            tools.path(),
            &["1"],
            1,
        )))]);
        let mut tracker = ArtifactTracker::new();
        let result = chain
            .convert(&pdf, &out, &ConvertOptions::default(), &mut tracker)
            .await;

        assert_eq!(result, vec![pdf.clone()]);
        tracker.cleanup().await;
        assert!(entries(&out).is_empty(), "left behind: {:?}", entries(&out));
        assert!(pdf.exists());
    }

    #[test]
    fn stem_falls_back_for_bare_paths() {
        assert_eq!(file_stem(Path::new("/in/statement.pdf")), "statement");
        assert_eq!(file_stem(Path::new("/")), "document");
    }
}
