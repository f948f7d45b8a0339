// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for document preparation in the scanrelay-document crate.
// The quality heuristic and the conversion decision run on every incoming
// document, so they must stay cheap regardless of file size.

use std::path::Path;
use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use scanrelay_core::PipelineConfig;
use scanrelay_document::{ConversionDecisionEngine, QualityAssessor};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Build a synthetic scanned PDF: a short header with image markers followed
/// by `len` bytes of pseudo-random stream content.
fn synthetic_pdf(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n1 0 obj << /Type /XObject /Subtype /Image /Filter /DCTDecode >>\n".to_vec();
    let mut state = 0x2545_F491u32;
    bytes.extend((0..len).map(|_| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state as u8
    }));
    bytes
}

/// The assessor only reads the first 10 kB, so a 20 MB buffer should cost
/// the same as a 20 kB one.
fn bench_quality_assessment(c: &mut Criterion) {
    let small = synthetic_pdf(20 * 1024);
    let large = synthetic_pdf(20 * 1024 * 1024);
    let assessor = QualityAssessor::new();

    c.bench_function("quality_assess (20 kB)", |b| {
        b.iter(|| black_box(assessor.assess(black_box(&small))));
    });
    c.bench_function("quality_assess (20 MB)", |b| {
        b.iter(|| black_box(assessor.assess(black_box(&large))));
    });
}

fn bench_conversion_decision(c: &mut Criterion) {
    let pdf = synthetic_pdf(2 * 1024 * 1024);
    let engine = ConversionDecisionEngine::new(Arc::new(PipelineConfig::default()));

    c.bench_function("should_convert (2 MB scanned)", |b| {
        b.iter(|| {
            black_box(engine.should_convert(
                Path::new("statement.pdf"),
                Some("bank_statement"),
                black_box(&pdf),
            ))
        });
    });
}

criterion_group!(benches, bench_quality_assessment, bench_conversion_decision);
criterion_main!(benches);
