// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the hot paths of the pagescrub-document crate:
// span classification and a full automatic scan over an in-memory document.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pagescrub_core::{PageImage, Rect, StyleFlags};
use pagescrub_document::{MemoryDocument, RedactionPlanner, SourceDocument, TextClassifier};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

const SAMPLE_SPANS: &[&str] = &[
    "A binary heap is a complete binary tree",
    "Join Our WhatsApp Channel",
    "www.example.com/lectures",
    "Lecture No. 12",
    "Insertion runs in O(log n) time",
    "Copyright Pearson Prentice-Hall",
];

/// Classify a mix of body text and noise spans with the default rule set.
fn bench_classify(c: &mut Criterion) {
    let classifier = TextClassifier::with_defaults().expect("default rules compile");

    c.bench_function("classify (6 spans)", |b| {
        b.iter(|| {
            for text in SAMPLE_SPANS {
                black_box(classifier.classify(
                    black_box(text),
                    11.0,
                    StyleFlags::default(),
                    1_200.0,
                    480_000.0,
                ));
            }
        });
    });
}

/// Scan a 20-page document holding body text, noise, and a repeated logo.
fn bench_scan(c: &mut Criterion) {
    let mut template = MemoryDocument::new();
    for _ in 0..20 {
        let page = template.add_page(595.0, 842.0);
        for (i, text) in SAMPLE_SPANS.iter().enumerate() {
            let y = 150.0 + i as f64 * 40.0;
            template.add_text(page, text, 11.0, Rect::new(72.0, y, 400.0, y + 13.0));
        }
        template.add_image(
            page,
            PageImage {
                samples: vec![7u8; 4_000],
                pixel_width: 120,
                pixel_height: 80,
                placements: vec![Rect::new(72.0, 500.0, 312.0, 660.0)],
            },
        );
    }
    let planner = RedactionPlanner::with_defaults().expect("default rules compile");

    c.bench_function("scan (20 pages)", |b| {
        b.iter(|| {
            let mut doc = template.clone();
            let report = planner.scan(&mut doc).expect("scan succeeds");
            black_box(report.total_regions());
            black_box(doc.page_count());
        });
    });
}

criterion_group!(benches, bench_classify, bench_scan);
criterion_main!(benches);
