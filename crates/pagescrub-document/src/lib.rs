// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescrub-document — Cleaning engine for study-material PDFs.
//
// Classifies text spans as noise (URLs, watermarks, promotional lines, stamps),
// removes small, decorative, and repeated images, applies user-directed
// removals, and detects lecture/chapter sections. Documents are reached
// through the `SourceDocument` trait; `PdfDocument` implements it over lopdf.

pub mod classify;
pub mod dedup;
pub mod jobs;
pub mod memory;
pub mod pdf;
pub mod planner;
pub mod sections;
pub mod source;
pub mod text;

// Re-export the primary types so callers can use `pagescrub_document::PdfDocument` etc.
pub use classify::{RuleKind, TextClassifier, Verdict};
pub use dedup::{Fingerprint, ImageDeduplicator, SeenFingerprints};
pub use jobs::{clean_pdf, document_info, edit_pdf, edit_pdf_with, extract_clean_text, parse_sections};
pub use memory::MemoryDocument;
pub use pdf::PdfDocument;
pub use planner::{PagePlan, RedactionPlanner, ScanState};
pub use sections::{SectionDetector, detect_sections};
pub use source::SourceDocument;
