// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job entry points — open a PDF, run one operation, and (for the editing jobs)
// save the result. Output is written only once the whole run has succeeded.

use std::path::Path;

use pagescrub_core::error::Result;
use pagescrub_core::{
    CleanReport, CleanText, CleanerConfig, DirectedAction, DocumentInfo, EditPayload,
    EditSummary, SectionConfig, SectionIndex,
};
use tracing::{info, instrument};

use crate::classify::TextClassifier;
use crate::pdf::PdfDocument;
use crate::planner::RedactionPlanner;
use crate::sections::SectionDetector;
use crate::text;

/// Remove noise text and redundant images from `input`, writing the cleaned
/// document to `output`.
#[instrument(skip_all, fields(input = %input.as_ref().display()))]
pub fn clean_pdf(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &CleanerConfig,
) -> Result<CleanReport> {
    let planner = RedactionPlanner::new(config)?;
    let mut doc = PdfDocument::open(input)?;
    let report = planner.scan(&mut doc)?;
    doc.save(output)?;
    Ok(report)
}

/// Apply a JSON edit payload (`filePath`, `actions`, `outFile`).
pub fn edit_pdf(payload_json: &str) -> Result<EditSummary> {
    let payload: EditPayload = serde_json::from_str(payload_json)?;
    info!(
        file = %payload.file_path,
        actions = payload.actions.len(),
        "Edit payload parsed"
    );
    edit_pdf_with(&payload.file_path, &payload.actions, &payload.out_file)
}

/// Apply directed actions to `input`, writing the result to `output`.
#[instrument(skip_all, fields(input = %input.as_ref().display(), actions = actions.len()))]
pub fn edit_pdf_with(
    input: impl AsRef<Path>,
    actions: &[DirectedAction],
    output: impl AsRef<Path>,
) -> Result<EditSummary> {
    let planner = RedactionPlanner::with_defaults()?;
    let mut doc = PdfDocument::open(input)?;
    let summary = planner.apply_actions(&mut doc, actions)?;
    doc.save(output)?;
    Ok(summary)
}

/// Plain text of the document with noise spans left out.
pub fn extract_clean_text(input: impl AsRef<Path>, config: &CleanerConfig) -> Result<CleanText> {
    let classifier = TextClassifier::new(&config.rules, &config.thresholds)?;
    let doc = PdfDocument::open(input)?;
    text::extract_clean_text(&doc, &classifier)
}

/// Detect lecture/chapter sections, reporting progress per page.
pub fn parse_sections<F: FnMut(u8)>(
    input: impl AsRef<Path>,
    config: &SectionConfig,
    progress: F,
) -> Result<SectionIndex> {
    let doc = PdfDocument::open(input)?;
    Ok(SectionDetector::new(config.clone()).detect_with_progress(&doc, progress))
}

/// Page count, page sizes, title and author.
pub fn document_info(input: impl AsRef<Path>) -> Result<DocumentInfo> {
    Ok(PdfDocument::open(input)?.info())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{image_at, page, text, write_pdf, Sample};
    use crate::source::SourceDocument;
    use pagescrub_core::{JobOutcome, PageScrubError};
    use tempfile::TempDir;

    fn lecture(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("lecture.pdf");
        let mut first = text("Chapter 1", 16, 72, 780);
        first.extend(text("Visit www.notes.example.com", 10, 72, 700));
        first.extend(text("Arrays store elements contiguously", 10, 72, 600));
        first.extend(image_at(72, 300, 200, 120));

        let mut second = text("Linked lists chain nodes", 10, 72, 780);
        second.extend(image_at(72, 300, 200, 120));

        let mut third = text("Chapter 2", 16, 72, 780);
        third.extend(text("Trees branch", 10, 72, 700));

        write_pdf(
            &path,
            vec![
                Sample {
                    operations: first,
                    with_image: true,
                    title: Some("Data Structures"),
                },
                Sample {
                    operations: second,
                    with_image: true,
                    title: None,
                },
                page(third),
            ],
        );
        path
    }

    #[test]
    fn clean_removes_noise_and_repeated_image() {
        let dir = TempDir::new().unwrap();
        let input = lecture(&dir);
        let output = dir.path().join("clean.pdf");

        let report = clean_pdf(&input, &output, &CleanerConfig::default()).unwrap();
        assert_eq!(report.pages, 3);
        assert_eq!(report.text_regions, 1);
        assert_eq!(report.duplicate_images, 1);
        assert!(report.finished_at.is_some());

        let cleaned = PdfDocument::open(&output).unwrap();
        let first = cleaned.page_text(0).unwrap();
        assert!(!first.contains("www."));
        assert!(first.contains("Arrays store elements contiguously"));
        assert_eq!(cleaned.page_images(0).unwrap().len(), 1);
        assert!(cleaned.page_images(1).unwrap().is_empty());
    }

    #[test]
    fn edit_payload_redacts_text_everywhere() {
        let dir = TempDir::new().unwrap();
        let input = lecture(&dir);
        let output = dir.path().join("edited.pdf");
        let payload = serde_json::json!({
            "filePath": input,
            "outFile": output,
            "actions": [
                { "type": "text", "scope": "allPages", "content": "Trees branch" }
            ]
        });

        let summary = edit_pdf(&payload.to_string()).unwrap();
        assert_eq!(summary.actions_applied, 1);
        assert_eq!(summary.regions, 1);
        let edited = PdfDocument::open(&output).unwrap();
        assert!(!edited.page_text(2).unwrap().contains("Trees"));
        assert!(edited.page_text(2).unwrap().contains("Chapter 2"));
    }

    #[test]
    fn invalid_action_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = lecture(&dir);
        let output = dir.path().join("never.pdf");
        let actions: Vec<DirectedAction> = serde_json::from_str(
            r#"[{ "type": "image", "scope": "currentPage", "page": 9, "bbox": [0, 0, 10, 10] }]"#,
        )
        .unwrap();

        let err = edit_pdf_with(&input, &actions, &output).unwrap_err();
        assert!(matches!(err, PageScrubError::InvalidAction { index: 0, .. }));
        assert!(!output.exists());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let err = edit_pdf("{ not json").unwrap_err();
        assert!(matches!(err, PageScrubError::Serialization(_)));
    }

    #[test]
    fn clean_text_skips_noise() {
        let dir = TempDir::new().unwrap();
        let input = lecture(&dir);
        let clean = extract_clean_text(&input, &CleanerConfig::default()).unwrap();
        assert!(clean.text.starts_with("--- Page 1 ---\nChapter 1"));
        assert!(!clean.text.contains("www."));
        assert_eq!(clean.pages, 3);
    }

    #[test]
    fn sections_and_progress_from_file() {
        let dir = TempDir::new().unwrap();
        let input = lecture(&dir);
        let mut progress = Vec::new();
        let index = parse_sections(&input, &SectionConfig::default(), |pct| progress.push(pct)).unwrap();
        assert_eq!(progress, vec![33, 66, 100]);
        let ranges: Vec<(usize, usize)> = index
            .entries
            .iter()
            .map(|e| (e.start_page, e.end_page))
            .collect();
        assert_eq!(ranges, vec![(1, 2), (3, 3)]);
    }

    #[test]
    fn info_and_outcome_json() {
        let dir = TempDir::new().unwrap();
        let input = lecture(&dir);
        let outcome = JobOutcome::from_result(document_info(&input), "Document info loaded");
        let json: serde_json::Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["pages"], 3);
        assert_eq!(json["title"], "Data Structures");

        let missing = JobOutcome::from_result(document_info(dir.path().join("nope.pdf")), "unused");
        assert!(!missing.success);
        assert!(missing.error.unwrap().contains("nope.pdf"));
    }
}
