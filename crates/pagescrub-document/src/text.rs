// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Clean text export — the plain text of every span the classifier keeps,
// one block per page.

use pagescrub_core::error::Result;
use pagescrub_core::{CleanText, Page};
use tracing::{debug, instrument};

use crate::classify::TextClassifier;
use crate::source::SourceDocument;

/// Kept lines of one page; empty if nothing survives.
pub fn clean_page_lines(classifier: &TextClassifier, page: &Page) -> Vec<String> {
    let page_area = page.area();
    page.lines
        .iter()
        .filter_map(|line| {
            let kept: Vec<&str> = line
                .spans
                .iter()
                .map(|span| (span, span.text.trim()))
                .filter(|(_, text)| !text.is_empty())
                .filter(|(span, text)| {
                    !classifier.should_remove(
                        text,
                        span.font_size,
                        span.flags,
                        span.bbox.area(),
                        page_area,
                    )
                })
                .map(|(_, text)| text)
                .collect();
            (!kept.is_empty()).then(|| kept.join(" "))
        })
        .collect()
}

/// Concatenate the kept text of every page, each prefixed with a
/// `--- Page N ---` marker.
#[instrument(skip_all, fields(pages = doc.page_count()))]
pub fn extract_clean_text<D: SourceDocument + ?Sized>(
    doc: &D,
    classifier: &TextClassifier,
) -> Result<CleanText> {
    let mut text = String::new();
    let mut pages = 0;

    for index in 0..doc.page_count() {
        let page = doc.page(index)?;
        let lines = clean_page_lines(classifier, &page);
        if lines.is_empty() {
            continue;
        }
        text.push_str(&format!("\n--- Page {} ---\n", page.number()));
        text.push_str(&lines.join("\n"));
        text.push('\n');
        pages += 1;
    }

    debug!(pages, chars = text.len(), "Clean text assembled");
    Ok(CleanText {
        text: text.trim().to_string(),
        pages,
    })
}
