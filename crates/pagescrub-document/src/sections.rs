// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Section boundary detector — finds lecture/lesson/chapter/module/topic
// headings near the top of each page and turns them into an ordered index of
// inclusive page ranges.

use std::collections::HashSet;
use std::sync::LazyLock;

use pagescrub_core::{SectionConfig, SectionEntry, SectionIndex};
use regex::{Regex, RegexBuilder};
use tracing::{debug, info, instrument, warn};

use crate::source::SourceDocument;

fn heading(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .expect("valid heading regex")
}

/// Heading patterns, in evaluation order.
static SECTION_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("Lecture", heading(r"Lecture\s*(?:No\.?|#)?\s*\d+")),
        ("Lesson", heading(r"Lesson\s*(?:No\.?|#)?\s*\d+")),
        ("Chapter", heading(r"Chapter\s*\d+")),
        ("Module", heading(r"Module\s*\d+")),
        ("Topic", heading(r"Topic\s*\d+[:.-]?")),
    ]
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_title(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Scans page text for section headings.
#[derive(Debug, Clone, Default)]
pub struct SectionDetector {
    config: SectionConfig,
}

impl SectionDetector {
    pub fn new(config: SectionConfig) -> Self {
        Self { config }
    }

    /// Total pattern hits anywhere on the page.
    pub fn hit_count(text: &str) -> usize {
        SECTION_PATTERNS
            .iter()
            .map(|(_, re)| re.find_iter(text).count())
            .sum()
    }

    /// Whether a page looks like a table of contents or index and must be
    /// ignored. Only the first few pages are ever suppressed.
    pub fn is_index_page(&self, page_number: usize, text: &str) -> bool {
        page_number <= self.config.toc_scan_pages && Self::hit_count(text) > self.config.toc_max_hits
    }

    /// Normalized headings that start close enough to the top of the page.
    pub fn headings_on_page(&self, text: &str) -> Vec<String> {
        let mut titles = Vec::new();
        for (_, re) in SECTION_PATTERNS.iter() {
            for found in re.find_iter(text) {
                let offset = text[..found.start()].chars().count();
                if offset > self.config.heading_window {
                    continue;
                }
                titles.push(normalize_title(found.as_str()));
            }
        }
        titles
    }

    /// Detect sections in plain page texts (page 1 first).
    pub fn detect_in_texts<I, S>(&self, texts: I) -> SectionIndex
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut found = Vec::new();
        let mut total = 0;
        for (i, text) in texts.into_iter().enumerate() {
            total = i + 1;
            self.collect_page(total, text.as_ref(), &mut found);
        }
        build_index(found, total)
    }

    /// Detect sections in a document.
    pub fn detect<D: SourceDocument + ?Sized>(&self, doc: &D) -> SectionIndex {
        self.detect_with_progress(doc, |_| {})
    }

    /// Detect sections, reporting a percentage after every page.
    #[instrument(skip_all, fields(pages = doc.page_count()))]
    pub fn detect_with_progress<D, F>(&self, doc: &D, mut progress: F) -> SectionIndex
    where
        D: SourceDocument + ?Sized,
        F: FnMut(u8),
    {
        let total = doc.page_count();
        let mut found = Vec::new();

        for index in 0..total {
            let number = index + 1;
            progress((number * 100 / total) as u8);
            match doc.page_text(index) {
                Ok(text) => self.collect_page(number, &text, &mut found),
                Err(err) => warn!(page = number, %err, "Page text unavailable; skipped"),
            }
        }

        let index = build_index(found, total);
        info!(sections = index.len(), "Section detection complete");
        index
    }

    fn collect_page(&self, number: usize, text: &str, found: &mut Vec<(String, usize)>) {
        if self.is_index_page(number, text) {
            debug!(page = number, "Index-like page skipped");
            return;
        }
        found.extend(
            self.headings_on_page(text)
                .into_iter()
                .map(|title| (title, number)),
        );
    }
}

/// Keep the first occurrence of each title and derive inclusive end pages.
pub fn build_index(found: Vec<(String, usize)>, total_pages: usize) -> SectionIndex {
    let mut seen = HashSet::new();
    let unique: Vec<(String, usize)> = found
        .into_iter()
        .filter(|(title, _)| seen.insert(title.clone()))
        .collect();

    let entries = unique
        .iter()
        .enumerate()
        .map(|(i, (title, start))| {
            let end = match unique.get(i + 1) {
                Some((_, next)) if *next > *start => next - 1,
                Some(_) => *start,
                None => total_pages,
            };
            SectionEntry {
                title: title.clone(),
                start_page: *start,
                end_page: end,
            }
        })
        .collect();

    SectionIndex { entries }
}

/// Run section detection with the default configuration.
pub fn detect_sections<D: SourceDocument + ?Sized>(doc: &D) -> SectionIndex {
    SectionDetector::default().detect(doc)
}
