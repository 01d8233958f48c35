// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The document collaborator seen by the cleaning engine: page layout, images,
// plain text, text search, and per-page opaque removal.

use pagescrub_core::error::Result;
use pagescrub_core::{Page, PageImage, Rect, Span};

/// A document the engine can inspect and redact.
///
/// Page indices are 0-based. Removals are buffered with
/// [`add_redaction`](SourceDocument::add_redaction) and take effect on
/// [`apply_redactions`](SourceDocument::apply_redactions), one page at a time.
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Page geometry and text lines.
    fn page(&self, index: usize) -> Result<Page>;

    /// Images drawn on the page. The outer error means the page itself could
    /// not be read; an inner error concerns one image only.
    fn page_images(&self, index: usize) -> Result<Vec<Result<PageImage>>>;

    /// Plain text of the page, one line per text line.
    fn page_text(&self, index: usize) -> Result<String> {
        let page = self.page(index)?;
        Ok(page
            .lines
            .iter()
            .map(|line| line.joined_text())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Rectangles of exact, case-sensitive occurrences of `needle`.
    fn search_text(&self, index: usize, needle: &str, max_hits: usize) -> Result<Vec<Rect>> {
        let page = self.page(index)?;
        Ok(search_spans(&page, needle, max_hits))
    }

    /// Buffer an opaque removal on a page.
    fn add_redaction(&mut self, index: usize, rect: Rect) -> Result<()>;

    /// Commit every buffered removal on a page. Returns how many were applied.
    fn apply_redactions(&mut self, index: usize) -> Result<usize>;
}

/// Part of a line's joined text contributed by one span.
struct Piece<'p> {
    span: &'p Span,
    /// Char offset of the span's trimmed text within the joined line.
    start: usize,
    /// Chars of the trimmed text.
    len: usize,
    /// Leading whitespace chars trimmed off the span.
    lead: usize,
}

/// Find `needle` in each line's joined text (spans separated by one space).
///
/// A hit yields one rectangle per span it touches: the slice of that span's
/// box proportional to the covered characters. At most `max_hits`
/// occurrences are reported per page.
pub fn search_spans(page: &Page, needle: &str, max_hits: usize) -> Vec<Rect> {
    let mut rects = Vec::new();
    if needle.is_empty() {
        return rects;
    }
    let needle_chars = needle.chars().count();
    let mut found = 0;

    for line in &page.lines {
        let mut joined = String::new();
        let mut pieces: Vec<Piece<'_>> = Vec::new();
        for span in &line.spans {
            let trimmed = span.text.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !joined.is_empty() {
                joined.push(' ');
            }
            let lead = span.text.len() - span.text.trim_start().len();
            pieces.push(Piece {
                span,
                start: joined.chars().count(),
                len: trimmed.chars().count(),
                lead: span.text[..lead].chars().count(),
            });
            joined.push_str(trimmed);
        }

        for (byte_offset, _) in joined.match_indices(needle) {
            if found >= max_hits {
                return rects;
            }
            found += 1;
            let start = joined[..byte_offset].chars().count();
            let end = start + needle_chars;
            for piece in &pieces {
                let from = start.max(piece.start);
                let to = end.min(piece.start + piece.len);
                if from >= to {
                    continue;
                }
                let total = piece.span.text.chars().count() as f64;
                let local = |offset: usize| (piece.lead + offset - piece.start) as f64 / total;
                rects.push(piece.span.bbox.slice_x(local(from), local(to)));
            }
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagescrub_core::{StyleFlags, TextLine};

    fn page_with(texts: &[&str]) -> Page {
        let lines = texts
            .iter()
            .enumerate()
            .map(|(i, text)| TextLine {
                spans: vec![Span {
                    text: text.to_string(),
                    font_size: 10.0,
                    flags: StyleFlags::default(),
                    bbox: Rect::new(0.0, i as f64 * 20.0, 100.0, i as f64 * 20.0 + 12.0),
                    page: 0,
                }],
            })
            .collect();
        Page {
            index: 0,
            width: 200.0,
            height: 200.0,
            lines,
        }
    }

    #[test]
    fn hit_rect_is_proportional_slice() {
        let page = page_with(&["abcdeCluesBook"]);
        // 14 chars, hit at 5..14
        let hits = search_spans(&page, "CluesBook", 10);
        assert_eq!(hits.len(), 1);
        let hit = hits[0];
        assert!((hit.x0 - 100.0 * 5.0 / 14.0).abs() < 1e-9);
        assert!((hit.x1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn search_is_case_sensitive() {
        let page = page_with(&["cluesbook", "CLUESBOOK", "CluesBook x CluesBook"]);
        assert_eq!(search_spans(&page, "CluesBook", 10).len(), 2);
    }

    #[test]
    fn search_stops_at_limit() {
        let page = page_with(&["ab ab ab", "ab ab"]);
        assert_eq!(search_spans(&page, "ab", 3).len(), 3);
    }

    fn word(text: &str, x0: f64, x1: f64) -> Span {
        Span {
            text: text.to_string(),
            font_size: 10.0,
            flags: StyleFlags::default(),
            bbox: Rect::new(x0, 100.0, x1, 112.0),
            page: 0,
        }
    }

    fn page_of_words(words: Vec<Span>) -> Page {
        Page {
            index: 0,
            width: 200.0,
            height: 200.0,
            lines: vec![TextLine { spans: words }],
        }
    }

    #[test]
    fn phrase_across_word_spans() {
        let page = page_of_words(vec![
            word("VU", 10.0, 20.0),
            word("Help", 25.0, 45.0),
            word("Forum", 50.0, 75.0),
        ]);
        let hits = search_spans(&page, "VU Help Forum", 10);
        assert_eq!(
            hits,
            vec![
                Rect::new(10.0, 100.0, 20.0, 112.0),
                Rect::new(25.0, 100.0, 45.0, 112.0),
                Rect::new(50.0, 100.0, 75.0, 112.0),
            ]
        );

        // "lp Fo": last two chars of Help, first two of Forum
        let partial = search_spans(&page, "lp Fo", 10);
        assert_eq!(partial.len(), 2);
        assert!((partial[0].x0 - 35.0).abs() < 1e-9 && (partial[0].x1 - 45.0).abs() < 1e-9);
        assert!((partial[1].x0 - 50.0).abs() < 1e-9 && (partial[1].x1 - 60.0).abs() < 1e-9);
    }

    #[test]
    fn padded_span_slices_skip_whitespace() {
        let page = page_of_words(vec![word("by ", 0.0, 30.0), word("  CluesBook", 40.0, 150.0)]);
        let hits = search_spans(&page, "by CluesBook", 10);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].x1 - 20.0).abs() < 1e-9);
        // 11 chars over 110pt, the hit starts after two spaces
        assert!((hits[1].x0 - 60.0).abs() < 1e-9);
        assert!((hits[1].x1 - 150.0).abs() < 1e-9);
    }

    #[test]
    fn phrase_does_not_cross_lines() {
        let page = page_with(&["VU Help", "Forum"]);
        assert!(search_spans(&page, "Help Forum", 10).is_empty());
    }

    #[test]
    fn empty_needle_finds_nothing() {
        let page = page_with(&["anything"]);
        assert!(search_spans(&page, "", 10).is_empty());
    }
}
