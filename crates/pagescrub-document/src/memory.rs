// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory document — pages, spans, and images supplied directly by the
// caller. Used when layout comes from another extractor, and in tests.

use pagescrub_core::error::{PageScrubError, Result};
use pagescrub_core::{Page, PageImage, Rect, Span, StyleFlags, TextLine};

use crate::source::SourceDocument;

#[derive(Debug, Clone)]
struct MemoryPage {
    page: Page,
    /// `None` marks an image whose samples cannot be read.
    images: Vec<Option<PageImage>>,
    pending: Vec<Rect>,
    applied: Vec<Rect>,
}

/// A [`SourceDocument`] held entirely in memory.
///
/// Applying redactions drops every span and image placement that intersects a
/// committed region, mirroring what a PDF backend removes.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty page and return its index.
    pub fn add_page(&mut self, width: f64, height: f64) -> usize {
        let index = self.pages.len();
        self.pages.push(MemoryPage {
            page: Page {
                index,
                width,
                height,
                lines: Vec::new(),
            },
            images: Vec::new(),
            pending: Vec::new(),
            applied: Vec::new(),
        });
        index
    }

    /// Append a text line holding a single span.
    pub fn add_text(&mut self, page: usize, text: &str, font_size: f64, bbox: Rect) {
        self.add_line(
            page,
            vec![Span {
                text: text.to_string(),
                font_size,
                flags: StyleFlags::default(),
                bbox,
                page,
            }],
        );
    }

    pub fn add_line(&mut self, page: usize, spans: Vec<Span>) {
        if let Some(entry) = self.pages.get_mut(page) {
            entry.page.lines.push(TextLine { spans });
        }
    }

    pub fn add_image(&mut self, page: usize, image: PageImage) {
        if let Some(entry) = self.pages.get_mut(page) {
            entry.images.push(Some(image));
        }
    }

    /// Register an image that fails to read.
    pub fn add_unreadable_image(&mut self, page: usize) {
        if let Some(entry) = self.pages.get_mut(page) {
            entry.images.push(None);
        }
    }

    /// Regions committed on a page so far.
    pub fn applied_regions(&self, page: usize) -> &[Rect] {
        self.pages
            .get(page)
            .map(|entry| entry.applied.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_applied(&self) -> usize {
        self.pages.iter().map(|entry| entry.applied.len()).sum()
    }

    fn entry(&self, index: usize) -> Result<&MemoryPage> {
        self.pages.get(index).ok_or(PageScrubError::PageOutOfRange {
            page: index + 1,
            count: self.pages.len(),
        })
    }
}

impl SourceDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<Page> {
        Ok(self.entry(index)?.page.clone())
    }

    fn page_images(&self, index: usize) -> Result<Vec<Result<PageImage>>> {
        let entry = self.entry(index)?;
        Ok(entry
            .images
            .iter()
            .enumerate()
            .map(|(i, image)| {
                image.clone().ok_or(PageScrubError::ImageRead {
                    page: index + 1,
                    image: i,
                    reason: "samples unavailable".into(),
                })
            })
            .collect())
    }

    fn add_redaction(&mut self, index: usize, rect: Rect) -> Result<()> {
        let count = self.pages.len();
        let entry = self
            .pages
            .get_mut(index)
            .ok_or(PageScrubError::PageOutOfRange {
                page: index + 1,
                count,
            })?;
        let bounds = Rect::new(0.0, 0.0, entry.page.width, entry.page.height);
        if !bounds.intersects(&rect) {
            return Err(PageScrubError::PdfError(format!(
                "region {rect:?} lies outside page {}",
                index + 1
            )));
        }
        entry.pending.push(rect);
        Ok(())
    }

    fn apply_redactions(&mut self, index: usize) -> Result<usize> {
        let count = self.pages.len();
        let entry = self
            .pages
            .get_mut(index)
            .ok_or(PageScrubError::PageOutOfRange {
                page: index + 1,
                count,
            })?;
        let regions = std::mem::take(&mut entry.pending);
        let hit = |rect: &Rect| regions.iter().any(|region| region.intersects(rect));

        for line in &mut entry.page.lines {
            line.spans.retain(|span| !hit(&span.bbox));
        }
        entry.page.lines.retain(|line| !line.spans.is_empty());

        for image in entry.images.iter_mut().flatten() {
            image.placements.retain(|rect| !hit(rect));
        }
        entry
            .images
            .retain(|image| image.as_ref().is_none_or(|img| !img.placements.is_empty()));

        let applied = regions.len();
        entry.applied.extend(regions);
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_removes_intersecting_spans_only() {
        let mut doc = MemoryDocument::new();
        let p = doc.add_page(600.0, 800.0);
        doc.add_text(p, "keep me", 11.0, Rect::new(50.0, 200.0, 150.0, 212.0));
        doc.add_text(p, "drop me", 11.0, Rect::new(50.0, 400.0, 150.0, 412.0));

        doc.add_redaction(p, Rect::new(40.0, 395.0, 160.0, 420.0)).unwrap();
        assert_eq!(doc.page_text(p).unwrap(), "keep me\ndrop me");
        assert_eq!(doc.apply_redactions(p).unwrap(), 1);
        assert_eq!(doc.page_text(p).unwrap(), "keep me");
        assert_eq!(doc.applied_regions(p).len(), 1);
    }

    #[test]
    fn off_page_region_is_rejected() {
        let mut doc = MemoryDocument::new();
        let p = doc.add_page(100.0, 100.0);
        assert!(doc.add_redaction(p, Rect::new(200.0, 200.0, 300.0, 300.0)).is_err());
        assert!(doc.add_redaction(5, Rect::new(0.0, 0.0, 10.0, 10.0)).is_err());
    }

    #[test]
    fn unreadable_image_reported_per_element() {
        let mut doc = MemoryDocument::new();
        let p = doc.add_page(100.0, 100.0);
        doc.add_unreadable_image(p);
        let images = doc.page_images(p).unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].as_ref().unwrap_err().is_element_local());
    }
}
