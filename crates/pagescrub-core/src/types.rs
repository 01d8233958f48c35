// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: page geometry, extracted content, redaction regions,
// section index entries, and directed edit actions.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle in page units.
///
/// Origin is the top-left corner of the page and `y` grows downward, so the
/// header band of a page has small `y` values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_array(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.width() * self.height()
        }
    }

    /// A rectangle with no interior (zero or negative extent).
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// True if the two rectangles share interior area.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x0 < other.x1
            && other.x0 < self.x1
            && self.y0 < other.y1
            && other.y0 < self.y1
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.x0 - margin,
            self.y0 - margin,
            self.x1 + margin,
            self.y1 + margin,
        )
    }

    /// Horizontal slice between two fractions of the width (0.0..=1.0).
    pub fn slice_x(&self, from: f64, to: f64) -> Rect {
        let w = self.width();
        Rect::new(self.x0 + w * from, self.y0, self.x0 + w * to, self.y1)
    }

    /// Smallest rectangle containing every point.
    pub fn bounding(points: &[(f64, f64)]) -> Option<Rect> {
        let (first, rest) = points.split_first()?;
        let mut rect = Rect::new(first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            rect.x0 = rect.x0.min(x);
            rect.y0 = rect.y0.min(y);
            rect.x1 = rect.x1.max(x);
            rect.y1 = rect.y1.max(y);
        }
        Some(rect)
    }
}

// ---------------------------------------------------------------------------
// Extracted content
// ---------------------------------------------------------------------------

/// Font style bitset as reported by the text extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleFlags(pub u32);

impl StyleFlags {
    pub const SUPERSCRIPT: u32 = 1;
    pub const ITALIC: u32 = 2;
    pub const SERIF: u32 = 4;
    pub const MONOSPACE: u32 = 8;
    pub const BOLD: u32 = 16;

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub fn with(self, flag: u32) -> Self {
        Self(self.0 | flag)
    }
}

/// A contiguous run of text sharing font and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub font_size: f64,
    pub flags: StyleFlags,
    pub bbox: Rect,
    /// 0-based index of the owning page.
    pub page: usize,
}

/// Spans sharing a baseline, in reading order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextLine {
    pub spans: Vec<Span>,
}

impl TextLine {
    /// Trimmed span texts joined with single spaces, blank spans dropped.
    pub fn joined_text(&self) -> String {
        self.spans
            .iter()
            .map(|span| span.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Geometry and text of one page. Images are read separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based page index.
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub lines: Vec<TextLine>,
}

impl Page {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// 1-based page number for anything user-visible.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.lines.iter().flat_map(|line| line.spans.iter())
    }

    /// Band covering the top `fraction` of the page height.
    pub fn header_region(&self, fraction: f64) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height * fraction)
    }

    /// Band covering the bottom `fraction` of the page height.
    pub fn footer_region(&self, fraction: f64) -> Rect {
        Rect::new(0.0, self.height * (1.0 - fraction), self.width, self.height)
    }
}

/// An embedded raster image as placed on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// Decoded samples (or raw stream bytes when undecodable). Only a prefix
    /// is used for fingerprinting.
    pub samples: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Every rectangle where this image is drawn on the page.
    pub placements: Vec<Rect>,
}

impl PageImage {
    pub fn pixel_area(&self) -> u64 {
        u64::from(self.pixel_width) * u64::from(self.pixel_height)
    }
}

// ---------------------------------------------------------------------------
// Redaction
// ---------------------------------------------------------------------------

/// Why a region was scheduled for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Span classified as watermark, branding, or promotional text.
    TextNoise,
    /// Image too small to be meaningful content.
    SmallImage,
    /// Image identical to one already kept on an earlier page.
    DuplicateImage,
    /// Small or medium image in the header or footer band.
    DecorativeImage,
    /// Region supplied by a directed edit action.
    ExplicitAction,
}

/// A rectangle scheduled for opaque removal on a single page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedactionRegion {
    pub page: usize,
    pub rect: Rect,
    pub reason: RemovalReason,
    pub margin: f64,
}

impl RedactionRegion {
    pub fn new(page: usize, rect: Rect, reason: RemovalReason, margin: f64) -> Self {
        Self {
            page,
            rect,
            reason,
            margin,
        }
    }

    /// The rectangle actually blanked out (`rect` grown by `margin`).
    pub fn target(&self) -> Rect {
        self.rect.expand(self.margin)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// One detected section with an inclusive, 1-based page range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub title: String,
    pub start_page: usize,
    pub end_page: usize,
}

/// Ordered section list, serialized as `{title: {start_page, end_page}}`
/// in detection order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionIndex {
    pub entries: Vec<SectionEntry>,
}

impl SectionIndex {
    pub fn get(&self, title: &str) -> Option<&SectionEntry> {
        self.entries.iter().find(|entry| entry.title == title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Serialize)]
struct PageRange {
    start_page: usize,
    end_page: usize,
}

impl Serialize for SectionIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(
                &entry.title,
                &PageRange {
                    start_page: entry.start_page,
                    end_page: entry.end_page,
                },
            )?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Directed edit actions
// ---------------------------------------------------------------------------

/// What the user pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Image,
    Watermark,
    Text,
}

/// Whether an action targets one page or the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionScope {
    #[default]
    CurrentPage,
    AllPages,
}

fn first_page() -> usize {
    1
}

/// A single user-directed removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectedAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub scope: ActionScope,
    /// 1-based page the action was drawn on.
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    #[serde(default)]
    pub content: String,
}

impl DirectedAction {
    /// Whether an `allPages` action should locate its target by text search
    /// rather than by reusing its bounding box.
    pub fn searches_text(&self) -> bool {
        match self.kind {
            ActionKind::Text => true,
            ActionKind::Watermark => !self.content.is_empty(),
            ActionKind::Image => false,
        }
    }
}

/// Edit request as posted by the editor front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPayload {
    pub file_path: String,
    pub actions: Vec<DirectedAction>,
    #[serde(default = "default_out_file")]
    pub out_file: String,
}

fn default_out_file() -> String {
    "edited_output.pdf".to_string()
}
