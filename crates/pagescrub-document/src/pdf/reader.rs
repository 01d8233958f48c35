// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF document — a `SourceDocument` over a `lopdf::Document`. Layout comes
// from walking each page's content stream; redactions rewrite it.

use std::collections::HashMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId, Stream};
use pagescrub_core::error::{PageScrubError, Result};
use pagescrub_core::{DocumentInfo, Page, PageImage, PageSize, Rect, Span, TextLine};
use tracing::{debug, info, instrument, warn};

use super::content::{number, walk, FontInfo, PageResources, Painted};
use super::redact::redact_operations;
use crate::source::SourceDocument;

/// US Letter, used when a page has no usable `/MediaBox`.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];
/// Shows whose baselines differ by less than this belong to one line.
const LINE_TOLERANCE: f64 = 1.0;
/// Guard against cyclic `/Parent` chains.
const MAX_TREE_DEPTH: usize = 32;

/// The visible page area in PDF user space. Converts between user space
/// (origin bottom-left, y up) and page space (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageBox {
    llx: f64,
    lly: f64,
    urx: f64,
    ury: f64,
}

impl PageBox {
    fn from_array(values: [f64; 4]) -> Self {
        Self {
            llx: values[0].min(values[2]),
            lly: values[1].min(values[3]),
            urx: values[0].max(values[2]),
            ury: values[1].max(values[3]),
        }
    }

    fn width(&self) -> f64 {
        self.urx - self.llx
    }

    fn height(&self) -> f64 {
        self.ury - self.lly
    }

    fn to_page(self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x0 - self.llx,
            self.ury - rect.y1,
            rect.x1 - self.llx,
            self.ury - rect.y0,
        )
    }

    fn to_user(self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x0 + self.llx,
            self.ury - rect.y1,
            rect.x1 + self.llx,
            self.ury - rect.y0,
        )
    }
}

/// A decoded page: its operators and everything they paint.
struct WalkedPage {
    id: ObjectId,
    page_box: PageBox,
    operations: Vec<Operation>,
    painted: Vec<Painted>,
}

/// A PDF opened for cleaning.
///
/// Text positions are estimated from the content stream (no font metrics), so
/// span boxes are approximate. Content inside form XObjects is not inspected.
pub struct PdfDocument {
    document: Document,
    source_path: Option<String>,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
    /// Buffered regions per page, in page space.
    pending: Vec<Vec<Rect>>,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| PageScrubError::Open {
            path: path_ref.display().to_string(),
            reason: err.to_string(),
        })?;

        let mut doc = Self::from_document(document);
        doc.source_path = Some(path_ref.display().to_string());
        debug!(pages = doc.page_ids.len(), "PDF loaded");
        Ok(doc)
    }

    /// Load a PDF already held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| PageScrubError::Open {
            path: "<memory>".into(),
            reason: err.to_string(),
        })?;
        let doc = Self::from_document(document);
        debug!(pages = doc.page_ids.len(), "PDF loaded from bytes");
        Ok(doc)
    }

    pub fn from_document(document: Document) -> Self {
        // `get_pages` is keyed by 1-based page number, already in order.
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        let pending = vec![Vec::new(); page_ids.len()];
        Self {
            document,
            source_path: None,
            page_ids,
            pending,
        }
    }

    /// Return the source path if the document was created via
    /// [`PdfDocument::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Metadata -------------------------------------------------------------

    /// Page count, page sizes, and the title and author from `/Info`.
    pub fn info(&self) -> DocumentInfo {
        let info = self
            .document
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|object| self.resolve(object).as_dict().ok());
        let field = |key: &[u8]| {
            info.and_then(|dict| dict.get(key).ok())
                .and_then(|object| match self.resolve(object) {
                    Object::String(bytes, _) => Some(decode_text_string(bytes)),
                    _ => None,
                })
                .unwrap_or_default()
        };

        DocumentInfo {
            pages: self.page_ids.len(),
            page_size: self
                .page_ids
                .iter()
                .map(|id| {
                    let page_box = self.page_box(*id);
                    PageSize {
                        width: page_box.width(),
                        height: page_box.height(),
                    }
                })
                .collect(),
            title: field(b"Title"),
            author: field(b"Author"),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Compress, drop unreachable objects, and write the document to `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path_ref = path.as_ref();
        self.prepare_for_output();
        self.document.save(path_ref).map_err(|err| {
            PageScrubError::Save(format!("failed to write {}: {}", path_ref.display(), err))
        })?;
        info!("PDF saved: {}", path_ref.display());
        Ok(())
    }

    /// Serialise the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.prepare_for_output();
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            PageScrubError::Save(format!("failed to serialise PDF: {}", err))
        })?;
        Ok(output)
    }

    fn prepare_for_output(&mut self) {
        let pruned = self.document.prune_objects();
        self.document.compress();
        debug!(pruned = pruned.len(), "Document compacted");
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(PageScrubError::PageOutOfRange {
                page: index + 1,
                count: self.page_ids.len(),
            })
    }

    /// Follow a reference; anything else is returned as is.
    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    /// Look up a page attribute, walking up the page tree for inheritable ones.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = page_id;
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.document.get_dictionary(current).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            current = dict.get(b"Parent").ok()?.as_reference().ok()?;
        }
        None
    }

    fn page_box(&self, page_id: ObjectId) -> PageBox {
        let values = match self.inherited(page_id, b"MediaBox") {
            Some(Object::Array(items)) if items.len() == 4 => {
                let parsed: Vec<f64> = items
                    .iter()
                    .filter_map(|item| number(self.resolve(item)))
                    .collect();
                <[f64; 4]>::try_from(parsed).unwrap_or(DEFAULT_MEDIA_BOX)
            }
            _ => DEFAULT_MEDIA_BOX,
        };
        PageBox::from_array(values)
    }

    fn resource_dict<'a>(&'a self, resources: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
        resources
            .get(key)
            .ok()
            .and_then(|object| self.resolve(object).as_dict().ok())
    }

    fn page_resources(&self, page_id: ObjectId) -> PageResources<'_> {
        let mut resources = PageResources::default();
        let Some(Object::Dictionary(dict)) = self.inherited(page_id, b"Resources") else {
            return resources;
        };

        if let Some(fonts) = self.resource_dict(dict, b"Font") {
            for (name, font) in fonts.iter() {
                let Ok(font) = self.resolve(font).as_dict() else {
                    continue;
                };
                let two_byte = matches!(font.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype == b"Type0");
                let base_font = match font.get(b"BaseFont") {
                    Ok(Object::Name(base)) => String::from_utf8_lossy(base).into_owned(),
                    _ => String::new(),
                };
                let info = FontInfo::from_base_font(&base_font, two_byte)
                    .with_encoding(self.font_encoding(name, font));
                resources.fonts.insert(name.clone(), info);
            }
        }

        if let Some(xobjects) = self.resource_dict(dict, b"XObject") {
            for (name, xobject) in xobjects.iter() {
                let Ok(id) = xobject.as_reference() else {
                    continue;
                };
                if let Ok(Object::Stream(stream)) = self.document.get_object(id) {
                    if matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype == b"Image") {
                        resources.images.insert(name.clone(), id);
                    }
                }
            }
        }

        resources
    }

    /// The lopdf encoding of a font that declares a `/ToUnicode` map or a
    /// named `/Encoding`. Fonts with neither are left to the raw decoding.
    fn font_encoding<'a>(&self, name: &[u8], font: &'a Dictionary) -> Option<Encoding<'a>> {
        let declared = font.has(b"ToUnicode") || matches!(font.get(b"Encoding"), Ok(Object::Name(_)));
        if !declared {
            return None;
        }
        match font.get_font_encoding(&self.document) {
            Ok(encoding) => Some(encoding),
            Err(err) => {
                debug!(font = %String::from_utf8_lossy(name), %err, "Font encoding unresolved; decoding raw codes");
                None
            }
        }
    }

    fn walk_page(&self, index: usize) -> Result<WalkedPage> {
        let id = self.page_id(index)?;
        let content = self.document.get_and_decode_page_content(id).map_err(|err| {
            PageScrubError::PdfError(format!("cannot decode content of page {}: {}", index + 1, err))
        })?;
        let painted = walk(&content.operations, &self.page_resources(id));
        Ok(WalkedPage {
            id,
            page_box: self.page_box(id),
            operations: content.operations,
            painted,
        })
    }

    fn read_image(&self, id: ObjectId) -> std::result::Result<(Vec<u8>, u32, u32), String> {
        let Ok(Object::Stream(stream)) = self.document.get_object(id) else {
            return Err(format!("object {id:?} is not an image stream"));
        };
        let dimension = |key: &[u8]| {
            stream
                .dict
                .get(key)
                .ok()
                .and_then(|object| number(self.resolve(object)))
                .filter(|value| *value >= 0.0)
                .map(|value| value as u32)
                .ok_or_else(|| format!("image {id:?} lacks /{}", String::from_utf8_lossy(key)))
        };
        let width = dimension(b"Width")?;
        let height = dimension(b"Height")?;
        Ok((samples_of(stream), width, height))
    }

    fn replace_content(&mut self, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
        let bytes = Content { operations }
            .encode()
            .map_err(|err| PageScrubError::PdfError(format!("cannot encode content: {}", err)))?;
        let stream_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), bytes));
        match self.document.get_object_mut(page_id) {
            Ok(Object::Dictionary(page)) => {
                page.set("Contents", Object::Reference(stream_id));
                Ok(())
            }
            _ => Err(PageScrubError::PdfError(format!(
                "page object {page_id:?} is not a dictionary"
            ))),
        }
    }
}

/// Decoded image samples, or the raw stream bytes for filters lopdf cannot
/// decode (such as DCT).
fn samples_of(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// PDF text strings are UTF-16BE with a BOM, or PDFDocEncoding (read as
/// Latin-1).
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

impl SourceDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page(&self, index: usize) -> Result<Page> {
        let walked = self.walk_page(index)?;
        let mut lines: Vec<TextLine> = Vec::new();
        let mut last_baseline: Option<f64> = None;

        for item in &walked.painted {
            let Painted::Text(show) = item else {
                continue;
            };
            if show.text.trim().is_empty() {
                continue;
            }
            let span = Span {
                text: show.text.clone(),
                font_size: show.font_size,
                flags: show.flags,
                bbox: walked.page_box.to_page(&show.rect),
                page: index,
            };
            match (last_baseline, lines.last_mut()) {
                (Some(baseline), Some(line)) if (baseline - show.baseline).abs() < LINE_TOLERANCE => {
                    line.spans.push(span);
                }
                _ => lines.push(TextLine { spans: vec![span] }),
            }
            last_baseline = Some(show.baseline);
        }

        Ok(Page {
            index,
            width: walked.page_box.width(),
            height: walked.page_box.height(),
            lines,
        })
    }

    fn page_images(&self, index: usize) -> Result<Vec<Result<PageImage>>> {
        let walked = self.walk_page(index)?;

        // Group placements by image object, in first-drawn order.
        let mut order: Vec<ObjectId> = Vec::new();
        let mut placements: HashMap<ObjectId, Vec<Rect>> = HashMap::new();
        for item in &walked.painted {
            if let Painted::Image(draw) = item {
                let rects = placements.entry(draw.object_id).or_insert_with(|| {
                    order.push(draw.object_id);
                    Vec::new()
                });
                rects.push(walked.page_box.to_page(&draw.rect));
            }
        }

        Ok(order
            .into_iter()
            .enumerate()
            .map(|(image_index, id)| {
                let (samples, pixel_width, pixel_height) =
                    self.read_image(id).map_err(|reason| PageScrubError::ImageRead {
                        page: index + 1,
                        image: image_index,
                        reason,
                    })?;
                Ok(PageImage {
                    samples,
                    pixel_width,
                    pixel_height,
                    placements: placements.remove(&id).unwrap_or_default(),
                })
            })
            .collect())
    }

    fn add_redaction(&mut self, index: usize, rect: Rect) -> Result<()> {
        let page_box = self.page_box(self.page_id(index)?);
        let bounds = Rect::new(0.0, 0.0, page_box.width(), page_box.height());
        if !bounds.intersects(&rect) {
            return Err(PageScrubError::PdfError(format!(
                "region {rect:?} lies outside page {}",
                index + 1
            )));
        }
        self.pending[index].push(rect);
        Ok(())
    }

    #[instrument(skip(self), fields(page = index + 1))]
    fn apply_redactions(&mut self, index: usize) -> Result<usize> {
        self.page_id(index)?;
        let regions = std::mem::take(&mut self.pending[index]);
        if regions.is_empty() {
            return Ok(0);
        }

        let walked = self.walk_page(index)?;
        let user_regions: Vec<Rect> = regions
            .iter()
            .map(|rect| walked.page_box.to_user(rect))
            .collect();
        let rewrite = redact_operations(walked.operations, &walked.painted, &user_regions);
        if rewrite.text_removed == 0 && rewrite.images_removed == 0 {
            warn!(regions = regions.len(), "Regions covered no content; painting over only");
        }
        debug!(
            text_removed = rewrite.text_removed,
            glyphs_removed = rewrite.glyphs_removed,
            images_removed = rewrite.images_removed,
            "Content rewritten"
        );
        self.replace_content(walked.id, rewrite.operations)?;
        Ok(regions.len())
    }
}
