// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream walker — tracks the graphics and text state of a decoded page
// content stream and reports where text and images are painted, in PDF user
// space. Glyph widths are estimated (0.5 em per glyph) rather than read from
// font metrics. Glyph codes are decoded through the font's lopdf `Encoding`
// (ToUnicode CMap or named encoding) when one resolves.

use std::collections::HashMap;
use std::ops::Range;

use lopdf::content::Operation;
use lopdf::{Document, Encoding, Object, ObjectId};
use pagescrub_core::{Rect, StyleFlags};

/// Average glyph advance as a fraction of the font size.
pub const AVG_GLYPH_WIDTH: f64 = 0.5;
/// Portion of the font size below the baseline.
const DESCENT: f64 = 0.2;
/// Portion of the font size above the baseline.
const ASCENT: f64 = 0.8;
/// A `TJ` adjustment at least this large (thousandths of an em) reads as a
/// word break.
const WORD_GAP: f64 = 200.0;

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// PDF transformation matrix `[a b c d e f]`, row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Matrix {
        Matrix {
            e: tx,
            f: ty,
            ..Matrix::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: number(&operands[0])?,
            b: number(&operands[1])?,
            c: number(&operands[2])?,
            d: number(&operands[3])?,
            e: number(&operands[4])?,
            f: number(&operands[5])?,
        })
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Length of the transformed unit vector along y.
    pub fn vertical_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }

    /// Bounding box of a rectangle given in the source space.
    pub fn transform_rect(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        let corners = [
            self.apply(x0, y0),
            self.apply(x1, y0),
            self.apply(x0, y1),
            self.apply(x1, y1),
        ];
        Rect::bounding(&corners).unwrap_or_default()
    }
}

/// Numeric value of an integer or real operand.
pub fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(f64::from(*v)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Page resources
// ---------------------------------------------------------------------------

/// What the walker needs to know about a font resource.
#[derive(Debug, Default)]
pub struct FontInfo<'a> {
    pub flags: StyleFlags,
    /// Composite (Type0) fonts use two bytes per glyph.
    pub two_byte: bool,
    /// Code-to-Unicode mapping, when the font declares one lopdf understands.
    pub encoding: Option<Encoding<'a>>,
}

impl<'a> FontInfo<'a> {
    /// Guess style flags from a base font name such as `ABCDEF+Arial-BoldItalic`.
    pub fn from_base_font(base_font: &str, two_byte: bool) -> Self {
        let name = base_font.to_ascii_lowercase();
        let mut flags = StyleFlags::default();
        if name.contains("bold") || name.contains("black") || name.contains("heavy") {
            flags = flags.with(StyleFlags::BOLD);
        }
        if name.contains("italic") || name.contains("oblique") {
            flags = flags.with(StyleFlags::ITALIC);
        }
        if name.contains("courier") || name.contains("mono") {
            flags = flags.with(StyleFlags::MONOSPACE);
        }
        if name.contains("times") || name.contains("serif") || name.contains("georgia") {
            flags = flags.with(StyleFlags::SERIF);
        }
        Self {
            flags,
            two_byte,
            encoding: None,
        }
    }

    pub fn with_encoding(self, encoding: Option<Encoding<'a>>) -> Self {
        Self { encoding, ..self }
    }
}

/// Fonts and image XObjects reachable from a page's `/Resources`.
#[derive(Debug, Default)]
pub struct PageResources<'a> {
    pub fonts: HashMap<Vec<u8>, FontInfo<'a>>,
    pub images: HashMap<Vec<u8>, ObjectId>,
}

// ---------------------------------------------------------------------------
// Walker output
// ---------------------------------------------------------------------------

/// Something painted by a single content-stream operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Painted {
    Text(TextShow),
    Image(ImageDraw),
}

impl Painted {
    pub fn op_index(&self) -> usize {
        match self {
            Painted::Text(show) => show.op_index,
            Painted::Image(draw) => draw.op_index,
        }
    }

    pub fn rect(&self) -> Rect {
        match self {
            Painted::Text(show) => show.rect,
            Painted::Image(draw) => draw.rect,
        }
    }
}

/// One text-showing operator (`Tj`, `TJ`, `'`, `"`).
#[derive(Debug, Clone, PartialEq)]
pub struct TextShow {
    pub op_index: usize,
    pub text: String,
    /// Font size after scaling by the text and graphics matrices.
    pub font_size: f64,
    pub flags: StyleFlags,
    /// Estimated glyph box in user space.
    pub rect: Rect,
    /// Baseline y in user space, for grouping shows into lines.
    pub baseline: f64,
    /// Horizontal advance in thousandths of text space units, as a `TJ`
    /// adjustment would express it.
    pub advance_thousandths: f64,
    /// Every glyph shown, in order.
    pub glyphs: Vec<Glyph>,
}

/// One glyph code of a text-showing operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Position of the string among the shown items (the `TJ` array index,
    /// 0 for the single string of `Tj`, `'` and `"`).
    pub item: usize,
    /// Bytes of the glyph code within that string.
    pub bytes: Range<usize>,
    /// Estimated glyph box in user space.
    pub rect: Rect,
    /// Advance including character and word spacing, in thousandths of an em.
    pub advance_thousandths: f64,
}

/// One `Do` of an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDraw {
    pub op_index: usize,
    pub name: Vec<u8>,
    pub object_id: ObjectId,
    pub rect: Rect,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct TextState<'r> {
    font: Option<&'r FontInfo<'r>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState<'_> {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState<'r> {
    ctm: Matrix,
    text: TextState<'r>,
}

/// Walks operators and records everything painted.
struct Walker<'r> {
    resources: &'r PageResources<'r>,
    state: GraphicsState<'r>,
    stack: Vec<GraphicsState<'r>>,
    tm: Matrix,
    tlm: Matrix,
    painted: Vec<Painted>,
}

/// Walk a decoded content stream.
pub fn walk<'r>(operations: &[Operation], resources: &'r PageResources<'r>) -> Vec<Painted> {
    let mut walker = Walker {
        resources,
        state: GraphicsState {
            ctm: Matrix::IDENTITY,
            text: TextState::default(),
        },
        stack: Vec::new(),
        tm: Matrix::IDENTITY,
        tlm: Matrix::IDENTITY,
        painted: Vec::new(),
    };
    for (index, op) in operations.iter().enumerate() {
        walker.step(index, op);
    }
    walker.painted
}

impl<'r> Walker<'r> {
    fn step(&mut self, index: usize, op: &Operation) {
        let args = op.operands.as_slice();
        let arg = |i: usize| args.get(i).and_then(number);

        match op.operator.as_str() {
            "q" => self.stack.push(self.state),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(args) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = args.first() {
                    self.state.text.font = self.resources.fonts.get(name);
                }
                if let Some(size) = arg(1) {
                    self.state.text.size = size;
                }
            }
            "TL" => self.set(arg(0), |t, v| t.leading = v),
            "Tc" => self.set(arg(0), |t, v| t.char_spacing = v),
            "Tw" => self.set(arg(0), |t, v| t.word_spacing = v),
            "Tz" => self.set(arg(0), |t, v| t.scale = v / 100.0),
            "Ts" => self.set(arg(0), |t, v| t.rise = v),
            "Td" => {
                if let (Some(tx), Some(ty)) = (arg(0), arg(1)) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (arg(0), arg(1)) {
                    self.state.text.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(args) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(string @ Object::String(..)) = args.first() {
                    self.show(index, std::slice::from_ref(string));
                }
            }
            "'" => {
                self.next_line();
                if let Some(string @ Object::String(..)) = args.first() {
                    self.show(index, std::slice::from_ref(string));
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (arg(0), arg(1)) {
                    self.state.text.word_spacing = aw;
                    self.state.text.char_spacing = ac;
                }
                self.next_line();
                if let Some(string @ Object::String(..)) = args.get(2) {
                    self.show(index, std::slice::from_ref(string));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = args.first() {
                    self.show(index, items);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = args.first() {
                    if let Some(id) = self.resources.images.get(name) {
                        self.painted.push(Painted::Image(ImageDraw {
                            op_index: index,
                            name: name.clone(),
                            object_id: *id,
                            rect: self.state.ctm.transform_rect(0.0, 0.0, 1.0, 1.0),
                        }));
                    }
                }
            }
            _ => {}
        }
    }

    fn set(&mut self, value: Option<f64>, apply: impl FnOnce(&mut TextState<'r>, f64)) {
        if let Some(v) = value {
            apply(&mut self.state.text, v);
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    /// Paint the strings and adjustments of a `TJ` array (or a single string).
    fn show(&mut self, index: usize, items: &[Object]) {
        let text_state = self.state.text;
        let font = text_state.font;
        let two_byte = font.is_some_and(|font| font.two_byte);
        let trm = self.tm.then(&self.state.ctm);
        let low = text_state.rise - DESCENT * text_state.size;
        let high = text_state.rise + ASCENT * text_state.size;
        let em = text_state.size * text_state.scale;
        let thousandths = |width: f64| if em != 0.0 { width * 1000.0 / em } else { 0.0 };

        let mut text = String::new();
        let mut glyphs = Vec::new();
        let mut advance = 0.0;

        for (item_index, item) in items.iter().enumerate() {
            match item {
                Object::String(bytes, _) => {
                    for (range, decoded) in decode_glyphs(bytes, font) {
                        let mut width = AVG_GLYPH_WIDTH * text_state.size + text_state.char_spacing;
                        // word spacing applies to the single-byte code 32 only
                        if !two_byte && bytes[range.start..range.end] == [b' '] {
                            width += text_state.word_spacing;
                        }
                        width *= text_state.scale;
                        text.push_str(&decoded);
                        glyphs.push(Glyph {
                            item: item_index,
                            bytes: range,
                            rect: trm.transform_rect(advance, low, advance + width, high),
                            advance_thousandths: thousandths(width),
                        });
                        advance += width;
                    }
                }
                other => {
                    if let Some(adjust) = number(other) {
                        if adjust <= -WORD_GAP && !text.is_empty() && !text.ends_with(' ') {
                            text.push(' ');
                        }
                        advance -= adjust / 1000.0 * text_state.size * text_state.scale;
                    }
                }
            }
        }

        let rect = trm.transform_rect(0.0, low, advance, high);
        let (_, baseline) = trm.apply(0.0, text_state.rise);

        self.painted.push(Painted::Text(TextShow {
            op_index: index,
            text,
            font_size: text_state.size * trm.vertical_scale(),
            flags: font.map(|font| font.flags).unwrap_or_default(),
            rect,
            baseline,
            advance_thousandths: thousandths(advance),
            glyphs,
        }));

        self.tm = Matrix::translate(advance, 0.0).then(&self.tm);
    }
}

/// Split a string operand into glyph codes and decode each one.
///
/// Codes are one byte, or two for composite fonts. A code goes through the
/// font's encoding when there is one; otherwise, or if the encoding cannot
/// map it, single bytes read as Latin-1 and pairs as big-endian UTF-16.
fn decode_glyphs(bytes: &[u8], font: Option<&FontInfo<'_>>) -> Vec<(Range<usize>, String)> {
    let width = if font.is_some_and(|font| font.two_byte) { 2 } else { 1 };
    let encoding = font.and_then(|font| font.encoding.as_ref());
    (0..bytes.len())
        .step_by(width)
        .map(|start| {
            let range = start..(start + width).min(bytes.len());
            let code = &bytes[range.clone()];
            let decoded = encoding
                .and_then(|encoding| Document::decode_text(encoding, code).ok())
                .unwrap_or_else(|| decode_raw(code));
            (range, decoded.chars().filter(|c| !c.is_control()).collect())
        })
        .collect()
}

fn decode_raw(code: &[u8]) -> String {
    match *code {
        [byte] => char::from(byte).to_string(),
        [high, low] => char::from_u32(u32::from(u16::from_be_bytes([high, low])))
            .map(String::from)
            .unwrap_or_default(),
        _ => String::new(),
    }
}
