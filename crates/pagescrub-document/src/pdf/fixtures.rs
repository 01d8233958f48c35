// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small hand-built PDFs for tests: Courier text (F1), an Identity-H composite
// font with a ToUnicode map (F2), and one 100x50 grey image.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

pub struct Sample {
    pub operations: Vec<Operation>,
    pub with_image: bool,
    pub title: Option<&'static str>,
}

pub fn text(content: &str, size: i64, x: i64, y: i64) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new("Tj", vec![Object::string_literal(content)]),
        Operation::new("ET", vec![]),
    ]
}

/// Glyph ids of the composite font: U+0020..=U+007E map to 3..=97.
const FIRST_GID: u16 = 3;

const TO_UNICODE: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo <<
/Registry (Adobe)
/Ordering (UCS)
/Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0003> <0061> <0020>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

/// Text shown with the composite font F2, as two-byte glyph ids.
pub fn cid_text(content: &str, size: i64, x: i64, y: i64) -> Vec<Operation> {
    let codes: Vec<u8> = content
        .chars()
        .flat_map(|c| (c as u16 - 0x20 + FIRST_GID).to_be_bytes())
        .collect();
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F2".to_vec()), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new("Tj", vec![Object::String(codes, StringFormat::Hexadecimal)]),
        Operation::new("ET", vec![]),
    ]
}

pub fn image_at(x: i64, y: i64, w: i64, h: i64) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            [w, 0, 0, h, x, y].map(Object::Integer).to_vec(),
        ),
        Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

pub fn build_document(pages: Vec<Sample>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, TO_UNICODE.as_bytes().to_vec()));
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "ABCDEF+Arial",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "DW" => 500,
    });
    let type0_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "ABCDEF+Arial",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 100,
            "Height" => 50,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        (0..5000u32).map(|i| (i % 251) as u8).collect(),
    ));

    let mut kids = Vec::new();
    let mut title = None;
    for sample in pages {
        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id, "F2" => type0_id },
        };
        if sample.with_image {
            resources.set("XObject", dictionary! { "Im0" => image_id });
        }
        let bytes = Content {
            operations: sample.operations,
        }
        .encode()
        .unwrap();
        let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
        title = title.or(sample.title);
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => [0, 0, 595, 842].map(Object::Integer).to_vec(),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("Course Team"),
        });
        doc.trailer.set("Info", info_id);
    }
    doc
}

pub fn page(operations: Vec<Operation>) -> Sample {
    Sample {
        operations,
        with_image: false,
        title: None,
    }
}

/// Build and write a document to `path`.
pub fn write_pdf(path: &Path, pages: Vec<Sample>) {
    build_document(pages).save(path).unwrap();
}
