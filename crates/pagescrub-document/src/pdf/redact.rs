// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream rewriting for redactions. Glyphs whose box centre lies in a
// region are cut out of their strings and replaced by `TJ` offsets of the same
// advance, so the rest of the line keeps its position. Image draws touching a
// region are dropped, and every region is painted over with an opaque white
// rectangle.

use lopdf::content::Operation;
use lopdf::Object;
use pagescrub_core::Rect;

use super::content::{Glyph, Painted, TextShow};

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn covers_centre(region: &Rect, glyph: &Glyph) -> bool {
    let cx = (glyph.rect.x0 + glyph.rect.x1) / 2.0;
    let cy = (glyph.rect.y0 + glyph.rect.y1) / 2.0;
    region.x0 <= cx && cx <= region.x1 && region.y0 <= cy && cy <= region.y1
}

/// The strings and numbers `op` shows, as the walker saw them.
fn shown_items(op: &Operation) -> &[Object] {
    let operand = match op.operator.as_str() {
        "TJ" => {
            return match op.operands.first() {
                Some(Object::Array(items)) => items.as_slice(),
                _ => &[],
            };
        }
        "\"" => op.operands.get(2..3),
        _ => op.operands.get(..1),
    };
    operand.unwrap_or(&[])
}

/// `TJ` items for `show` with the `hidden` glyphs cut out. Kept bytes stay
/// in strings of the original format; each cut run becomes one negative
/// offset so later glyphs land where they did before.
fn remaining_items(items: &[Object], show: &TextShow, hidden: &[bool]) -> Vec<Object> {
    let mut out = Vec::with_capacity(items.len() + 2);
    let mut glyphs = show.glyphs.iter().zip(hidden).peekable();

    for (index, item) in items.iter().enumerate() {
        let Object::String(bytes, format) = item else {
            out.push(item.clone());
            continue;
        };
        let mut kept: Vec<u8> = Vec::new();
        let mut gap = 0.0;
        while let Some((glyph, &cut)) = glyphs.next_if(|(glyph, _)| glyph.item == index) {
            if cut {
                if !kept.is_empty() {
                    out.push(Object::String(std::mem::take(&mut kept), *format));
                }
                gap -= glyph.advance_thousandths;
            } else {
                if gap != 0.0 {
                    out.push(real(gap));
                    gap = 0.0;
                }
                if let Some(code) = bytes.get(glyph.bytes.clone()) {
                    kept.extend_from_slice(code);
                }
            }
        }
        if !kept.is_empty() {
            out.push(Object::String(kept, *format));
        }
        if gap != 0.0 {
            out.push(real(gap));
        }
    }
    out
}

/// Replacement for a text-showing operator: the same line handling, then a
/// `TJ` with the remaining items.
fn reshow(op: &Operation, items: Vec<Object>) -> Vec<Operation> {
    let shown = Operation::new("TJ", vec![Object::Array(items)]);
    match op.operator.as_str() {
        "'" => vec![Operation::new("T*", vec![]), shown],
        "\"" => {
            let mut ops = Vec::with_capacity(4);
            if let Some(aw) = op.operands.first() {
                ops.push(Operation::new("Tw", vec![aw.clone()]));
            }
            if let Some(ac) = op.operands.get(1) {
                ops.push(Operation::new("Tc", vec![ac.clone()]));
            }
            ops.push(Operation::new("T*", vec![]));
            ops.push(shown);
            ops
        }
        _ => vec![shown],
    }
}

/// White fill covering one region, in user space.
fn cover(rect: &Rect) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]),
        Operation::new(
            "re",
            vec![
                real(rect.x0),
                real(rect.y0),
                real(rect.width()),
                real(rect.height()),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Result of rewriting one content stream.
#[derive(Debug, Clone, Default)]
pub struct Rewrite {
    pub operations: Vec<Operation>,
    /// Text-showing operators that lost at least one glyph.
    pub text_removed: usize,
    /// Glyphs cut out across those operators.
    pub glyphs_removed: usize,
    pub images_removed: usize,
}

enum Hit<'p> {
    Text(&'p TextShow, Vec<bool>),
    Image,
}

/// Rewrite `operations` so nothing painted inside `regions` survives.
///
/// `painted` must come from walking the same `operations`. Regions are in
/// PDF user space.
pub fn redact_operations(operations: Vec<Operation>, painted: &[Painted], regions: &[Rect]) -> Rewrite {
    let mut rewrite = Rewrite::default();
    let mut hits: Vec<Option<Hit<'_>>> = (0..operations.len()).map(|_| None).collect();
    for item in painted {
        let hit = match item {
            Painted::Text(show) => {
                let hidden: Vec<bool> = show
                    .glyphs
                    .iter()
                    .map(|glyph| regions.iter().any(|region| covers_centre(region, glyph)))
                    .collect();
                if !hidden.contains(&true) {
                    continue;
                }
                Hit::Text(show, hidden)
            }
            Painted::Image(draw) => {
                if !regions.iter().any(|region| region.intersects(&draw.rect)) {
                    continue;
                }
                Hit::Image
            }
        };
        if let Some(slot) = hits.get_mut(item.op_index()) {
            *slot = Some(hit);
        }
    }

    let mut out = Vec::with_capacity(operations.len() + 2 + regions.len() * 5);
    out.push(Operation::new("q", vec![]));
    for (op, hit) in operations.into_iter().zip(hits) {
        match hit {
            Some(Hit::Text(show, hidden)) => {
                let items = remaining_items(shown_items(&op), show, &hidden);
                out.extend(reshow(&op, items));
                rewrite.text_removed += 1;
                rewrite.glyphs_removed += hidden.iter().filter(|&&cut| cut).count();
            }
            Some(Hit::Image) => rewrite.images_removed += 1,
            None => out.push(op),
        }
    }
    out.push(Operation::new("Q", vec![]));
    for region in regions {
        out.extend(cover(region));
    }

    rewrite.operations = out;
    rewrite
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::content::{walk, PageResources};

    fn ops() -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
            Operation::new("Tj", vec![Object::string_literal("Visit www.spam.com")]),
            Operation::new("TL", vec![Object::Integer(14)]),
            Operation::new("'", vec![Object::string_literal("Body text")]),
            Operation::new("ET", vec![]),
        ]
    }

    #[test]
    fn covered_show_becomes_positioning() {
        let ops = ops();
        let painted = walk(&ops, &PageResources::default());
        let region = painted[0].rect().expand(2.0);
        let rewrite = redact_operations(ops, &painted, &[region]);

        assert_eq!(rewrite.text_removed, 1);
        let operators: Vec<&str> = rewrite.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(
            operators,
            vec!["q", "BT", "Tf", "Td", "TJ", "TL", "'", "ET", "Q", "q", "rg", "re", "f", "Q"]
        );
        // 18 glyphs * 500 thousandths each
        let Some(Object::Array(items)) = rewrite.operations[4].operands.first() else {
            panic!("expected TJ array");
        };
        assert_eq!(crate::pdf::content::number(&items[0]), Some(-9000.0));
    }

    #[test]
    fn quote_operator_keeps_line_advance() {
        let ops = ops();
        let painted = walk(&ops, &PageResources::default());
        let rewrite = redact_operations(ops, &painted, &[painted[1].rect()]);
        let operators: Vec<&str> = rewrite.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(&operators[6..9], &["T*", "TJ", "ET"]);
    }

    #[test]
    fn partial_hit_keeps_the_rest_of_the_string() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
            Operation::new("Tj", vec![Object::string_literal("Stacks and queues by CluesBook")]),
            Operation::new("ET", vec![]),
        ];
        let painted = walk(&ops, &PageResources::default());
        // glyphs are 5pt wide; "CluesBook" is glyphs 21..30
        let region = Rect::new(205.0, 698.0, 250.0, 708.0);
        let rewrite = redact_operations(ops, &painted, &[region]);

        assert_eq!(rewrite.text_removed, 1);
        assert_eq!(rewrite.glyphs_removed, 9);
        let shown = &rewrite.operations[4];
        assert_eq!(shown.operator, "TJ");
        let Some(Object::Array(items)) = shown.operands.first() else {
            panic!("expected TJ array");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Object::string_literal("Stacks and queues by "));
        assert_eq!(crate::pdf::content::number(&items[1]), Some(-4500.0));

        let walked = walk(&rewrite.operations, &PageResources::default());
        let Painted::Text(show) = &walked[0] else {
            panic!("expected text");
        };
        assert_eq!(show.text, "Stacks and queues by ");
        assert!((show.advance_thousandths - 15000.0).abs() < 1e-6);
    }

    #[test]
    fn cut_inside_tj_array_keeps_adjustments() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("abc"),
                    Object::Integer(-300),
                    Object::string_literal("de"),
                ])],
            ),
            Operation::new("ET", vec![]),
        ];
        let painted = walk(&ops, &PageResources::default());
        // "b" spans x 5..10
        let rewrite = redact_operations(ops, &painted, &[Rect::new(5.0, -2.0, 10.0, 8.0)]);
        let Some(Object::Array(items)) = rewrite.operations[3].operands.first() else {
            panic!("expected TJ array");
        };
        assert_eq!(items.len(), 5);
        assert_eq!(items[0], Object::string_literal("a"));
        assert_eq!(crate::pdf::content::number(&items[1]), Some(-500.0));
        assert_eq!(items[2], Object::string_literal("c"));
        assert_eq!(crate::pdf::content::number(&items[3]), Some(-300.0));
        assert_eq!(items[4], Object::string_literal("de"));
    }

    #[test]
    fn untouched_stream_only_gains_wrapper() {
        let ops = ops();
        let len = ops.len();
        let painted = walk(&ops, &PageResources::default());
        let rewrite = redact_operations(ops, &painted, &[]);
        assert_eq!(rewrite.operations.len(), len + 2);
        assert_eq!(rewrite.text_removed, 0);
    }
}
