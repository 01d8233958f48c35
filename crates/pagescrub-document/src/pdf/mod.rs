// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — layout extraction and redaction over `lopdf`.

pub mod content;
pub mod reader;
pub mod redact;

pub use reader::PdfDocument;

#[cfg(test)]
pub(crate) mod fixtures;
