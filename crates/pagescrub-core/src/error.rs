// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pagescrub.

use thiserror::Error;

/// Top-level error type for all pagescrub operations.
///
/// Only document-level failures travel through this type as hard errors.
/// Per-image and per-page problems are logged and skipped by the callers that
/// produce them; see [`PageScrubError::is_element_local`].
#[derive(Debug, Error)]
pub enum PageScrubError {
    // -- Input errors --
    #[error("failed to open document {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("invalid action #{index}: {reason}")]
    InvalidAction { index: usize, reason: String },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // -- Per-element errors --
    #[error("image {image} on page {page} could not be read: {reason}")]
    ImageRead {
        page: usize,
        image: usize,
        reason: String,
    },

    #[error("action #{index} failed on every one of {pages} pages")]
    AllPagesFailed { index: usize, pages: usize },

    // -- Output --
    #[error("failed to save document: {0}")]
    Save(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PageScrubError {
    /// True for errors that only concern a single image or page and must not
    /// abort a run.
    pub fn is_element_local(&self) -> bool {
        matches!(self, Self::ImageRead { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PageScrubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_read_is_local() {
        let err = PageScrubError::ImageRead {
            page: 2,
            image: 0,
            reason: "truncated stream".into(),
        };
        assert!(err.is_element_local());
        assert!(err.to_string().contains("page 2"));
    }

    #[test]
    fn open_failure_is_fatal() {
        let err = PageScrubError::Open {
            path: "missing.pdf".into(),
            reason: "not found".into(),
        };
        assert!(!err.is_element_local());
    }

    #[test]
    fn bad_regex_converts() {
        let err: PageScrubError = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(err, PageScrubError::InvalidPattern(_)));
    }
}
