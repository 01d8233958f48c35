// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration: the pattern rule set and the empirically tuned
// thresholds used by classification, deduplication, and section detection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// URL, domain, brand, and call-to-action signatures (regular expressions,
/// matched case-insensitively).
const DEFAULT_PATTERNS: &[&str] = &[
    r"https?://\S+",
    r"www\.\S+",
    r"Join Our WhatsApp Channel",
    r"For More Info Visit Cluesbook\.Com",
    r"cluesbook\.com",
    r"join telegram",
    r"subscribe",
    r"hamza anwar",
    r"team",
    r"institute",
    r"Copyright Pearson Prentice-Hall",
    r"CluesBook",
    r"VU Help Forum",
    r"telegram",
    r"whatsapp",
    r"channel",
    r"follow us",
    r"like us",
    r"share",
    r"click here",
];

const DEFAULT_KEYWORDS: &[&str] = &[
    "cluesbook",
    "hamza",
    "anwar",
    "team",
    "institute",
    "copyright",
    "pearson",
    "prentice-hall",
    "vu help forum",
    "vuhelp",
    "virtual university",
    "vu students",
];

const DEFAULT_SPAM_PHRASES: &[&str] = &[
    "join our",
    "visit us",
    "click here",
    "download now",
    "subscribe to",
    "follow our",
    "like our",
    "share this",
];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Static catalog of text signatures used by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Regular expressions; any match removes the span.
    pub patterns: Vec<String>,
    /// Watermark keywords; substring match on lowercased text.
    pub keywords: Vec<String>,
    /// Promotional phrases; substring match on lowercased text.
    pub spam_phrases: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            patterns: owned(DEFAULT_PATTERNS),
            keywords: owned(DEFAULT_KEYWORDS),
            spam_phrases: owned(DEFAULT_SPAM_PHRASES),
        }
    }
}

impl RuleSet {
    /// A rule set with no signatures; only the geometric heuristic applies.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            keywords: Vec::new(),
            spam_phrases: Vec::new(),
        }
    }
}

/// Numeric thresholds for the text and image heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Spans shorter than this (in characters, after trimming) are kept.
    pub min_text_chars: usize,
    /// Font size above which the large-font heuristic may fire.
    pub large_font_size: f64,
    /// Span area / page area below which a large-font span is a stamp.
    pub max_stamp_area_ratio: f64,
    /// Margin added on each side of a removed text span.
    pub text_margin: f64,
    /// Number of leading sample bytes hashed for an image fingerprint.
    pub fingerprint_prefix: usize,
    /// Images with fewer pixels than this are always removed.
    pub min_image_area: u64,
    /// Images below this pixel area are removed when in a header/footer.
    pub decorative_image_area: u64,
    /// Fraction of the page height treated as header.
    pub header_fraction: f64,
    /// Fraction of the page height treated as footer.
    pub footer_fraction: f64,
    /// Upper bound on text-search hits per page in directed mode.
    pub max_search_hits: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_text_chars: 2,
            large_font_size: 18.0,
            max_stamp_area_ratio: 0.005,
            text_margin: 2.0,
            fingerprint_prefix: 1000,
            min_image_area: 3000,
            decorative_image_area: 30000,
            header_fraction: 0.15,
            footer_fraction: 0.15,
            max_search_hits: 1000,
        }
    }
}

/// Settings for the section boundary detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    /// Leading pages checked for table-of-contents density.
    pub toc_scan_pages: usize,
    /// A leading page with more pattern hits than this is skipped.
    pub toc_max_hits: usize,
    /// Headings must start within this many characters of the page text.
    pub heading_window: usize,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            toc_scan_pages: 5,
            toc_max_hits: 3,
            heading_window: 100,
        }
    }
}

/// Complete configuration for a cleaning run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub rules: RuleSet,
    pub thresholds: Thresholds,
    pub sections: SectionConfig,
}

impl CleanerConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file written as JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }
}
