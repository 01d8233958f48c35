// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text classifier — decides whether a single text span is watermark, branding,
// or promotional noise. Rules form an ordered list; the first rule that fires
// decides, and nothing that fires is ever reconsidered.

use pagescrub_core::error::Result;
use pagescrub_core::{RuleSet, StyleFlags, Thresholds};
use regex::{Regex, RegexBuilder};

/// Which rule removed a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Pattern,
    Keyword,
    SpamPhrase,
    LargeFontStamp,
}

/// Classification result for one span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Remove(RuleKind),
}

impl Verdict {
    pub fn is_remove(&self) -> bool {
        matches!(self, Verdict::Remove(_))
    }
}

/// Everything a rule may look at. `text` is already trimmed and lowercased.
#[derive(Debug, Clone, Copy)]
pub struct SpanFeatures<'a> {
    pub text: &'a str,
    pub font_size: f64,
    pub flags: StyleFlags,
    pub bbox_area: f64,
    pub page_area: f64,
}

/// A single classification rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Any regular expression matches.
    Pattern(Vec<Regex>),
    /// Any keyword occurs as a substring.
    Keyword(Vec<String>),
    /// Any promotional phrase occurs as a substring.
    SpamPhrase(Vec<String>),
    /// Large font confined to a tiny area: a stamped header/footer mark.
    LargeFontStamp { min_font_size: f64, max_area_ratio: f64 },
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Pattern(_) => RuleKind::Pattern,
            Rule::Keyword(_) => RuleKind::Keyword,
            Rule::SpamPhrase(_) => RuleKind::SpamPhrase,
            Rule::LargeFontStamp { .. } => RuleKind::LargeFontStamp,
        }
    }

    /// Whether this rule alone flags the span.
    pub fn matches(&self, span: &SpanFeatures<'_>) -> bool {
        match self {
            Rule::Pattern(patterns) => patterns.iter().any(|re| re.is_match(span.text)),
            Rule::Keyword(words) => words.iter().any(|word| span.text.contains(word.as_str())),
            Rule::SpamPhrase(phrases) => phrases
                .iter()
                .any(|phrase| span.text.contains(phrase.as_str())),
            Rule::LargeFontStamp {
                min_font_size,
                max_area_ratio,
            } => {
                if span.font_size <= *min_font_size {
                    return false;
                }
                let ratio = if span.page_area > 0.0 {
                    span.bbox_area / span.page_area
                } else {
                    0.0
                };
                ratio < *max_area_ratio
            }
        }
    }
}

/// Ordered, first-match-wins span classifier.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    rules: Vec<Rule>,
    min_chars: usize,
}

impl TextClassifier {
    /// Compile a rule set. Fails only if a pattern is not a valid regex.
    pub fn new(rule_set: &RuleSet, thresholds: &Thresholds) -> Result<Self> {
        let patterns = rule_set
            .patterns
            .iter()
            .map(|pattern| RegexBuilder::new(pattern).case_insensitive(true).build())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let lower = |list: &[String]| list.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();

        let rules = vec![
            Rule::Pattern(patterns),
            Rule::Keyword(lower(&rule_set.keywords)),
            Rule::SpamPhrase(lower(&rule_set.spam_phrases)),
            Rule::LargeFontStamp {
                min_font_size: thresholds.large_font_size,
                max_area_ratio: thresholds.max_stamp_area_ratio,
            },
        ];

        Ok(Self {
            rules,
            min_chars: thresholds.min_text_chars,
        })
    }

    /// Classifier built from the stock rule set and thresholds.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&RuleSet::default(), &Thresholds::default())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify one span. Total and side-effect free; with no signal the
    /// span is kept.
    pub fn classify(
        &self,
        text: &str,
        font_size: f64,
        flags: StyleFlags,
        bbox_area: f64,
        page_area: f64,
    ) -> Verdict {
        let lowered = text.trim().to_lowercase();
        if lowered.chars().count() < self.min_chars {
            return Verdict::Keep;
        }

        let features = SpanFeatures {
            text: &lowered,
            font_size,
            flags,
            bbox_area,
            page_area,
        };

        self.rules
            .iter()
            .find(|rule| rule.matches(&features))
            .map(|rule| Verdict::Remove(rule.kind()))
            .unwrap_or(Verdict::Keep)
    }

    /// Convenience wrapper returning only the keep/remove decision.
    pub fn should_remove(
        &self,
        text: &str,
        font_size: f64,
        flags: StyleFlags,
        bbox_area: f64,
        page_area: f64,
    ) -> bool {
        self.classify(text, font_size, flags, bbox_area, page_area)
            .is_remove()
    }
}
