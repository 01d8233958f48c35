// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run reports and the structured success/failure result handed back to
// callers of the job entry points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::RemovalReason;

/// Unique identifier for a cleaning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of an automatic cleaning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages: usize,
    pub text_regions: usize,
    pub small_images: usize,
    pub duplicate_images: usize,
    pub decorative_images: usize,
    /// Images that could not be read and were left untouched.
    pub skipped_images: usize,
}

impl CleanReport {
    pub fn start() -> Self {
        Self {
            run_id: RunId::new(),
            started_at: Utc::now(),
            finished_at: None,
            pages: 0,
            text_regions: 0,
            small_images: 0,
            duplicate_images: 0,
            decorative_images: 0,
            skipped_images: 0,
        }
    }

    pub fn record(&mut self, reason: RemovalReason) {
        match reason {
            RemovalReason::TextNoise => self.text_regions += 1,
            RemovalReason::SmallImage => self.small_images += 1,
            RemovalReason::DuplicateImage => self.duplicate_images += 1,
            RemovalReason::DecorativeImage => self.decorative_images += 1,
            RemovalReason::ExplicitAction => {}
        }
    }

    pub fn total_regions(&self) -> usize {
        self.text_regions + self.small_images + self.duplicate_images + self.decorative_images
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// Result of applying a list of directed actions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditSummary {
    pub actions_applied: usize,
    pub actions_skipped: usize,
    pub regions: usize,
    /// Pages where a replicated action could not be applied.
    pub failed_pages: usize,
}

/// Text left after dropping every span classified as noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanText {
    pub text: String,
    /// Number of pages that contributed at least one line.
    pub pages: usize,
}

/// Size of a single page in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Basic document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub pages: usize,
    pub page_size: Vec<PageSize>,
    pub title: String,
    pub author: String,
}

/// Structured outcome of a job: either success with a payload, or failure
/// with the error text. Serializes as a flat JSON object.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> JobOutcome<T> {
    pub fn from_result(result: Result<T>, message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                message: Some(message.into()),
                error: None,
                data: Some(data),
            },
            Err(err) => Self {
                success: false,
                message: None,
                error: Some(err.to_string()),
                data: None,
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PageScrubError;

    #[test]
    fn report_counts_by_reason() {
        let mut report = CleanReport::start();
        report.record(RemovalReason::TextNoise);
        report.record(RemovalReason::TextNoise);
        report.record(RemovalReason::DuplicateImage);
        report.record(RemovalReason::ExplicitAction);
        assert_eq!(report.text_regions, 2);
        assert_eq!(report.total_regions(), 3);
        assert!(report.finished_at.is_none());
        report.finish();
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn success_outcome_flattens_payload() {
        let text = CleanText {
            text: "--- Page 1 ---\nhello".into(),
            pages: 1,
        };
        let outcome = JobOutcome::from_result(Ok(text), "Text extracted successfully");
        let value: serde_json::Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["pages"], 1);
        assert_eq!(value["message"], "Text extracted successfully");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn failure_outcome_carries_error() {
        let outcome: JobOutcome<CleanText> = JobOutcome::from_result(
            Err(PageScrubError::Save("disk full".into())),
            "unused",
        );
        let value: serde_json::Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "failed to save document: disk full");
        assert!(value.get("message").is_none());
    }
}
