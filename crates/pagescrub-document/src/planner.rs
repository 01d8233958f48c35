// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction planner — drives the per-page pass. In automatic mode it asks the
// text classifier and image deduplicator about every span and image; in
// directed mode it turns user-drawn actions into regions. Either way, regions
// are committed one page at a time, in ascending page order.

use pagescrub_core::error::{PageScrubError, Result};
use pagescrub_core::{
    ActionScope, CleanReport, CleanerConfig, DirectedAction, EditSummary, Page, Rect,
    RedactionRegion, RemovalReason, Thresholds,
};
use tracing::{debug, info, instrument, warn};

use crate::classify::TextClassifier;
use crate::dedup::{ImageDeduplicator, PageBands, SeenFingerprints};
use crate::source::SourceDocument;

/// Mutable state of one automatic run: the fingerprints seen so far and the
/// running report. Created fresh for every document.
#[derive(Debug)]
pub struct ScanState {
    pub seen: SeenFingerprints,
    pub report: CleanReport,
}

impl ScanState {
    pub fn new() -> Self {
        Self {
            seen: SeenFingerprints::new(),
            report: CleanReport::start(),
        }
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

/// Regions selected for a single page, not yet committed.
#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    pub page: usize,
    pub regions: Vec<RedactionRegion>,
    /// Images that could not be read and were left alone.
    pub skipped_images: usize,
}

/// Plans and commits removals on a [`SourceDocument`].
#[derive(Debug, Clone)]
pub struct RedactionPlanner {
    classifier: TextClassifier,
    dedup: ImageDeduplicator,
    thresholds: Thresholds,
}

impl RedactionPlanner {
    // -- Construction ---------------------------------------------------------

    pub fn new(config: &CleanerConfig) -> Result<Self> {
        Ok(Self {
            classifier: TextClassifier::new(&config.rules, &config.thresholds)?,
            dedup: ImageDeduplicator::new(&config.thresholds),
            thresholds: config.thresholds.clone(),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(&CleanerConfig::default())
    }

    pub fn classifier(&self) -> &TextClassifier {
        &self.classifier
    }

    // -- Automatic scan -------------------------------------------------------

    /// Classify every span and image on one page. Fingerprints of kept images
    /// are staged in `state` but not yet published.
    pub fn plan_page<D: SourceDocument + ?Sized>(
        &self,
        doc: &D,
        index: usize,
        state: &mut ScanState,
    ) -> Result<PagePlan> {
        let page = doc.page(index)?;
        let mut plan = PagePlan {
            page: index,
            ..PagePlan::default()
        };

        self.plan_text(&page, &mut plan);

        let bands = PageBands {
            header: page.header_region(self.thresholds.header_fraction),
            footer: page.footer_region(self.thresholds.footer_fraction),
        };

        for (image_index, image) in doc.page_images(index)?.into_iter().enumerate() {
            let image = match image {
                Ok(image) => image,
                Err(err) => {
                    warn!(page = index + 1, image_index, %err, "Skipping unreadable image");
                    plan.skipped_images += 1;
                    continue;
                }
            };
            for (rect, reason) in self.dedup.judge_image(&image, &bands, &mut state.seen) {
                plan.regions
                    .push(RedactionRegion::new(index, rect, reason, 0.0));
            }
        }

        Ok(plan)
    }

    fn plan_text(&self, page: &Page, plan: &mut PagePlan) {
        let page_area = page.area();
        for span in page.spans() {
            if span.text.trim().is_empty() {
                continue;
            }
            let verdict = self.classifier.classify(
                &span.text,
                span.font_size,
                span.flags,
                span.bbox.area(),
                page_area,
            );
            if verdict.is_remove() {
                debug!(page = page.number(), text = %span.text, ?verdict, "Text flagged");
                plan.regions.push(RedactionRegion::new(
                    page.index,
                    span.bbox,
                    RemovalReason::TextNoise,
                    self.thresholds.text_margin,
                ));
            }
        }
    }

    /// Clean the whole document in page order and return the run report.
    #[instrument(skip_all, fields(pages = doc.page_count()))]
    pub fn scan<D: SourceDocument + ?Sized>(&self, doc: &mut D) -> Result<CleanReport> {
        let mut state = ScanState::new();
        info!(run_id = %state.report.run_id, "Starting automatic clean");

        for index in 0..doc.page_count() {
            let plan = self.plan_page(&*doc, index, &mut state)?;
            self.commit_plan(doc, &plan, &mut state.report)?;
            state.seen.finish_page();
            state.report.pages += 1;
        }

        state.report.finish();
        info!(
            regions = state.report.total_regions(),
            skipped_images = state.report.skipped_images,
            fingerprints = state.seen.len(),
            "Automatic clean complete"
        );
        Ok(state.report)
    }

    fn commit_plan<D: SourceDocument + ?Sized>(
        &self,
        doc: &mut D,
        plan: &PagePlan,
        report: &mut CleanReport,
    ) -> Result<()> {
        report.skipped_images += plan.skipped_images;
        for region in &plan.regions {
            match doc.add_redaction(plan.page, region.target()) {
                Ok(()) => report.record(region.reason),
                Err(err) => {
                    warn!(page = plan.page + 1, reason = ?region.reason, %err, "Region not applied")
                }
            }
        }
        let applied = doc.apply_redactions(plan.page)?;
        debug!(page = plan.page + 1, applied, "Page committed");
        Ok(())
    }

    // -- Directed actions -----------------------------------------------------

    /// Check every action before anything is touched.
    pub fn validate_actions(&self, actions: &[DirectedAction], page_count: usize) -> Result<()> {
        for (index, action) in actions.iter().enumerate() {
            if let Some(bbox) = action.bbox {
                if bbox.iter().any(|v| !v.is_finite()) || bbox[2] < bbox[0] || bbox[3] < bbox[1] {
                    return Err(PageScrubError::InvalidAction {
                        index,
                        reason: format!("malformed bbox {bbox:?}"),
                    });
                }
            }
            if action.scope == ActionScope::CurrentPage
                && action.bbox.is_some()
                && (action.page == 0 || action.page > page_count)
            {
                return Err(PageScrubError::InvalidAction {
                    index,
                    reason: format!("page {} not in 1..={page_count}", action.page),
                });
            }
        }
        Ok(())
    }

    /// Apply user-directed actions in order.
    #[instrument(skip_all, fields(actions = actions.len(), pages = doc.page_count()))]
    pub fn apply_actions<D: SourceDocument + ?Sized>(
        &self,
        doc: &mut D,
        actions: &[DirectedAction],
    ) -> Result<EditSummary> {
        let page_count = doc.page_count();
        self.validate_actions(actions, page_count)?;

        let mut summary = EditSummary::default();
        for (index, action) in actions.iter().enumerate() {
            let applied = match action.scope {
                ActionScope::CurrentPage => self.apply_single(doc, action, &mut summary)?,
                ActionScope::AllPages if action.searches_text() => {
                    self.apply_search(doc, index, action, &mut summary)?
                }
                ActionScope::AllPages => self.apply_everywhere(doc, index, action, &mut summary)?,
            };
            if applied {
                summary.actions_applied += 1;
            } else {
                summary.actions_skipped += 1;
            }
        }

        info!(
            applied = summary.actions_applied,
            skipped = summary.actions_skipped,
            regions = summary.regions,
            "Directed edit complete"
        );
        Ok(summary)
    }

    fn apply_single<D: SourceDocument + ?Sized>(
        &self,
        doc: &mut D,
        action: &DirectedAction,
        summary: &mut EditSummary,
    ) -> Result<bool> {
        let Some(bbox) = action.bbox else {
            warn!(page = action.page, kind = ?action.kind, "Action has no bbox; skipped");
            return Ok(false);
        };
        let index = action.page - 1;
        let region = RedactionRegion::new(
            index,
            Rect::from_array(bbox),
            RemovalReason::ExplicitAction,
            0.0,
        );
        doc.add_redaction(index, region.target())?;
        doc.apply_redactions(index)?;
        summary.regions += 1;
        Ok(true)
    }

    fn apply_search<D: SourceDocument + ?Sized>(
        &self,
        doc: &mut D,
        action_index: usize,
        action: &DirectedAction,
        summary: &mut EditSummary,
    ) -> Result<bool> {
        if action.content.is_empty() {
            warn!(kind = ?action.kind, "Text action without content; skipped");
            return Ok(false);
        }

        let pages = doc.page_count();
        let mut failed = 0;
        for index in 0..pages {
            let hits = match doc.search_text(index, &action.content, self.thresholds.max_search_hits)
            {
                Ok(hits) => hits,
                Err(err) => {
                    warn!(page = index + 1, %err, "Text search failed; page skipped");
                    failed += 1;
                    continue;
                }
            };
            if hits.is_empty() {
                continue;
            }
            let mut added = 0;
            for rect in hits {
                match doc.add_redaction(index, rect) {
                    Ok(()) => added += 1,
                    Err(err) => warn!(page = index + 1, %err, "Search hit not applied"),
                }
            }
            match doc.apply_redactions(index) {
                Ok(_) => summary.regions += added,
                Err(err) => {
                    warn!(page = index + 1, %err, "Commit failed; page skipped");
                    failed += 1;
                    continue;
                }
            }
            debug!(page = index + 1, added, content = %action.content, "Text occurrences removed");
        }

        summary.failed_pages += failed;
        if pages > 0 && failed == pages {
            return Err(PageScrubError::AllPagesFailed {
                index: action_index,
                pages,
            });
        }
        Ok(true)
    }

    fn apply_everywhere<D: SourceDocument + ?Sized>(
        &self,
        doc: &mut D,
        action_index: usize,
        action: &DirectedAction,
        summary: &mut EditSummary,
    ) -> Result<bool> {
        let Some(bbox) = action.bbox else {
            warn!(kind = ?action.kind, "Replicated action has no bbox; skipped");
            return Ok(false);
        };
        let rect = Rect::from_array(bbox);
        let pages = doc.page_count();
        let mut failed = 0;

        for index in 0..pages {
            let outcome = doc
                .add_redaction(index, rect)
                .and_then(|()| doc.apply_redactions(index));
            match outcome {
                Ok(_) => summary.regions += 1,
                Err(err) => {
                    warn!(page = index + 1, %err, "Region not applicable; page skipped");
                    failed += 1;
                }
            }
        }

        summary.failed_pages += failed;
        if pages > 0 && failed == pages {
            return Err(PageScrubError::AllPagesFailed {
                index: action_index,
                pages,
            });
        }
        Ok(true)
    }
}
