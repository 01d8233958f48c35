// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image deduplicator — fingerprints embedded images and flags exact repeats,
// tiny images, and decorative header/footer banners.

use std::collections::HashSet;

use pagescrub_core::{PageImage, Rect, RemovalReason, Thresholds};
use sha2::{Digest, Sha256};

/// 128-bit content hash over an image's leading sample bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Hash the first `prefix` bytes of `samples` (all of them if shorter).
    pub fn of_samples(samples: &[u8], prefix: usize) -> Self {
        let head = &samples[..samples.len().min(prefix)];
        let digest = Sha256::digest(head);
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fingerprints of images already kept earlier in the document.
///
/// Grows monotonically in page order. New fingerprints are staged while a
/// page is being classified and only become visible once the page is
/// finished, so an image never counts as a duplicate of itself.
#[derive(Debug, Default)]
pub struct SeenFingerprints {
    seen: HashSet<Fingerprint>,
    staged: HashSet<Fingerprint>,
}

impl SeenFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Queue a fingerprint for registration at the end of the page.
    pub fn stage(&mut self, fingerprint: Fingerprint) {
        self.staged.insert(fingerprint);
    }

    /// Publish everything staged on the page just classified.
    pub fn finish_page(&mut self) -> usize {
        let added = self.staged.len();
        self.seen.extend(self.staged.drain());
        added
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Decision for one placement of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVerdict {
    /// Keep it; its fingerprint is staged for registration.
    Keep,
    Remove(RemovalReason),
}

/// Header and footer bands of the page being processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBands {
    pub header: Rect,
    pub footer: Rect,
}

impl PageBands {
    pub fn contains_part_of(&self, rect: &Rect) -> bool {
        self.header.intersects(rect) || self.footer.intersects(rect)
    }
}

/// Applies the image rules in order: too small, duplicate, decorative, keep.
#[derive(Debug, Clone)]
pub struct ImageDeduplicator {
    fingerprint_prefix: usize,
    min_area: u64,
    decorative_area: u64,
}

impl ImageDeduplicator {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            fingerprint_prefix: thresholds.fingerprint_prefix,
            min_area: thresholds.min_image_area,
            decorative_area: thresholds.decorative_image_area,
        }
    }

    pub fn fingerprint(&self, image: &PageImage) -> Fingerprint {
        Fingerprint::of_samples(&image.samples, self.fingerprint_prefix)
    }

    /// Judge a single placement rectangle.
    pub fn judge(
        &self,
        fingerprint: Fingerprint,
        pixel_area: u64,
        placement: &Rect,
        bands: &PageBands,
        seen: &mut SeenFingerprints,
    ) -> ImageVerdict {
        if pixel_area < self.min_area {
            return ImageVerdict::Remove(RemovalReason::SmallImage);
        }
        if seen.contains(&fingerprint) {
            return ImageVerdict::Remove(RemovalReason::DuplicateImage);
        }
        if pixel_area < self.decorative_area && bands.contains_part_of(placement) {
            return ImageVerdict::Remove(RemovalReason::DecorativeImage);
        }
        seen.stage(fingerprint);
        ImageVerdict::Keep
    }

    /// Judge every placement of `image`, returning the rectangles to remove.
    pub fn judge_image(
        &self,
        image: &PageImage,
        bands: &PageBands,
        seen: &mut SeenFingerprints,
    ) -> Vec<(Rect, RemovalReason)> {
        let fingerprint = self.fingerprint(image);
        let area = image.pixel_area();
        image
            .placements
            .iter()
            .filter_map(|rect| match self.judge(fingerprint, area, rect, bands, seen) {
                ImageVerdict::Keep => None,
                ImageVerdict::Remove(reason) => Some((*rect, reason)),
            })
            .collect()
    }
}
