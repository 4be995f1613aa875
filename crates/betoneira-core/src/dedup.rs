//! Greedy overlap suppression over pooled candidate regions.

use std::cmp::Ordering;

use crate::bbox::Region;

/// Overlap threshold above which two candidates count as the same object.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.4;

/// Reduce a pooled candidate list to a non-overlapping subset.
///
/// Candidates are sorted by raw contour area descending; the largest
/// remaining region is kept and every region overlapping it with
/// IoU >= `iou_threshold` is discarded. The tie-break is deliberately
/// area, not confidence: the three local strategies produce incomparable
/// confidence scales, and the largest contour tends to be the most
/// complete view of the machine.
///
/// Idempotent: running the function on its own output returns the same
/// set, since no two kept regions overlap above the threshold.
pub fn dedup_regions(mut regions: Vec<Region>, iou_threshold: f64) -> Vec<Region> {
    regions.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Region> = Vec::with_capacity(regions.len());
    for candidate in regions {
        let overlaps = kept
            .iter()
            .any(|k| k.bbox.iou(&candidate.bbox) >= iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
