use tracing::debug;

use crate::error::TimelineError;
use crate::media::VideoAsset;
use crate::timeline::types::{Segment, Timeline, DURATION_TOLERANCE};

/// Reconcile a list of eligible video assets against a target duration.
///
/// Produces an ordered segment sequence whose total duration equals
/// `target_secs` within [`DURATION_TOLERANCE`]:
///
/// - **Under-run** (assets sum to less than the target): the asset list is
///   repeated cyclically in original order, appending whole-asset segments;
///   the segment that would cross the target is trimmed from its start so
///   the cumulative sum lands exactly on the target. Repetition across
///   passes is intentional, not an error.
/// - **Over-run**: assets are walked once in order, appending whole-asset
///   segments while the running total stays below the target; the asset that
///   would cross is trimmed to the remaining duration and the rest are
///   dropped.
/// - **Exact match**: every asset is appended unmodified.
///
/// The only failure is an empty input list, which signals the caller to
/// invoke the fallback generator. Zero-length assets must have been filtered
/// out by the loader's eligibility rule before this stage.
///
/// Deterministic: identical assets (order and durations) and target produce
/// an identical segment sequence on every run.
pub fn reconcile(
    assets: &[VideoAsset],
    target_secs: f64,
) -> std::result::Result<Timeline, TimelineError> {
    if assets.is_empty() {
        return Err(TimelineError::EmptyInput);
    }

    let total_available: f64 = assets.iter().map(|a| a.duration_secs).sum();
    let mut timeline = Timeline::new(target_secs);

    if (total_available - target_secs).abs() <= DURATION_TOLERANCE {
        for (index, asset) in assets.iter().enumerate() {
            timeline.push(Segment::full(index, asset.duration_secs));
        }
        debug!(
            "Exact match: {} assets cover {:.3}s target unmodified",
            assets.len(),
            target_secs
        );
    } else if total_available < target_secs {
        extend_cyclically(&mut timeline, assets, target_secs);
        debug!(
            "Under-run: extended {} assets ({:.3}s available) to {} segments covering {:.3}s",
            assets.len(),
            total_available,
            timeline.len(),
            target_secs
        );
    } else {
        trim_in_order(&mut timeline, assets, target_secs);
        debug!(
            "Over-run: trimmed {} assets ({:.3}s available) to {} segments covering {:.3}s",
            assets.len(),
            total_available,
            timeline.len(),
            target_secs
        );
    }

    debug_assert!(timeline.is_balanced());
    Ok(timeline)
}

/// Round-robin over the asset list until the target is met; the final
/// segment is trimmed so the cumulative sum equals the target exactly.
fn extend_cyclically(timeline: &mut Timeline, assets: &[VideoAsset], target_secs: f64) {
    let mut accumulated = 0.0;
    let mut index = 0usize;

    while target_secs - accumulated > DURATION_TOLERANCE {
        let slot = index % assets.len();
        let asset = &assets[slot];
        let remaining = target_secs - accumulated;

        if asset.duration_secs <= remaining {
            timeline.push(Segment::full(slot, asset.duration_secs));
            accumulated += asset.duration_secs;
        } else {
            timeline.push(Segment::head(slot, remaining));
            accumulated = target_secs;
        }

        index += 1;
    }
}

/// Single ordered pass; the asset that would cross the target is trimmed to
/// the remaining duration and all subsequent assets are dropped.
fn trim_in_order(timeline: &mut Timeline, assets: &[VideoAsset], target_secs: f64) {
    let mut accumulated = 0.0;

    for (index, asset) in assets.iter().enumerate() {
        let remaining = target_secs - accumulated;

        if remaining <= DURATION_TOLERANCE {
            break;
        }

        if asset.duration_secs <= remaining {
            timeline.push(Segment::full(index, asset.duration_secs));
            accumulated += asset.duration_secs;
        } else {
            timeline.push(Segment::head(index, remaining));
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn assets(durations: &[f64]) -> Vec<VideoAsset> {
        durations
            .iter()
            .enumerate()
            .map(|(i, &duration_secs)| VideoAsset {
                path: PathBuf::from(format!("clip_{i}.mp4")),
                duration_secs,
                width: 1920,
                height: 1080,
                fps: 30.0,
            })
            .collect()
    }

    fn total(timeline: &Timeline) -> f64 {
        timeline.segments_secs()
    }

    #[test]
    fn test_empty_input_signals_fallback() {
        let result = reconcile(&[], 6.0);
        assert!(matches!(result, Err(TimelineError::EmptyInput)));
    }

    #[test]
    fn test_under_run_cycles_in_order() {
        // Scenario: [3.0, 4.0] against 10.0 -> full, full, then the first
        // asset again trimmed to the remaining 3.0
        let assets = assets(&[3.0, 4.0]);
        let timeline = reconcile(&assets, 10.0).unwrap();

        assert_eq!(
            timeline.segments,
            vec![
                Segment { asset: 0, start: 0.0, end: 3.0 },
                Segment { asset: 1, start: 0.0, end: 4.0 },
                Segment { asset: 0, start: 0.0, end: 3.0 },
            ]
        );
        assert!((total(&timeline) - 10.0).abs() <= DURATION_TOLERANCE);
    }

    #[test]
    fn test_under_run_trims_final_segment() {
        let assets = assets(&[4.0]);
        let timeline = reconcile(&assets, 10.0).unwrap();

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.segments[2], Segment { asset: 0, start: 0.0, end: 2.0 });
        assert!((total(&timeline) - 10.0).abs() <= DURATION_TOLERANCE);
    }

    #[test]
    fn test_under_run_loops_many_passes() {
        // Intentional repetition: a single short clip loops until satisfied
        let assets = assets(&[0.5]);
        let timeline = reconcile(&assets, 6.0).unwrap();

        assert_eq!(timeline.len(), 12);
        assert!(timeline.segments.iter().all(|s| s.asset == 0));
        assert!((total(&timeline) - 6.0).abs() <= DURATION_TOLERANCE);
    }

    #[test]
    fn test_over_run_trims_first_crossing_asset() {
        // Scenario: [8.0, 8.0] against 5.0 -> first asset trimmed to 5.0,
        // second dropped
        let assets = assets(&[8.0, 8.0]);
        let timeline = reconcile(&assets, 5.0).unwrap();

        assert_eq!(timeline.segments, vec![Segment { asset: 0, start: 0.0, end: 5.0 }]);
        assert!((total(&timeline) - 5.0).abs() <= DURATION_TOLERANCE);
    }

    #[test]
    fn test_over_run_keeps_leading_whole_assets() {
        let assets = assets(&[2.0, 3.0, 8.0, 1.0]);
        let timeline = reconcile(&assets, 7.0).unwrap();

        assert_eq!(
            timeline.segments,
            vec![
                Segment { asset: 0, start: 0.0, end: 2.0 },
                Segment { asset: 1, start: 0.0, end: 3.0 },
                Segment { asset: 2, start: 0.0, end: 2.0 },
            ]
        );
        assert!((total(&timeline) - 7.0).abs() <= DURATION_TOLERANCE);
    }

    #[test]
    fn test_exact_match_appends_unmodified() {
        let assets = assets(&[2.5, 3.5, 4.0]);
        let timeline = reconcile(&assets, 10.0).unwrap();

        assert_eq!(timeline.len(), 3);
        assert!(timeline
            .segments
            .iter()
            .zip(&assets)
            .all(|(seg, a)| seg.start == 0.0 && seg.end == a.duration_secs));
        assert!((total(&timeline) - 10.0).abs() <= DURATION_TOLERANCE);
    }

    #[test]
    fn test_single_asset_exactly_target() {
        // Boundary: one asset equal to the target yields one untrimmed segment
        let assets = assets(&[10.0]);
        let timeline = reconcile(&assets, 10.0).unwrap();

        assert_eq!(timeline.segments, vec![Segment { asset: 0, start: 0.0, end: 10.0 }]);
    }

    #[test]
    fn test_asset_completing_target_exactly_drops_rest() {
        let assets = assets(&[5.0, 8.0]);
        let timeline = reconcile(&assets, 5.0).unwrap();

        assert_eq!(timeline.segments, vec![Segment { asset: 0, start: 0.0, end: 5.0 }]);
    }

    #[test]
    fn test_idempotence() {
        let assets = assets(&[3.3, 1.7, 2.9]);
        let first = reconcile(&assets, 20.0).unwrap();
        let second = reconcile(&assets, 20.0).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_tolerance_fractional_durations() {
        let assets = assets(&[1.1, 2.7, 0.3]);
        for target in [3.0, 4.1, 8.25, 17.6] {
            let timeline = reconcile(&assets, target).unwrap();
            assert!(
                (total(&timeline) - target).abs() <= DURATION_TOLERANCE,
                "target {target} missed: {}",
                total(&timeline)
            );
        }
    }

    #[test]
    fn test_no_filler_from_reconciliation() {
        let assets = assets(&[4.0, 4.0]);
        let timeline = reconcile(&assets, 6.0).unwrap();
        assert_eq!(timeline.filler_secs, 0.0);
    }
}
