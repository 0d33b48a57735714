/// Two timeline durations are considered equal when they differ by less
/// than this many seconds (1 ms).
pub const DURATION_TOLERANCE: f64 = 0.001;

/// A trimmed reference into one source video asset
///
/// Segments are produced only by the reconciler and consumed only by the
/// muxer; they reference assets by index into the request's ordered asset
/// list and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Index into the asset list the timeline was reconciled against
    pub asset: usize,

    /// Trim-in point in seconds, relative to the asset
    pub start: f64,

    /// Trim-out point in seconds, relative to the asset
    pub end: f64,
}

impl Segment {
    /// A segment covering the whole asset
    pub fn full(asset: usize, duration_secs: f64) -> Self {
        Self { asset, start: 0.0, end: duration_secs }
    }

    /// A segment trimmed from the start of the asset: `[0, end_secs]`
    pub fn head(asset: usize, end_secs: f64) -> Self {
        Self { asset, start: 0.0, end: end_secs }
    }

    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }
}

/// Ordered segment sequence plus an optional trailing filler
///
/// Invariant: `segments_secs() + filler_secs == target_secs` within
/// [`DURATION_TOLERANCE`] once the timeline has been balanced.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Segments in playback order
    pub segments: Vec<Segment>,

    /// Trailing black/silent filler duration, zero when the segments already
    /// cover the target
    pub filler_secs: f64,

    /// The duration the assembled video must match exactly
    pub target_secs: f64,
}

impl Timeline {
    /// Create an empty timeline for the given target duration
    pub fn new(target_secs: f64) -> Self {
        Self {
            segments: Vec::new(),
            filler_secs: 0.0,
            target_secs,
        }
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Total duration covered by segments alone
    pub fn segments_secs(&self) -> f64 {
        self.segments.iter().map(Segment::duration_secs).sum()
    }

    /// Total duration including trailing filler
    pub fn total_secs(&self) -> f64 {
        self.segments_secs() + self.filler_secs
    }

    /// How far the segments under-run the target (negative when they
    /// over-run)
    pub fn deficit_secs(&self) -> f64 {
        self.target_secs - self.segments_secs()
    }

    /// Absorb any segment under-run into the trailing filler so the total
    /// matches the target. Over-run slack is left to output truncation.
    pub fn balance(&mut self) {
        let deficit = self.deficit_secs();
        self.filler_secs = if deficit > DURATION_TOLERANCE { deficit } else { 0.0 };
    }

    /// Whether the total duration matches the target within tolerance
    pub fn is_balanced(&self) -> bool {
        (self.total_secs() - self.target_secs).abs() <= DURATION_TOLERANCE
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_duration() {
        let seg = Segment { asset: 0, start: 1.5, end: 4.0 };
        assert!((seg.duration_secs() - 2.5).abs() < f64::EPSILON);

        let full = Segment::full(2, 3.0);
        assert_eq!(full.start, 0.0);
        assert_eq!(full.end, 3.0);

        let head = Segment::head(1, 2.0);
        assert_eq!(head, Segment { asset: 1, start: 0.0, end: 2.0 });
    }

    #[test]
    fn test_balance_absorbs_deficit() {
        let mut timeline = Timeline::new(10.0);
        timeline.push(Segment::full(0, 9.5));

        timeline.balance();
        assert!((timeline.filler_secs - 0.5).abs() < 1e-9);
        assert!(timeline.is_balanced());
    }

    #[test]
    fn test_balance_ignores_subtolerance_deficit() {
        let mut timeline = Timeline::new(10.0);
        timeline.push(Segment::full(0, 10.0 - 0.0002));

        timeline.balance();
        assert_eq!(timeline.filler_secs, 0.0);
        assert!(timeline.is_balanced());
    }

    #[test]
    fn test_balance_leaves_overrun_to_truncation() {
        let mut timeline = Timeline::new(10.0);
        timeline.push(Segment::full(0, 10.2));

        timeline.balance();
        assert_eq!(timeline.filler_secs, 0.0);
    }
}
