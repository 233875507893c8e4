//! Time-window selection and frame timelines.

use chrono::{DateTime, Duration, Utc};

use crate::schema::{TidySet, TimeWindow};

/// Span of the default window ending at the last timestamp.
pub const DEFAULT_WINDOW_MINUTES: f64 = 5.0;

/// Keep records with `start <= timestamp <= end`, preserving order.
pub fn select_window(set: &TidySet, window: &TimeWindow) -> TidySet {
    let records = set
        .iter()
        .filter(|r| window.contains(r.timestamp))
        .copied()
        .collect();
    TidySet::from_sorted(records)
}

/// Distinct timestamps in ascending order, one per animation frame.
pub fn build_timeline(set: &TidySet) -> Vec<DateTime<Utc>> {
    let mut timeline: Vec<_> = set.iter().map(|r| r.timestamp).collect();
    timeline.dedup();
    timeline
}

/// Fill in missing window bounds.
///
/// `end` defaults to the last timestamp of `set`, `start` to `end - span`,
/// clamped to the earliest representable instant.
/// Returns `None` only when `end` is absent and `set` is empty.
pub fn resolve_window(
    set: &TidySet,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    span: Duration,
) -> Option<TimeWindow> {
    let end = end.or_else(|| set.end())?;
    let start = start
        .unwrap_or_else(|| end.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC));
    Some(TimeWindow::new(start, end))
}

/// Window span from fractional minutes.
pub fn span_from_minutes(minutes: f64) -> Duration {
    Duration::microseconds((minutes * 60_000_000.0).round() as i64)
}

/// Inter-frame delay for a playback rate: `round(1000 / max(1, fps))`.
pub fn frame_delay_ms(fps: u32) -> u32 {
    (1000.0 / fps.max(1) as f64).round() as u32
}
