//! Sliding-window selection for compaction.
//!
//! A window closes every `interval` events; `overlap` events from the
//! previous window are re-summarized for continuity. Windows smaller than
//! the configured minimum are not worth an LLM round-trip.

/// A half-open range `[start, end)` over an event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionWindow {
    pub start: usize,
    pub end: usize,
}

impl CompactionWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Compute the compaction window for a history of `n` events, or `None`
/// when no window is due.
///
/// `end` is the last closed window boundary (`floor(n / interval) *
/// interval`); `start` reaches back one interval plus the overlap.
pub fn compaction_window(
    n: usize,
    interval: usize,
    overlap: usize,
    min_events_to_compact: usize,
) -> Option<CompactionWindow> {
    debug_assert!(interval >= 1);
    let full_windows = n / interval;
    if full_windows == 0 {
        return None;
    }

    let end = full_windows * interval;
    let start = end.saturating_sub(interval + overlap);
    if end - start < min_events_to_compact {
        return None;
    }

    Some(CompactionWindow { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_window_before_first_interval() {
        assert_eq!(compaction_window(0, 3, 1, 1), None);
        assert_eq!(compaction_window(2, 3, 1, 1), None);
    }

    #[test]
    fn six_events_at_interval_boundary_is_below_min_six() {
        // full_windows=2, end=6, start=max(0, 6-3-1)=2, size 4 < 6.
        assert_eq!(compaction_window(6, 3, 1, 6), None);
    }

    #[test]
    fn window_size_is_capped_by_interval_plus_overlap() {
        // Growing the history never grows the window past interval+overlap,
        // so a min above that can never fire.
        for n in 6..40 {
            assert_eq!(compaction_window(n, 3, 1, 6), None);
        }
    }

    #[test]
    fn min_three_fires_with_expected_bounds() {
        let w = compaction_window(7, 3, 1, 3).unwrap();
        assert_eq!(w, CompactionWindow { start: 2, end: 6 });
        assert_eq!(w.len(), 4);

        let w = compaction_window(10, 3, 1, 3).unwrap();
        assert_eq!(w, CompactionWindow { start: 5, end: 9 });
    }

    #[test]
    fn start_clamps_to_zero_on_short_histories() {
        let w = compaction_window(3, 3, 4, 1).unwrap();
        assert_eq!(w, CompactionWindow { start: 0, end: 3 });
    }

    #[test]
    fn zero_overlap() {
        let w = compaction_window(9, 3, 0, 3).unwrap();
        assert_eq!(w, CompactionWindow { start: 6, end: 9 });
    }
}
