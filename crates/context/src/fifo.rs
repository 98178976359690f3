//! FIFO trimming — the recency-preserving fallback.

use adk_domain::Event;

use crate::estimate::estimate_event_tokens;

/// Return the longest suffix of `events` whose cumulative token estimate
/// fits `budget`. Never returns an empty slice for non-empty input: if
/// even the last event alone exceeds the budget, that single event is
/// kept anyway.
pub fn fifo_trim(events: &[Event], budget: u32) -> &[Event] {
    if events.is_empty() {
        return events;
    }

    let mut total: u64 = 0;
    let mut start = events.len();
    for (idx, event) in events.iter().enumerate().rev() {
        total += u64::from(estimate_event_tokens(event));
        if total > u64::from(budget) {
            break;
        }
        start = idx;
    }

    if start == events.len() {
        // Keep at least one.
        start = events.len() - 1;
    }
    &events[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use adk_domain::event::{Content, Part};

    fn event(id: &str, chars: usize) -> Event {
        Event {
            id: id.into(),
            invocation_id: "inv".into(),
            author: "user".into(),
            timestamp: 0.0,
            content: Some(Content {
                role: "user".into(),
                parts: vec![Part::Text("x".repeat(chars))],
            }),
            actions: None,
            error_message: None,
        }
    }

    /// Ten events of 500 tokens each under an effective budget of 1800
    /// keeps the last three (1500 tokens).
    #[test]
    fn tight_budget_keeps_newest_three() {
        let events: Vec<Event> = (0..10)
            .map(|i| event(&format!("e{i}"), 2000))
            .collect();
        let kept = fifo_trim(&events, 1800);
        let ids: Vec<&str> = kept.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e7", "e8", "e9"]);
    }

    #[test]
    fn result_is_a_contiguous_suffix() {
        let events: Vec<Event> = (0..6).map(|i| event(&format!("e{i}"), 100)).collect();
        for budget in [0, 25, 50, 100, 1000] {
            let kept = fifo_trim(&events, budget);
            assert!(!kept.is_empty());
            let offset = events.len() - kept.len();
            for (i, e) in kept.iter().enumerate() {
                assert_eq!(e.id, events[offset + i].id);
            }
        }
    }

    #[test]
    fn oversized_last_event_is_kept_anyway() {
        let events = vec![event("e0", 40), event("e1", 4000)];
        let kept = fifo_trim(&events, 10);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "e1");
    }

    #[test]
    fn everything_fits_returns_input_unchanged() {
        let events: Vec<Event> = (0..4).map(|i| event(&format!("e{i}"), 4)).collect();
        assert_eq!(fifo_trim(&events, 100).len(), 4);
    }

    #[test]
    fn monotone_in_budget() {
        let events: Vec<Event> = (0..8).map(|i| event(&format!("e{i}"), 120)).collect();
        let mut prev = 0;
        for budget in [10, 30, 60, 90, 120, 240, 1000] {
            let len = fifo_trim(&events, budget).len();
            assert!(len >= prev, "budget {budget} shrank the result");
            prev = len;
        }
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(fifo_trim(&[], 100).is_empty());
    }
}
