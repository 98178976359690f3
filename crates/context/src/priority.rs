//! Priority-ranked trimming.
//!
//! Projects events to messages, asks the external ranker to select under
//! the token budget, then lifts the selection back to events in their
//! original chronological order.

use adk_domain::{Event, Result};

use crate::adapter::events_to_messages;
use crate::ranker::MessageRanker;

/// Histories this short are returned unchanged; there is nothing
/// meaningful to rank.
const MIN_RANKABLE_MESSAGES: usize = 4;

/// Select a subset of `events` fitting `budget` by priority rank.
///
/// The result is always a chronological subsequence of the input. A
/// result that is not strictly smaller than the input means ranking
/// declined to trim; the caller is expected to fall back to FIFO.
pub async fn priority_trim(
    events: &[Event],
    budget: u32,
    ranker: &dyn MessageRanker,
) -> Result<Vec<Event>> {
    let (messages, event_indices) = events_to_messages(events);
    if messages.len() < MIN_RANKABLE_MESSAGES {
        return Ok(events.to_vec());
    }

    let selected = ranker.select_by_token_budget(&messages, budget).await?;

    // Lift message positions back to event positions, restore chronology,
    // and drop anything out of range or duplicated.
    let mut indices: Vec<usize> = selected
        .into_iter()
        .filter_map(|m| event_indices.get(m).copied())
        .collect();
    indices.sort_unstable();
    indices.dedup();

    Ok(indices.into_iter().map(|i| events[i].clone()).collect())
}
