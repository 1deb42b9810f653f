//! Batch atomicity: all actions of one LLM response stand or fall together.
//!
//! Splitting a batch separates thinking blocks from their tool calls,
//! which LLM APIs reject. This property does not remove events on its own
//! initiative; it guarantees that when upstream policies (condensation,
//! matching) remove part of a batch, the rest of the batch and its paired
//! observations go too.

use std::collections::HashSet;

use prism_model::{Event, EventId, ToolCallId};
use tracing::warn;

use crate::batches::ActionBatchIndex;
use crate::indices::SafeIndexSet;
use crate::properties::ViewProperty;

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchAtomicityProperty;

impl ViewProperty for BatchAtomicityProperty {
    fn name(&self) -> &'static str {
        "batch-atomicity"
    }

    /// Positions strictly between a batch's first and last action are
    /// unsafe; the batch boundaries themselves are fine (cuts there keep
    /// the batch whole). Overlapping batch ranges (pathological input)
    /// are merged before removal.
    fn safe_indices(&self, events: &[Event]) -> SafeIndexSet {
        let index = ActionBatchIndex::from_events(events);
        let mut safe = SafeIndexSet::full(events.len());

        let mut ranges: Vec<(usize, usize)> = index
            .iter()
            .map(|(_, batch)| (batch.min_pos(), batch.max_pos()))
            .collect();
        ranges.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some((_, last_hi)) if lo <= *last_hi => *last_hi = (*last_hi).max(hi),
                _ => merged.push((lo, hi)),
            }
        }

        for (lo, hi) in merged {
            safe.remove_range(lo + 1..hi);
        }
        safe
    }

    /// Detect batches whose raw membership is only partially present in
    /// `current` and remove the survivors, along with the observations
    /// paired to the removed actions so the tool-call bijection is
    /// restored in the same pass.
    fn validate(&self, current: Vec<Event>, raw: &[Event]) -> Vec<Event> {
        let index = ActionBatchIndex::from_events(raw);
        if index.is_empty() {
            return current;
        }

        let current_action_ids: HashSet<&EventId> = current
            .iter()
            .filter(|event| event.is_action())
            .map(|event| &event.id)
            .collect();

        let mut actions_to_drop: HashSet<EventId> = HashSet::new();
        let mut calls_to_drop: HashSet<ToolCallId> = HashSet::new();

        for (response_id, batch) in index.iter() {
            let present = batch
                .action_ids
                .iter()
                .filter(|id| current_action_ids.contains(id))
                .count();
            if present == 0 || present == batch.len() {
                continue;
            }
            warn!(
                llm_response_id = %response_id,
                present,
                total = batch.len(),
                "partial action batch detected; removing the whole batch"
            );
            actions_to_drop.extend(batch.action_ids.iter().cloned());
            calls_to_drop.extend(batch.tool_call_ids.iter().cloned());
        }

        if actions_to_drop.is_empty() {
            return current;
        }

        current
            .into_iter()
            .filter(|event| {
                if event.is_action() {
                    return !actions_to_drop.contains(&event.id);
                }
                if event.is_observation() {
                    return event
                        .tool_call_id()
                        .is_none_or(|id| !calls_to_drop.contains(id));
                }
                true
            })
            .collect()
    }
}
