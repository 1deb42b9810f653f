//! Tool-loop atomicity.
//!
//! A tool loop starts at a batch whose first action carries thinking
//! blocks and extends forward through every consecutive action or
//! observation event. Providers with thinking enabled checksum the
//! placement of the opening thinking block against the rest of the loop,
//! so nothing may be cut or inserted strictly inside the span.
//!
//! This property participates only in index computation; removal respect
//! is guaranteed by batch atomicity plus the calculator's intersection.

use prism_model::Event;

use crate::batches::ActionBatchIndex;
use crate::indices::SafeIndexSet;
use crate::properties::ViewProperty;

#[derive(Debug, Clone, Copy, Default)]
pub struct ToolLoopAtomicityProperty;

fn is_loop_event(event: &Event) -> bool {
    event.is_action() || event.is_observation()
}

impl ViewProperty for ToolLoopAtomicityProperty {
    fn name(&self) -> &'static str {
        "tool-loop-atomicity"
    }

    fn safe_indices(&self, events: &[Event]) -> SafeIndexSet {
        let mut safe = SafeIndexSet::full(events.len());

        let index = ActionBatchIndex::from_events(events);
        let mut starts: Vec<usize> = index
            .iter()
            .filter(|(_, batch)| batch.has_thinking)
            .map(|(_, batch)| batch.min_pos())
            .collect();
        starts.sort_unstable();

        // A loop swallows every consecutive action/observation after its
        // opening batch, including later thinking batches; skip starts
        // already covered.
        let mut covered_until = 0usize;
        for start in starts {
            if start < covered_until {
                continue;
            }
            let mut last = start;
            while last + 1 < events.len() && is_loop_event(&events[last + 1]) {
                last += 1;
            }
            safe.remove_range(start + 1..last + 1);
            covered_until = last + 1;
        }
        safe
    }

    /// Identity: loops are never filtered here.
    fn validate(&self, current: Vec<Event>, _raw: &[Event]) -> Vec<Event> {
        current
    }
}
