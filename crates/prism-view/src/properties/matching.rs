//! Tool-call matching: every retained action has its observation and
//! vice versa.
//!
//! LLM APIs reject tool calls without results and results without calls.
//! The default mode silently filters orphans (warning through `tracing`);
//! strict mode reports them instead.

use std::collections::HashSet;

use prism_model::{Event, ToolCallId, ViewError, ViewResult};
use tracing::warn;

use crate::indices::SafeIndexSet;
use crate::properties::ViewProperty;

#[derive(Debug, Clone, Copy, Default)]
pub struct ToolCallMatchingProperty {
    /// When set, `check` refuses sequences with orphans instead of
    /// letting `validate` filter them.
    pub strict: bool,
}

impl ToolCallMatchingProperty {
    pub fn strict() -> Self {
        Self { strict: true }
    }

    fn sides(events: &[Event]) -> (HashSet<ToolCallId>, HashSet<ToolCallId>) {
        let mut action_ids = HashSet::new();
        let mut observation_ids = HashSet::new();
        for event in events {
            if let Some(id) = event.tool_call_id() {
                if event.is_action() {
                    action_ids.insert(id.clone());
                } else {
                    observation_ids.insert(id.clone());
                }
            }
        }
        (action_ids, observation_ids)
    }

    fn unmatched_counts(events: &[Event]) -> (usize, usize) {
        let (action_ids, observation_ids) = Self::sides(events);
        let mut actions = 0;
        let mut observations = 0;
        for event in events {
            let Some(id) = event.tool_call_id() else {
                continue;
            };
            if event.is_action() && !observation_ids.contains(id) {
                actions += 1;
            } else if event.is_observation() && !action_ids.contains(id) {
                observations += 1;
            }
        }
        (actions, observations)
    }

    /// Error on unmatched ids when in strict mode; lenient instances
    /// always pass.
    pub fn check(&self, events: &[Event]) -> ViewResult<()> {
        if !self.strict {
            return Ok(());
        }
        match Self::unmatched_counts(events) {
            (0, 0) => Ok(()),
            (unmatched_actions, unmatched_observations) => Err(ViewError::Matching {
                unmatched_actions,
                unmatched_observations,
            }),
        }
    }
}

impl ViewProperty for ToolCallMatchingProperty {
    fn name(&self) -> &'static str {
        "tool-call-matching"
    }

    /// No boundary restrictions: this property works purely by filtering.
    fn safe_indices(&self, events: &[Event]) -> SafeIndexSet {
        SafeIndexSet::full(events.len())
    }

    /// Keep every non-action/observation event; keep an action iff some
    /// observation shares its tool-call id, and symmetrically. Duplicate
    /// ids count as matched as long as a counterpart exists. Relative
    /// order is preserved.
    fn validate(&self, current: Vec<Event>, _raw: &[Event]) -> Vec<Event> {
        let (unmatched_actions, unmatched_observations) = Self::unmatched_counts(&current);
        if unmatched_actions == 0 && unmatched_observations == 0 {
            return current;
        }
        warn!(
            unmatched_actions,
            unmatched_observations,
            "filtering unmatched tool calls; condensation may have split an action/observation pair"
        );

        let (action_ids, observation_ids) = Self::sides(&current);
        current
            .into_iter()
            .filter(|event| match event.tool_call_id() {
                Some(id) if event.is_action() => observation_ids.contains(id),
                Some(id) if event.is_observation() => action_ids.contains(id),
                _ => true,
            })
            .collect()
    }
}
