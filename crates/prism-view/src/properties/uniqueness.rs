//! Tool-result uniqueness: each tool call keeps exactly one result.
//!
//! Restarts and races can record several observations for one tool call,
//! typically an agent-error followed by the real result. Only consecutive
//! duplicates are normalized; duplicates separated by other events point
//! at a deeper bug and are left visible.

use prism_model::{Event, EventId, EventKind, ObservationOutcome};
use tracing::warn;

use crate::indices::SafeIndexSet;
use crate::properties::ViewProperty;

#[derive(Debug, Clone, Copy, Default)]
pub struct ToolResultUniquenessProperty;

fn outcome_of(event: &Event) -> Option<ObservationOutcome> {
    match &event.kind {
        EventKind::Observation { outcome, .. } => Some(*outcome),
        _ => None,
    }
}

/// Collapse one run of consecutive observations sharing a tool-call id.
///
/// Preference order: success > user rejection > agent error, most recent
/// first within each class. When a success coexists with agent errors,
/// the error texts are folded into the kept observation so the LLM still
/// sees what happened.
fn collapse_group(group: &[Event]) -> Event {
    let last_of = |wanted: ObservationOutcome| {
        group
            .iter()
            .rev()
            .find(|event| outcome_of(event) == Some(wanted))
    };

    let errors: Vec<&str> = group
        .iter()
        .filter_map(|event| match &event.kind {
            EventKind::Observation {
                outcome: ObservationOutcome::AgentError,
                content,
                ..
            } => Some(content.as_str()),
            _ => None,
        })
        .collect();

    if let Some(base) = last_of(ObservationOutcome::Success) {
        if errors.is_empty() {
            return base.clone();
        }
        let EventKind::Observation {
            tool_call_id,
            tool_name,
            content,
            outcome,
        } = &base.kind
        else {
            return base.clone();
        };
        let notes: Vec<String> = errors
            .iter()
            .map(|error| format!("[Note: {error}]"))
            .collect();
        return Event::with_id(
            EventId::new(format!("{}-merged", base.id)),
            base.timestamp,
            EventKind::Observation {
                tool_call_id: tool_call_id.clone(),
                tool_name: tool_name.clone(),
                content: format!("{}\n\n{}", notes.join("\n"), content),
                outcome: *outcome,
            },
        );
    }
    if let Some(base) = last_of(ObservationOutcome::UserRejection) {
        return base.clone();
    }
    // Only agent errors remain; the group is never empty.
    group
        .iter()
        .rev()
        .find(|event| event.is_observation())
        .cloned()
        .unwrap_or_else(|| group[group.len() - 1].clone())
}

impl ViewProperty for ToolResultUniquenessProperty {
    fn name(&self) -> &'static str {
        "tool-result-uniqueness"
    }

    /// No boundary restrictions; normalization is filtering only.
    fn safe_indices(&self, events: &[Event]) -> SafeIndexSet {
        SafeIndexSet::full(events.len())
    }

    fn validate(&self, current: Vec<Event>, _raw: &[Event]) -> Vec<Event> {
        let mut result: Vec<Event> = Vec::with_capacity(current.len());
        let mut i = 0;
        while i < current.len() {
            let event = &current[i];
            if !event.is_observation() {
                result.push(event.clone());
                i += 1;
                continue;
            }
            let call_id = event.tool_call_id();
            let mut j = i + 1;
            while j < current.len()
                && current[j].is_observation()
                && current[j].tool_call_id() == call_id
            {
                j += 1;
            }
            if j - i == 1 {
                result.push(event.clone());
            } else {
                warn!(
                    tool_call_id = %call_id.map(|id| id.as_str()).unwrap_or_default(),
                    duplicates = j - i,
                    "collapsing consecutive duplicate observations"
                );
                result.push(collapse_group(&current[i..j]));
            }
            i = j;
        }
        result
    }
}
