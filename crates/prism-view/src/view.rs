//! The view builder.
//!
//! A [`View`] is the validated projection of a raw event log: the sequence
//! that is safe to submit to an LLM API, plus bookkeeping from the
//! condensation process. Views are derived values; compute one per request
//! and discard it.
//!
//! Validation order matters: condensation semantics run first so matching
//! and batching see the final id set, then orphan filtering, duplicate
//! result normalization, and batch repair. The filtering steps repeat
//! until the sequence is stable, since repairing one property can expose a
//! violation of another (each pass only removes events, so this
//! terminates).

use std::collections::HashSet;
use std::ops::Index;

use prism_model::{
    Condensation, Event, EventId, EventKind, MessageSource, ViewError, ViewResult,
};
use serde::{Deserialize, Serialize};

use crate::indices::{ManipulationIndexCalculator, ManipulationIndices};
use crate::properties::{
    summary_event, BatchAtomicityProperty, CondensationProperty, ToolCallMatchingProperty,
    ToolResultUniquenessProperty, ViewProperty,
};

/// Linearly ordered, validated view of a conversation event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// The validated sequence, ready for the LLM message formatter.
    pub events: Vec<Event>,
    /// True iff a condensation request is still waiting for a
    /// condensation.
    #[serde(default)]
    pub unhandled_condensation_request: bool,
    /// Condensation payloads processed to produce this view, in input
    /// order.
    #[serde(default)]
    pub condensations: Vec<Condensation>,
    /// Id of the summary event currently inserted in `events`, so a later
    /// condensation's summary can supersede it.
    #[serde(skip)]
    summary_event_id: Option<EventId>,
}

/// Run the filtering properties over a sequence until it is stable.
fn normalize(mut events: Vec<Event>, raw: &[Event]) -> Vec<Event> {
    let matching = ToolCallMatchingProperty::default();
    loop {
        let before = events.len();
        events = matching.validate(events, raw);
        events = ToolResultUniquenessProperty.validate(events, raw);
        events = BatchAtomicityProperty.validate(events, raw);
        if events.len() == before {
            return events;
        }
    }
}

impl View {
    /// Project a raw event log into a validated view.
    ///
    /// Orphaned tool calls, partial batches, duplicate results, and
    /// out-of-range summary offsets are silently normalized; each repair
    /// is reported through `tracing`.
    pub fn from_events(raw: &[Event]) -> View {
        let outcome = CondensationProperty.apply(raw);
        let events = normalize(outcome.events, raw);
        let view = View {
            events,
            unhandled_condensation_request: outcome.unhandled_condensation_request,
            condensations: outcome.condensations,
            summary_event_id: outcome.summary_event_id,
        };
        if cfg!(debug_assertions) {
            if let Err(err) = view.check_invariants() {
                panic!("view validation broke an invariant: {err}");
            }
        }
        view
    }

    /// As [`View::from_events`], but refuse sequences whose
    /// post-condensation events contain unmatched tool calls instead of
    /// filtering them.
    pub fn from_events_strict(raw: &[Event]) -> ViewResult<View> {
        let outcome = CondensationProperty.apply(raw);
        ToolCallMatchingProperty::strict().check(&outcome.events)?;
        Ok(Self::from_events(raw))
    }

    /// Positions in the raw sequence at which a cut or insertion violates
    /// no property. Computed on the raw log, not the validated view: the
    /// condenser chooses cut points in the history it owns.
    pub fn manipulation_indices(events: &[Event]) -> ManipulationIndices {
        ManipulationIndexCalculator::standard().compute(events)
    }

    /// Fold one event into the view.
    ///
    /// LLM-visible events append; a condensation request raises the
    /// unhandled flag; a condensation clears it, forgets marked events,
    /// and inserts its summary, superseding any summary inserted by an
    /// earlier condensation. Assumes events arrive in log order.
    pub fn push_event(&mut self, event: Event) {
        match &event.kind {
            EventKind::CondensationRequest => {
                self.unhandled_condensation_request = true;
            }
            EventKind::Condensation(condensation) => {
                let condensation = condensation.clone();
                self.unhandled_condensation_request = false;
                let forgotten: HashSet<&EventId> = condensation.forgotten.iter().collect();
                self.events.retain(|e| !forgotten.contains(&e.id));
                if let Some(summary) = summary_event(&event, &condensation) {
                    if let Some(stale) = self.summary_event_id.take() {
                        self.events.retain(|e| e.id != stale);
                    }
                    let offset = condensation.summary_offset.min(self.events.len());
                    self.summary_event_id = Some(summary.id.clone());
                    self.events.insert(offset, summary);
                }
                self.condensations.push(condensation);
            }
            _ => self.events.push(event),
        }
    }

    /// Re-run the filtering properties over the view's events. The
    /// fallback companion to [`View::push_event`] for histories not
    /// maintained at safe indices.
    pub fn enforce_properties(&mut self, raw: &[Event]) {
        let events = std::mem::take(&mut self.events);
        self.events = normalize(events, raw);
    }

    /// Verify the post-conditions of validation. Release builds skip
    /// this; a failure indicates an engine bug, not bad input.
    pub fn check_invariants(&self) -> ViewResult<()> {
        if let Some(event) = self.events.iter().find(|e| e.is_meta()) {
            return Err(ViewError::Invariant(format!(
                "meta-event {} present in validated view",
                event.id
            )));
        }

        let forgotten: HashSet<&EventId> = self
            .condensations
            .iter()
            .flat_map(|c| c.forgotten.iter())
            .collect();
        if let Some(event) = self.events.iter().find(|e| forgotten.contains(&e.id)) {
            return Err(ViewError::Invariant(format!(
                "forgotten event {} present in validated view",
                event.id
            )));
        }

        let mut action_calls = HashSet::new();
        let mut observation_calls = HashSet::new();
        for event in &self.events {
            if let Some(id) = event.tool_call_id() {
                if event.is_action() {
                    action_calls.insert(id);
                } else {
                    observation_calls.insert(id);
                }
            }
        }
        if action_calls != observation_calls {
            return Err(ViewError::Invariant(
                "tool-call bijection broken in validated view".into(),
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// The latest condensation processed, if any.
    pub fn most_recent_condensation(&self) -> Option<&Condensation> {
        self.condensations.last()
    }

    /// The summary inserted into this view, if any.
    pub fn most_recent_summary(&self) -> Option<&str> {
        self.condensations
            .iter()
            .rev()
            .find_map(|c| c.summary.as_deref().filter(|s| !s.is_empty()))
    }

    /// Position of the inserted summary event, if any.
    pub fn summary_event_index(&self) -> Option<usize> {
        let condensation = self.condensations.iter().rev().find(|c| c.has_summary())?;
        Some(
            condensation
                .summary_offset
                .min(self.events.len().saturating_sub(1)),
        )
    }

    /// The inserted summary event, if it is still present at its offset.
    pub fn summary_event(&self) -> Option<&Event> {
        let event = self.events.get(self.summary_event_index()?)?;
        let is_summary = matches!(
            event.kind,
            EventKind::Message {
                source: MessageSource::Assistant,
                ..
            }
        ) && event.id.as_str().ends_with("-summary");
        is_summary.then_some(event)
    }
}

impl Index<usize> for View {
    type Output = Event;

    fn index(&self, index: usize) -> &Event {
        &self.events[index]
    }
}

impl<'a> IntoIterator for &'a View {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
