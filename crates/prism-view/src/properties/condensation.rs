//! Condensation semantics: forget marked events, strip meta-events, and
//! insert the most recent summary into the surviving sequence.

use std::collections::HashSet;

use prism_model::{Condensation, Event, EventId, EventKind, MessageSource};
use tracing::debug;

use crate::indices::SafeIndexSet;
use crate::properties::ViewProperty;

#[derive(Debug, Clone, Copy, Default)]
pub struct CondensationProperty;

/// Result of applying condensation semantics to a raw sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CondensationOutcome {
    /// Surviving events, with the latest summary (if any) inserted.
    pub events: Vec<Event>,
    /// Every condensation payload seen, in input order.
    pub condensations: Vec<Condensation>,
    /// True iff the last meta-event is a request no condensation has
    /// answered yet.
    pub unhandled_condensation_request: bool,
    /// Id of the synthetic summary event inserted into `events`, if any.
    pub summary_event_id: Option<EventId>,
}

/// Synthetic assistant message carrying a condensation summary. The id is
/// derived from the originating condensation event so repeated application
/// reproduces the same event.
pub(crate) fn summary_event(origin: &Event, condensation: &Condensation) -> Option<Event> {
    let summary = condensation.summary.as_deref().filter(|s| !s.is_empty())?;
    Some(Event::with_id(
        EventId::new(format!("{}-summary", origin.id)),
        origin.timestamp,
        EventKind::Message {
            source: MessageSource::Assistant,
            content: summary.to_owned(),
        },
    ))
}

impl CondensationProperty {
    /// Apply every condensation in input order: drop forgotten events and
    /// meta-events, then insert the most recent non-empty summary at its
    /// offset, clamped to the surviving sequence.
    pub fn apply(&self, events: &[Event]) -> CondensationOutcome {
        let mut forgotten: HashSet<&EventId> = HashSet::new();
        let mut condensations: Vec<Condensation> = Vec::new();
        for event in events {
            if let Some(condensation) = event.condensation() {
                condensations.push(condensation.clone());
                forgotten.extend(condensation.forgotten.iter());
            }
        }

        let mut kept: Vec<Event> = events
            .iter()
            .filter(|event| !event.is_meta() && !forgotten.contains(&event.id))
            .cloned()
            .collect();

        // Latest condensation with a summary wins; earlier summaries are
        // superseded wholesale.
        let mut summary_event_id = None;
        for event in events.iter().rev() {
            let Some(condensation) = event.condensation() else {
                continue;
            };
            if let Some(summary) = summary_event(event, condensation) {
                let offset = condensation.summary_offset.min(kept.len());
                debug!(offset, "inserting condensation summary");
                summary_event_id = Some(summary.id.clone());
                kept.insert(offset, summary);
                break;
            }
        }

        let mut unhandled = false;
        for event in events.iter().rev() {
            match event.kind {
                EventKind::Condensation(_) => break,
                EventKind::CondensationRequest => {
                    unhandled = true;
                    break;
                }
                _ => {}
            }
        }

        CondensationOutcome {
            events: kept,
            condensations,
            unhandled_condensation_request: unhandled,
            summary_event_id,
        }
    }
}

impl ViewProperty for CondensationProperty {
    fn name(&self) -> &'static str {
        "condensation"
    }

    /// No boundary restrictions: condensation works purely by filtering
    /// and insertion.
    fn safe_indices(&self, events: &[Event]) -> SafeIndexSet {
        SafeIndexSet::full(events.len())
    }

    fn validate(&self, current: Vec<Event>, _raw: &[Event]) -> Vec<Event> {
        self.apply(&current).events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, content: &str) -> Event {
        Event::with_id(
            id.into(),
            chrono::DateTime::from_timestamp(0, 0).unwrap(),
            EventKind::Message {
                source: MessageSource::User,
                content: content.into(),
            },
        )
    }

    fn condensation(id: &str, forgotten: &[&str], summary: Option<&str>, offset: usize) -> Event {
        Event::with_id(
            id.into(),
            chrono::DateTime::from_timestamp(0, 0).unwrap(),
            EventKind::Condensation(Condensation {
                forgotten: forgotten.iter().map(|f| EventId::new(*f)).collect(),
                summary: summary.map(Into::into),
                summary_offset: offset,
            }),
        )
    }

    fn request(id: &str) -> Event {
        Event::with_id(
            id.into(),
            chrono::DateTime::from_timestamp(0, 0).unwrap(),
            EventKind::CondensationRequest,
        )
    }

    fn contents(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .map(|e| match &e.kind {
                EventKind::Message { content, .. } => content.clone(),
                EventKind::System { content } => content.clone(),
                other => panic!("unexpected kind: {other:?}"),
            })
            .collect()
    }

    #[test]
    fn forgets_marked_events_and_inserts_summary() {
        let events = vec![
            message("id_0", "E0"),
            message("id_1", "E1"),
            message("id_5", "E5"),
            message("id_7", "E7"),
            message("id_10", "E10"),
            condensation("c1", &["id_5", "id_7"], Some("Earlier…"), 2),
        ];
        let outcome = CondensationProperty.apply(&events);
        assert_eq!(contents(&outcome.events), vec!["E0", "E1", "Earlier…", "E10"]);
        assert!(!outcome.unhandled_condensation_request);
        assert_eq!(outcome.condensations.len(), 1);
    }

    #[test]
    fn meta_events_never_survive() {
        let events = vec![
            request("q1"),
            message("m1", "hello"),
            condensation("c1", &[], None, 0),
        ];
        let outcome = CondensationProperty.apply(&events);
        assert_eq!(contents(&outcome.events), vec!["hello"]);
    }

    #[test]
    fn out_of_range_offset_clamps_to_end() {
        let events = vec![
            message("m1", "hello"),
            condensation("c1", &[], Some("S"), 99),
        ];
        let outcome = CondensationProperty.apply(&events);
        assert_eq!(contents(&outcome.events), vec!["hello", "S"]);
    }

    #[test]
    fn empty_summary_inserts_nothing() {
        let events = vec![
            message("m1", "hello"),
            condensation("c1", &[], Some(""), 0),
            condensation("c2", &[], None, 0),
        ];
        let outcome = CondensationProperty.apply(&events);
        assert_eq!(contents(&outcome.events), vec!["hello"]);
    }

    #[test]
    fn latest_summary_wins() {
        let events = vec![
            message("m1", "hello"),
            condensation("c1", &[], Some("old"), 0),
            condensation("c2", &[], Some("new"), 0),
        ];
        let outcome = CondensationProperty.apply(&events);
        assert_eq!(contents(&outcome.events), vec!["new", "hello"]);
        assert_eq!(outcome.summary_event_id, Some("c2-summary".into()));
    }

    #[test]
    fn forgotten_ids_accumulate_across_condensations() {
        let events = vec![
            message("m1", "one"),
            message("m2", "two"),
            condensation("c1", &["m1"], None, 0),
            message("m3", "three"),
            condensation("c2", &["m2"], None, 0),
        ];
        let outcome = CondensationProperty.apply(&events);
        assert_eq!(contents(&outcome.events), vec!["three"]);
    }

    #[test]
    fn trailing_request_is_unhandled() {
        let events = vec![
            message("m1", "hello"),
            condensation("c1", &[], None, 0),
            request("q1"),
        ];
        let outcome = CondensationProperty.apply(&events);
        assert!(outcome.unhandled_condensation_request);
    }

    #[test]
    fn answered_request_is_handled() {
        let events = vec![
            message("m1", "hello"),
            request("q1"),
            condensation("c1", &[], None, 0),
        ];
        let outcome = CondensationProperty.apply(&events);
        assert!(!outcome.unhandled_condensation_request);
    }

    #[test]
    fn summary_event_id_is_deterministic() {
        let events = vec![
            message("m1", "hello"),
            condensation("c1", &[], Some("S"), 0),
        ];
        let a = CondensationProperty.apply(&events);
        let b = CondensationProperty.apply(&events);
        assert_eq!(a.events, b.events);
        assert_eq!(a.events[0].id.as_str(), "c1-summary");
    }

    #[test]
    fn validate_is_idempotent() {
        let events = vec![
            message("m1", "hello"),
            condensation("c1", &[], Some("S"), 1),
        ];
        let property = CondensationProperty;
        let once = property.validate(events.clone(), &events);
        let twice = property.validate(once.clone(), &events);
        assert_eq!(once, twice);
    }
}
