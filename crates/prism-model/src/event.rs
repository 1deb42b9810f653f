//! Event taxonomy for the agent-LLM conversation log.
//!
//! The raw log is an append-only sequence of [`Event`] records. Four kinds
//! are LLM-visible (system prompt material, messages, tool-call actions,
//! tool observations); two are meta-events produced by the condensation
//! machinery and never sent to the LLM.

use crate::ids::{EventId, LlmResponseId, ToolCallId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record in the conversation event log.
///
/// Events are immutable once appended. The engine reads `id` and `kind`;
/// the timestamp exists so the record is a complete audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    /// Create a new event with a fresh id and the current timestamp.
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: EventId::fresh(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Create an event with an explicit id and timestamp.
    pub fn with_id(id: EventId, timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self {
            id,
            timestamp,
            kind,
        }
    }

    /// True for condensation meta-events, which never reach the LLM.
    pub fn is_meta(&self) -> bool {
        matches!(
            self.kind,
            EventKind::CondensationRequest | EventKind::Condensation(_)
        )
    }

    pub fn is_action(&self) -> bool {
        matches!(self.kind, EventKind::Action { .. })
    }

    pub fn is_observation(&self) -> bool {
        matches!(self.kind, EventKind::Observation { .. })
    }

    /// Correlation id linking an action to its observation, if this event
    /// participates in tool-call matching.
    pub fn tool_call_id(&self) -> Option<&ToolCallId> {
        match &self.kind {
            EventKind::Action { tool_call_id, .. } => Some(tool_call_id),
            EventKind::Observation { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }

    /// The LLM response this action belongs to, if this is an action.
    pub fn llm_response_id(&self) -> Option<&LlmResponseId> {
        match &self.kind {
            EventKind::Action {
                llm_response_id, ..
            } => Some(llm_response_id),
            _ => None,
        }
    }

    /// True iff this is an action carrying non-empty thinking blocks.
    pub fn has_thinking(&self) -> bool {
        match &self.kind {
            EventKind::Action {
                thinking_blocks, ..
            } => !thinking_blocks.is_empty(),
            _ => false,
        }
    }

    /// The condensation payload, if this is a condensation commit.
    pub fn condensation(&self) -> Option<&Condensation> {
        match &self.kind {
            EventKind::Condensation(c) => Some(c),
            _ => None,
        }
    }
}

/// Discriminated union of conversation event types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    /// Initial system prompt material. Always retained.
    System { content: String },

    /// A user or assistant text message.
    Message {
        source: MessageSource,
        content: String,
    },

    /// An LLM-issued tool call.
    Action {
        llm_response_id: LlmResponseId,
        tool_call_id: ToolCallId,
        tool_name: String,
        arguments: serde_json::Value,
        /// Opaque provider thinking payloads. Only presence matters to
        /// the engine: a batch whose first action carries any starts a
        /// tool loop.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        thinking_blocks: Vec<serde_json::Value>,
    },

    /// The result of a tool call.
    Observation {
        tool_call_id: ToolCallId,
        tool_name: String,
        content: String,
        #[serde(default)]
        outcome: ObservationOutcome,
    },

    /// Marker that the condenser has been asked to shrink the context.
    /// Meta-event.
    CondensationRequest,

    /// A commit by the condenser. Meta-event.
    Condensation(Condensation),
}

/// Who authored a message event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    User,
    Assistant,
}

/// How a tool call concluded. The three flavors are equivalent for
/// matching purposes; uniqueness normalization prefers them in the order
/// success > user_rejection > agent_error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationOutcome {
    #[default]
    Success,
    UserRejection,
    AgentError,
}

/// A recorded decision by the condenser: forget a set of events and
/// optionally insert a summary into the surviving sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condensation {
    /// Events to drop from every future view.
    #[serde(default)]
    pub forgotten: Vec<EventId>,
    /// Narrative replacing the forgotten events, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Position in the surviving sequence (counted after removals) where
    /// the summary is inserted. Out-of-range values are clamped.
    #[serde(default)]
    pub summary_offset: usize,
}

impl Condensation {
    /// True iff this condensation carries a non-empty summary.
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(kind: EventKind) -> Event {
        Event::with_id(
            EventId::new("E1"),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            kind,
        )
    }

    #[test]
    fn message_roundtrip() {
        let event = make_event(EventKind::Message {
            source: MessageSource::User,
            content: "hello".into(),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Message\""));
        assert!(json.contains("\"source\":\"user\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn action_roundtrip_and_thinking_default() {
        let event = make_event(EventKind::Action {
            llm_response_id: LlmResponseId::new("resp_1"),
            tool_call_id: ToolCallId::new("call_1"),
            tool_name: "read_file".into(),
            arguments: serde_json::json!({"path": "/etc/hosts"}),
            thinking_blocks: vec![],
        });
        let json = serde_json::to_string(&event).unwrap();
        // Empty thinking blocks are omitted on the wire and default back in.
        assert!(!json.contains("thinking_blocks"));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
        assert!(!back.has_thinking());
    }

    #[test]
    fn action_with_thinking() {
        let event = make_event(EventKind::Action {
            llm_response_id: "resp_1".into(),
            tool_call_id: "call_1".into(),
            tool_name: "grep".into(),
            arguments: serde_json::json!({}),
            thinking_blocks: vec![serde_json::json!({"thinking": "hmm"})],
        });
        assert!(event.has_thinking());
        assert_eq!(event.llm_response_id().unwrap().as_str(), "resp_1");
        assert_eq!(event.tool_call_id().unwrap().as_str(), "call_1");
    }

    #[test]
    fn observation_outcome_defaults_to_success() {
        let json = r#"{"id":"E1","timestamp":"2024-01-01T00:00:00Z","kind":{"type":"Observation","tool_call_id":"call_1","tool_name":"grep","content":"ok"}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        match event.kind {
            EventKind::Observation { outcome, .. } => {
                assert_eq!(outcome, ObservationOutcome::Success);
            }
            _ => panic!("expected observation"),
        }
    }

    #[test]
    fn condensation_roundtrip() {
        let event = make_event(EventKind::Condensation(Condensation {
            forgotten: vec!["E5".into(), "E7".into()],
            summary: Some("Earlier work".into()),
            summary_offset: 2,
        }));
        assert!(event.is_meta());
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        let condensation = back.condensation().unwrap();
        assert_eq!(condensation.forgotten.len(), 2);
        assert!(condensation.has_summary());
    }

    #[test]
    fn condensation_request_is_meta() {
        let event = make_event(EventKind::CondensationRequest);
        assert!(event.is_meta());
        assert!(!event.is_action());
        assert!(event.tool_call_id().is_none());
    }

    #[test]
    fn empty_summary_is_no_summary() {
        let condensation = Condensation {
            forgotten: vec![],
            summary: Some(String::new()),
            summary_offset: 0,
        };
        assert!(!condensation.has_summary());
        assert!(!Condensation::default().has_summary());
    }
}
