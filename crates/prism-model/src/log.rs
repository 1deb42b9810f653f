//! Append-only in-memory event log.
//!
//! The engine consumes events as an ordered read-only slice; this type is
//! the minimal owner of that sequence. Encoding is one JSON event per line,
//! matching how event records travel between collaborators.

use crate::error::{ViewError, ViewResult};
use crate::event::Event;

/// Ordered, append-only sequence of conversation events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    /// The full log in insertion order.
    pub fn events(&self) -> &[Event] {
        &self.events
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

    /// Decode a log from one-JSON-event-per-line text. Blank lines are
    /// skipped; any undecodable line fails the whole load.
    pub fn from_json_lines(text: &str) -> ViewResult<Self> {
        let mut log = Self::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(line).map_err(|err| {
                ViewError::MalformedInput(format!("line {}: {err}", line_no + 1))
            })?;
            log.append(event);
        }
        Ok(log)
    }

    /// Encode the log as one-JSON-event-per-line text.
    pub fn to_json_lines(&self) -> ViewResult<String> {
        let mut out = String::new();
        for event in &self.events {
            let line = serde_json::to_string(event)
                .map_err(|err| ViewError::Serialization(err.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
