//! # prism-model — conversation event contract
//!
//! Shared types consumed by the view engine and its collaborators (agent
//! loop, condenser policies, persistence). Intentionally dependency-light:
//! pure data, no runtime deps.
//!
//! ## Module Overview
//!
//! - [`ids`] — Typed ID wrappers (EventId, LlmResponseId, ToolCallId)
//! - [`event`] — Event envelope + EventKind tagged union
//! - [`log`] — Append-only in-memory event log with JSON-lines encoding
//! - [`error`] — ViewError, ViewResult

pub mod error;
pub mod event;
pub mod ids;
pub mod log;

pub use error::{ViewError, ViewResult};
pub use event::{Condensation, Event, EventKind, MessageSource, ObservationOutcome};
pub use ids::{EventId, LlmResponseId, ToolCallId};
pub use log::EventLog;
