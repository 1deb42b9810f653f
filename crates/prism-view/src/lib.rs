//! # prism-view — the View engine
//!
//! Projects a raw, append-only conversation event log into a well-formed
//! sequence for an LLM API, and computes the positions at which the log
//! may be cut (to fit a context window) or extended (by inserted
//! summaries) without breaking API structural invariants.
//!
//! Each invariant lives in its own [`properties::ViewProperty`]: batch
//! atomicity, tool-loop atomicity, tool-call matching, condensation
//! semantics, and tool-result uniqueness. The builder composes their
//! validations into the projection; the calculator intersects their safe
//! index sets into one sorted list for the condenser.
//!
//! The engine is a pure function of its input: no I/O, no shared state,
//! no mutation of the raw log. Distinct logs can be projected
//! concurrently without coordination.
//!
//! ```
//! use prism_model::{Event, EventKind, MessageSource};
//! use prism_view::View;
//!
//! let log = vec![Event::new(EventKind::Message {
//!     source: MessageSource::User,
//!     content: "hello".into(),
//! })];
//!
//! let view = View::from_events(&log);
//! assert_eq!(view.len(), 1);
//!
//! let indices = View::manipulation_indices(&log);
//! assert_eq!(indices.next_index(0, false), 0);
//! ```

pub mod batches;
pub mod indices;
pub mod properties;
pub mod view;

pub use batches::{ActionBatch, ActionBatchIndex};
pub use indices::{ManipulationIndexCalculator, ManipulationIndices, SafeIndexSet};
pub use properties::{
    BatchAtomicityProperty, CondensationOutcome, CondensationProperty, ToolCallMatchingProperty,
    ToolLoopAtomicityProperty, ToolResultUniquenessProperty, ViewProperty,
};
pub use view::View;
