//! View properties.
//!
//! Each property owns one LLM-API structural invariant and exposes two pure
//! operations: the positions at which the sequence may be cut or extended
//! without violating the invariant, and an idempotent validation that
//! filters or augments a sequence into compliance.
//!
//! Properties hold inductively when the condenser manipulates the log only
//! at safe indices; validation is the fallback for histories produced by
//! retries, edits, or misbehaving condensers. Every silent repair is
//! reported through `tracing`.

mod batch_atomicity;
mod condensation;
mod matching;
mod tool_loop;
mod uniqueness;

pub use batch_atomicity::BatchAtomicityProperty;
pub use condensation::{CondensationOutcome, CondensationProperty};
pub use matching::ToolCallMatchingProperty;
pub use tool_loop::ToolLoopAtomicityProperty;
pub use uniqueness::ToolResultUniquenessProperty;

pub(crate) use condensation::summary_event;

use prism_model::Event;

use crate::indices::SafeIndexSet;

/// One structural invariant over a sequence of events.
///
/// Both operations are free of observable side effects. `validate` receives
/// the current (possibly already filtered) sequence together with the full
/// raw log, so properties that need context outside the current sequence
/// (batch membership, say) stay stateless.
pub trait ViewProperty {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Positions in `[0, n]` at which an insertion or a cut keeps this
    /// property intact.
    fn safe_indices(&self, events: &[Event]) -> SafeIndexSet;

    /// Return a sequence satisfying this property. Idempotent:
    /// `validate(validate(x)) == validate(x)`.
    fn validate(&self, current: Vec<Event>, raw: &[Event]) -> Vec<Event>;
}

/// The engine's property set, in builder application order: condensation
/// semantics first so matching and batching see the final id set, then
/// orphan filtering, duplicate-result normalization, batch repair, and the
/// (index-only) tool-loop property.
pub fn standard_properties() -> Vec<Box<dyn ViewProperty>> {
    vec![
        Box::new(CondensationProperty),
        Box::new(ToolCallMatchingProperty::default()),
        Box::new(ToolResultUniquenessProperty),
        Box::new(BatchAtomicityProperty),
        Box::new(ToolLoopAtomicityProperty),
    ]
}
