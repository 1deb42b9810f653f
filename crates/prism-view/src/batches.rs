//! Action-batch index.
//!
//! Groups action events by the LLM response that produced them. Built in a
//! single left-to-right pass; positions are 0-based indices into the input
//! sequence.

use indexmap::IndexMap;
use prism_model::{Event, EventId, LlmResponseId, ToolCallId};

/// Positions and identity of the actions sharing one `LlmResponseId`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionBatch {
    /// Positions of the batch's actions, in input order.
    pub positions: Vec<usize>,
    /// Event ids of the batch's actions, in input order.
    pub action_ids: Vec<EventId>,
    /// Tool-call ids of the batch's actions, in input order.
    pub tool_call_ids: Vec<ToolCallId>,
    /// True iff the first action in the batch carries non-empty thinking
    /// blocks.
    pub has_thinking: bool,
}

impl ActionBatch {
    pub fn min_pos(&self) -> usize {
        self.positions.first().copied().unwrap_or_default()
    }

    pub fn max_pos(&self) -> usize {
        self.positions.last().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Index of all action batches in a sequence, keyed by `LlmResponseId` in
/// first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct ActionBatchIndex {
    batches: IndexMap<LlmResponseId, ActionBatch>,
}

impl ActionBatchIndex {
    /// Build the index in one pass over the sequence.
    pub fn from_events(events: &[Event]) -> Self {
        let mut batches: IndexMap<LlmResponseId, ActionBatch> = IndexMap::new();

        for (position, event) in events.iter().enumerate() {
            let (Some(response_id), Some(tool_call_id)) =
                (event.llm_response_id(), event.tool_call_id())
            else {
                continue;
            };
            let batch = batches
                .entry(response_id.clone())
                .or_insert_with(|| ActionBatch {
                    positions: Vec::new(),
                    action_ids: Vec::new(),
                    tool_call_ids: Vec::new(),
                    has_thinking: event.has_thinking(),
                });
            batch.positions.push(position);
            batch.action_ids.push(event.id.clone());
            batch.tool_call_ids.push(tool_call_id.clone());
        }

        Self { batches }
    }

    pub fn get(&self, id: &LlmResponseId) -> Option<&ActionBatch> {
        self.batches.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LlmResponseId, &ActionBatch)> {
        self.batches.iter()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
