//! Identifier types for the conversation event model.
//!
//! Each id is an opaque string wrapper: the engine compares and hashes
//! them but never looks inside, so provider-issued ids, UUIDs, and ULIDs
//! all work. `fresh()` mints a random UUID v4 when the caller has nothing
//! better.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_types {
    ($($(#[$docs:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$docs])*
            #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Wrap an existing identifier value.
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                /// Mint a fresh random identifier.
                pub fn fresh() -> Self {
                    Self(Uuid::new_v4().to_string())
                }

                pub fn as_str(&self) -> &str {
                    self.0.as_str()
                }

                pub fn into_string(self) -> String {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self::new(value)
                }
            }
        )+
    };
}

id_types! {
    /// Identity of a single event in the log.
    EventId,
    /// Ties together every action emitted by one LLM response; all
    /// actions sharing one value form an atomic batch.
    LlmResponseId,
    /// Correlates a tool-call action with its observation.
    ToolCallId,
}
