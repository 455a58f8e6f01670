//! Events the stage reports back to the host.
//!
//! Pointer input is resolved to agent ids and queued; the host drains the
//! queue once per frame.

use serde::{Deserialize, Serialize};

use logflock_core::types::AgentId;

/// Something the user did to a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StageEvent {
    /// A character was clicked.
    Click(AgentId),
    /// The pointer moved onto a character, or off all of them (`None`).
    Hover(Option<AgentId>),
}

impl StageEvent {
    /// The agent this event is about, if any.
    #[must_use]
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            Self::Click(id) => Some(*id),
            Self::Hover(id) => *id,
        }
    }
}
