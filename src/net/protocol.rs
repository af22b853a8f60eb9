//! Sync protocol
//!
//! JSON text frames discriminated by a top-level `command` field (intents sent
//! to an orchestrator) or `event` field (facts an orchestrator publishes).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::state::MoveIntent;

pub use crate::sim::state::GameEvent as EventMessage;

/// Intent addressed to an orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum CommandMessage {
    Start,
    Stop,
    Pause,
    Resume,
    /// Stop the current match and start a fresh one
    Restart,
    Move {
        #[serde(rename = "move")]
        intent: MoveIntent,
    },
}

/// Anything that travels over the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncMessage {
    Command(CommandMessage),
    Event(EventMessage),
}

impl From<CommandMessage> for SyncMessage {
    fn from(command: CommandMessage) -> Self {
        SyncMessage::Command(command)
    }
}

impl From<EventMessage> for SyncMessage {
    fn from(event: EventMessage) -> Self {
        SyncMessage::Event(event)
    }
}

pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode(text: &str) -> Result<SyncMessage> {
    Ok(serde_json::from_str(text)?)
}
