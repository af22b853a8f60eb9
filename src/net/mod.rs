//! Networking: wire protocol, orchestrator link and broadcast relay

pub mod link;
pub mod protocol;
pub mod relay;

pub use link::RelayLink;
pub use protocol::{CommandMessage, EventMessage, SyncMessage, decode, encode};
pub use relay::Relay;
