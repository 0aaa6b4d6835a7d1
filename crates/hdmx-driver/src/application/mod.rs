//! Application layer: the connector that speaks the switch's line protocol
//! over a transport, and the session orchestrator that keeps exactly one
//! connector alive per connection attempt.

pub mod connector;
pub mod session;

pub use connector::{CommandError, Connector, ConnectorEvent};
pub use session::{Session, SessionStatus, ZoneStateSink};
