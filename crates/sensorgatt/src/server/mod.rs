//! Profile server engine
//!
//! [`ProfileServer`](router::ProfileServer) is the per-service actor: it owns
//! one [`ConnectionContext`](connection) per enabled connection, turns
//! application commands into MTU-safe notifications and indications, and
//! routes inbound transport events back through the connection state machine.

pub mod config;
pub mod connection;
pub mod router;
pub mod types;


pub use self::config::ConfigurationStore;
pub use self::connection::EngineState;
pub use self::router::ProfileServer;
pub use self::types::{
    AttributeStore, CccKind, CccValue, CharacteristicId, CharacteristicSpec, ConfigSnapshot,
    ConnectionId, EnableParams, FeatureConfig, Handle, Operation, ProfileDefinition, ProfileEvent,
    PushKind, SecurityLevel, Transport, TransportEvent,
};
