//! sensorgatt - a BLE GATT sensor profile server engine
//!
//! This library turns application domain events (a new measurement, the
//! result of a control command) into correctly ordered, MTU-safe Attribute
//! Protocol traffic, and turns inbound peer writes into validated
//! application requests. The attribute database, the ATT/L2CAP transport
//! and pairing are external collaborators reached through small traits;
//! profiles (cycling power, location & navigation) plug in as static field
//! and opcode tables.

pub mod codec;
pub mod constants;
pub mod control;
pub mod error;
pub mod profiles;
pub mod server;

// Re-export common types for convenience
pub use codec::{decode, encode, split, FeatureMask, FieldDescriptor, FieldTable, Measurement, Split};
pub use control::{pack_response, ControlRequest, Operand, OpcodeSpec, OpcodeTable, ResponseStatus};
pub use error::{AttStatus, ProfileError, ProfileResult, TransportError};
pub use server::{
    AttributeStore, CccKind, CccValue, CharacteristicId, CharacteristicSpec, ConfigSnapshot,
    ConnectionId, EnableParams, EngineState, FeatureConfig, Handle, Operation, ProfileDefinition,
    ProfileEvent, ProfileServer, PushKind, SecurityLevel, Transport, TransportEvent,
};
