//! Type definitions for the profile server engine

use crate::codec::{FeatureMask, FieldTable};
use crate::constants::*;
use crate::control::{ControlRequest, OpcodeTable};
use crate::error::{AttStatus, ProfileResult, TransportError};

/// Connection identity assigned by the lower transport.
pub type ConnectionId = u16;
/// Attribute handle in the GATT database.
pub type Handle = u16;

/// Link security level reported at enable time.
///
/// Pairing itself happens below this engine; the level is recorded per
/// connection for the application's benefit only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityLevel {
    #[default]
    None,
    Encrypted,
    Authenticated,
}

/// Kind of server-initiated value push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    Notification,
    Indication,
}

/// What a peer may write to a characteristic's CCC descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CccKind {
    Notify,
    Indicate,
}

/// A stored CCC value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CccValue {
    #[default]
    Stop,
    Notify,
    Indicate,
}

impl CccValue {
    pub fn raw(self) -> u16 {
        match self {
            CccValue::Stop => CCC_VALUE_STOP,
            CccValue::Notify => CCC_VALUE_NOTIFY,
            CccValue::Indicate => CCC_VALUE_INDICATE,
        }
    }
}

/// Engine-local identity of a configurable characteristic within a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicId(pub u8);

/// One CCC-bearing characteristic of a profile.
#[derive(Debug, Clone, Copy)]
pub struct CharacteristicSpec {
    pub id: CharacteristicId,
    pub ccc: CccKind,
    pub value_handle: Handle,
    pub ccc_handle: Handle,
    /// Bit in the optional-characteristic mask gating this characteristic;
    /// `None` means always present.
    pub optional_bit: Option<u32>,
}

/// Everything static about a profile: wire tables and attribute handles.
///
/// Handles and UUIDs are database layout, i.e. configuration supplied by the
/// application; the engine only routes by them.
#[derive(Debug, Clone)]
pub struct ProfileDefinition {
    pub name: &'static str,
    pub fields: &'static FieldTable,
    pub opcodes: OpcodeTable,
    pub characteristics: Vec<CharacteristicSpec>,
    /// The characteristic `notify` commands target.
    pub measurement: CharacteristicId,
    /// The control point characteristic, if the profile has one.
    pub control_point: Option<CharacteristicId>,
    /// Handle of the read-only feature characteristic value.
    pub feature_handle: Handle,
}

impl ProfileDefinition {
    pub fn characteristic(&self, id: CharacteristicId) -> Option<&CharacteristicSpec> {
        self.characteristics.iter().find(|spec| spec.id == id)
    }
}

/// Immutable service instance configuration fixed at database creation.
#[derive(Debug, Clone, Copy)]
pub struct FeatureConfig {
    pub features: FeatureMask,
    /// Which optional characteristics exist in this instance.
    pub optional_characteristics: u32,
}

/// Per-connection configuration snapshot: `(characteristic, value)` pairs.
pub type ConfigSnapshot = Vec<(CharacteristicId, CccValue)>;

/// Parameters of the `enable` command.
#[derive(Debug, Clone)]
pub struct EnableParams {
    pub conn: ConnectionId,
    pub security: SecurityLevel,
    /// Negotiated ATT MTU for this connection.
    pub mtu: u16,
    /// Configuration restored from a previous session (bonded peers).
    pub initial_config: ConfigSnapshot,
}

/// Inbound transport events demultiplexed by the engine.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Peer wrote an attribute value.
    Write {
        conn: ConnectionId,
        handle: Handle,
        offset: u16,
        value: Vec<u8>,
    },
    /// Peer read an attribute not cached in the database.
    Read { conn: ConnectionId, handle: Handle },
    /// A notification went out, or an indication was confirmed by the peer.
    SendComplete {
        conn: ConnectionId,
        kind: PushKind,
        status: AttStatus,
    },
    /// The link dropped.
    Disconnect { conn: ConnectionId },
}

/// Operation named in a completion report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Notify,
    ControlPoint,
}

/// Application-facing events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileEvent {
    /// A previously accepted operation finished.
    Complete {
        conn: ConnectionId,
        operation: Operation,
        status: AttStatus,
    },
    /// A peer changed a CCC descriptor.
    ConfigChanged {
        conn: ConnectionId,
        characteristic: CharacteristicId,
        value: CccValue,
    },
    /// A validated control point command awaiting `control_point_confirm`.
    ControlPointRequest {
        conn: ConnectionId,
        request: ControlRequest,
    },
    /// A connection was torn down; carries the last-known configuration.
    Disabled {
        conn: ConnectionId,
        config: ConfigSnapshot,
    },
}

/// Lower ATT/L2CAP transport as seen by the engine.
pub trait Transport {
    /// Push a characteristic value to the peer.
    fn send_value(
        &mut self,
        conn: ConnectionId,
        handle: Handle,
        kind: PushKind,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Answer a peer write.
    fn write_response(&mut self, conn: ConnectionId, handle: Handle, status: AttStatus);

    /// Answer a peer read.
    fn read_response(&mut self, conn: ConnectionId, handle: Handle, value: &[u8]);

    /// Answer a peer read with an error status.
    fn error_response(&mut self, conn: ConnectionId, handle: Handle, status: AttStatus);
}

/// Attribute database storage as seen by the engine.
pub trait AttributeStore {
    fn set_value(&mut self, handle: Handle, value: &[u8]) -> ProfileResult<()>;
    fn value(&self, handle: Handle) -> Option<Vec<u8>>;
}
