//! Per-connection context and state machine
//!
//! At most one operation is outstanding per connection: either a notification
//! (possibly with a buffered continuation fragment) or a control point
//! procedure awaiting its response indication's confirmation. Anything that
//! arrives meanwhile is deferred to a bounded queue and re-delivered once the
//! link returns to `Connected`; nothing is reordered past an in-flight
//! operation.

use super::config::ConfigurationStore;
use super::types::*;
use crate::codec::{split, FeatureMask, Measurement};
use crate::constants::*;
use crate::control::pack_response;
use crate::error::{AttStatus, ProfileError, ProfileResult};
use log::{debug, warn};
use std::collections::VecDeque;

/// Externally visible state of a connection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No attribute database yet.
    Disabled,
    /// Database exists, connection not enabled.
    Idle,
    Connected,
    Busy,
    WaitForConfirm,
}

/// The single outstanding operation while `Busy`.
#[derive(Debug)]
pub(crate) enum PendingOp {
    /// A notification went out; `continuation` holds the buffered second
    /// fragment until the first one's send-complete arrives.
    Notify { continuation: Option<Vec<u8>> },
    /// A control point command was forwarded to the application.
    Procedure { opcode: u8 },
}

#[derive(Debug)]
pub(crate) enum LinkState {
    Connected,
    Busy(PendingOp),
    /// A response indication is on the air; `notify_app` is false for
    /// locally generated error responses, which complete silently.
    WaitForConfirm { opcode: u8, notify_app: bool },
}

/// An event parked behind an in-flight operation.
#[derive(Debug)]
pub(crate) enum Deferred {
    ControlWrite { handle: Handle, value: Vec<u8> },
    Notify(Measurement),
}

/// Exclusive per-connection state, owned by the `ProfileServer`.
#[derive(Debug)]
pub(crate) struct ConnectionContext {
    pub(crate) conn: ConnectionId,
    pub(crate) mtu: u16,
    #[allow(dead_code)]
    pub(crate) security: SecurityLevel,
    pub(crate) state: LinkState,
    pub(crate) config: ConfigurationStore,
    pub(crate) deferred: VecDeque<Deferred>,
}

impl ConnectionContext {
    pub(crate) fn new(params: &EnableParams, mut config: ConfigurationStore) -> Self {
        config.apply_snapshot(&params.initial_config);
        Self {
            conn: params.conn,
            mtu: params.mtu.clamp(ATT_DEFAULT_MTU, ATT_MAX_MTU),
            security: params.security,
            state: LinkState::Connected,
            config,
            deferred: VecDeque::new(),
        }
    }

    pub(crate) fn engine_state(&self) -> EngineState {
        match self.state {
            LinkState::Connected => EngineState::Connected,
            LinkState::Busy(_) => EngineState::Busy,
            LinkState::WaitForConfirm { .. } => EngineState::WaitForConfirm,
        }
    }

    /// Payload bytes available per ATT packet on this connection.
    pub(crate) fn mtu_budget(&self) -> usize {
        self.mtu as usize - ATT_VALUE_HEADER_SIZE
    }

    fn defer(&mut self, item: Deferred) -> bool {
        if self.deferred.len() >= DEFERRED_QUEUE_CAPACITY {
            return false;
        }
        self.deferred.push_back(item);
        true
    }

    /// Encode, fragment and send a measurement notification.
    ///
    /// While another operation is in flight the value is queued for
    /// re-delivery instead; queue overflow is the only rejection.
    pub(crate) fn start_notify<T: Transport>(
        &mut self,
        value: Measurement,
        profile: &ProfileDefinition,
        features: FeatureMask,
        transport: &mut T,
    ) -> ProfileResult<()> {
        if !matches!(self.state, LinkState::Connected) {
            if self.defer(Deferred::Notify(value)) {
                debug!("conn {}: notify queued behind in-flight operation", self.conn);
                return Ok(());
            }
            return Err(ProfileError::RequestDisallowed);
        }

        if self.config.get(profile.measurement) != Some(CccValue::Notify) {
            return Err(ProfileError::ImproperlyConfigured);
        }
        let handle = profile
            .characteristic(profile.measurement)
            .ok_or(ProfileError::InvalidParameter("measurement characteristic missing"))?
            .value_handle;

        let parts = split(&value, features, profile.fields, self.mtu_budget())?;
        transport.send_value(self.conn, handle, PushKind::Notification, &parts.first)?;
        debug!(
            "conn {}: notify sent ({} bytes, continuation: {})",
            self.conn,
            parts.first.len(),
            parts.pending()
        );
        self.state = LinkState::Busy(PendingOp::Notify { continuation: parts.second });
        Ok(())
    }

    /// Handle a peer write to the control point characteristic.
    pub(crate) fn control_write<T: Transport>(
        &mut self,
        handle: Handle,
        value: Vec<u8>,
        profile: &ProfileDefinition,
        features: FeatureMask,
        transport: &mut T,
        events: &mut Vec<ProfileEvent>,
    ) {
        match self.state {
            // A write racing an unacknowledged response is redelivered after
            // the confirmation, never processed out from under it.
            LinkState::WaitForConfirm { .. } => {
                if !self.defer(Deferred::ControlWrite { handle, value }) {
                    transport.write_response(self.conn, handle, AttStatus::ProcedureAlreadyInProgress);
                }
                return;
            }
            LinkState::Busy(_) => {
                transport.write_response(self.conn, handle, AttStatus::ProcedureAlreadyInProgress);
                return;
            }
            LinkState::Connected => {}
        }

        let Some(cp_id) = profile.control_point else {
            transport.write_response(self.conn, handle, AttStatus::WriteNotPermitted);
            return;
        };
        if self.config.get(cp_id) != Some(CccValue::Indicate) {
            transport.write_response(self.conn, handle, AttStatus::CccImproperlyConfigured);
            return;
        }
        if value.is_empty() {
            transport.write_response(self.conn, handle, AttStatus::InvalidAttributeValueLength);
            return;
        }
        transport.write_response(self.conn, handle, AttStatus::Success);
        debug!("conn {}: control point write: {}", self.conn, hex::encode(&value));

        let opcode = value[0];
        match profile.opcodes.dispatch(opcode, &value[1..], features) {
            Ok(request) => {
                debug!("conn {}: control point opcode {:#04x} accepted", self.conn, opcode);
                self.state = LinkState::Busy(PendingOp::Procedure { opcode });
                events.push(ProfileEvent::ControlPointRequest { conn: self.conn, request });
            }
            Err(status) => {
                // Local negative response; the peer still has to confirm the
                // error indication before the next procedure may start.
                debug!(
                    "conn {}: control point opcode {:#04x} rejected locally ({:?})",
                    self.conn, opcode, status
                );
                let response = pack_response(opcode, status.into(), &[]);
                match transport.send_value(self.conn, handle, PushKind::Indication, &response) {
                    Ok(()) => {
                        self.state = LinkState::WaitForConfirm { opcode, notify_app: false };
                    }
                    Err(err) => warn!("conn {}: error indication not sent: {}", self.conn, err),
                }
            }
        }
    }

    /// Pack and send the application's control point response.
    pub(crate) fn app_confirm<T: Transport>(
        &mut self,
        status: u8,
        value: &[u8],
        profile: &ProfileDefinition,
        transport: &mut T,
    ) -> ProfileResult<()> {
        let LinkState::Busy(PendingOp::Procedure { opcode }) = self.state else {
            return Err(ProfileError::RequestDisallowed);
        };
        let cp_id = profile
            .control_point
            .ok_or(ProfileError::RequestDisallowed)?;
        let handle = profile
            .characteristic(cp_id)
            .ok_or(ProfileError::InvalidParameter("control point characteristic missing"))?
            .value_handle;

        let response = pack_response(opcode, status, value);
        if let Err(err) = transport.send_value(self.conn, handle, PushKind::Indication, &response) {
            self.state = LinkState::Connected;
            return Err(err.into());
        }
        self.state = LinkState::WaitForConfirm { opcode, notify_app: true };
        Ok(())
    }

    /// Advance the machine on a send-complete or indication confirmation.
    pub(crate) fn send_complete<T: Transport>(
        &mut self,
        kind: PushKind,
        status: AttStatus,
        profile: &ProfileDefinition,
        transport: &mut T,
        events: &mut Vec<ProfileEvent>,
    ) {
        let state = std::mem::replace(&mut self.state, LinkState::Connected);
        match (state, kind) {
            (
                LinkState::Busy(PendingOp::Notify { continuation: Some(fragment) }),
                PushKind::Notification,
            ) => {
                if status != AttStatus::Success {
                    warn!(
                        "conn {}: first fragment failed ({:?}), continuation discarded",
                        self.conn, status
                    );
                    events.push(ProfileEvent::Complete {
                        conn: self.conn,
                        operation: Operation::Notify,
                        status,
                    });
                    return;
                }
                // First fragment confirmed sent; flush the buffered one and
                // re-arm the wait for its completion.
                let handle = profile
                    .characteristic(profile.measurement)
                    .map(|spec| spec.value_handle)
                    .unwrap_or_default();
                match transport.send_value(self.conn, handle, PushKind::Notification, &fragment) {
                    Ok(()) => {
                        debug!("conn {}: continuation fragment flushed", self.conn);
                        self.state = LinkState::Busy(PendingOp::Notify { continuation: None });
                    }
                    Err(err) => {
                        warn!("conn {}: continuation not sent: {}", self.conn, err);
                        events.push(ProfileEvent::Complete {
                            conn: self.conn,
                            operation: Operation::Notify,
                            status: AttStatus::Unlikely,
                        });
                    }
                }
            }
            (LinkState::Busy(PendingOp::Notify { continuation: None }), PushKind::Notification) => {
                events.push(ProfileEvent::Complete {
                    conn: self.conn,
                    operation: Operation::Notify,
                    status,
                });
            }
            (LinkState::WaitForConfirm { notify_app, .. }, PushKind::Indication) => {
                if notify_app {
                    events.push(ProfileEvent::Complete {
                        conn: self.conn,
                        operation: Operation::ControlPoint,
                        status,
                    });
                }
            }
            (other, kind) => {
                warn!(
                    "conn {}: unexpected send-complete ({:?}) in state {:?}",
                    self.conn, kind, other
                );
                self.state = other;
            }
        }
    }

    /// Tear down the context. Pending operations are discarded without
    /// completion events; only the disable report goes out.
    pub(crate) fn into_disabled(self, events: &mut Vec<ProfileEvent>) {
        debug!("conn {}: disabled in state {:?}", self.conn, self.state);
        events.push(ProfileEvent::Disabled { conn: self.conn, config: self.config.snapshot() });
    }
}
