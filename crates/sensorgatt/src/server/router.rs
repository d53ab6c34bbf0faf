//! Command surface and transport event demultiplexer

use super::config::ConfigurationStore;
use super::connection::{ConnectionContext, Deferred, EngineState, LinkState};
use super::types::*;
use crate::codec::Measurement;
use crate::constants::*;
use crate::error::{AttStatus, ProfileError, ProfileResult};
use log::{debug, warn};
use std::collections::HashMap;

/// One GATT sensor profile service instance.
///
/// Single-threaded cooperative dispatch: every call runs an event to
/// completion before returning, and "waiting" on the peer is represented
/// purely as connection state. Application-facing events are returned from
/// each entry point rather than delivered through a callback.
pub struct ProfileServer<T: Transport, S: AttributeStore> {
    profile: ProfileDefinition,
    transport: T,
    store: S,
    /// `Some` once the attribute database has been created.
    config: Option<FeatureConfig>,
    /// Enabled connections; exclusive owner of all per-connection state.
    connections: HashMap<ConnectionId, ConnectionContext>,
}

impl<T: Transport, S: AttributeStore> ProfileServer<T, S> {
    pub fn new(profile: ProfileDefinition, transport: T, store: S) -> Self {
        Self {
            profile,
            transport,
            store,
            config: None,
            connections: HashMap::new(),
        }
    }

    pub fn profile(&self) -> &ProfileDefinition {
        &self.profile
    }

    /// Reported state of a connection slot.
    pub fn connection_state(&self, conn: ConnectionId) -> EngineState {
        if self.config.is_none() {
            EngineState::Disabled
        } else {
            self.connections
                .get(&conn)
                .map_or(EngineState::Idle, |ctx| ctx.engine_state())
        }
    }

    /// Create the service instance: fix the feature mask and the optional
    /// characteristic set, validate the field table against the smallest
    /// possible MTU, and publish the feature value to the database.
    pub fn create_database(&mut self, config: FeatureConfig) -> ProfileResult<()> {
        if self.config.is_some() {
            return Err(ProfileError::RequestDisallowed);
        }
        self.profile
            .fields
            .validate(ATT_DEFAULT_MTU as usize - ATT_VALUE_HEADER_SIZE)?;
        self.store
            .set_value(self.profile.feature_handle, &config.features.bits().to_le_bytes())?;
        debug!("{}: database created", self.profile.name);
        self.config = Some(config);
        Ok(())
    }

    fn feature_config(&self) -> ProfileResult<FeatureConfig> {
        self.config.ok_or(ProfileError::RequestDisallowed)
    }

    /// Bring a connection under the engine, applying persisted or default
    /// CCC values. Already-enabled connections are rejected.
    pub fn enable(&mut self, params: EnableParams) -> ProfileResult<()> {
        let config = self.feature_config()?;
        if self.connections.contains_key(&params.conn) {
            return Err(ProfileError::RequestDisallowed);
        }
        let ccc = ConfigurationStore::new(&self.profile.characteristics, config.optional_characteristics);
        debug!("{}: conn {} enabled (mtu {})", self.profile.name, params.conn, params.mtu);
        self.connections
            .insert(params.conn, ConnectionContext::new(&params, ccc));
        Ok(())
    }

    /// Explicitly release a connection, reporting its final configuration.
    pub fn disable(&mut self, conn: ConnectionId) -> ProfileResult<Vec<ProfileEvent>> {
        let ctx = self
            .connections
            .remove(&conn)
            .ok_or(ProfileError::RequestDisallowed)?;
        let mut events = Vec::new();
        ctx.into_disabled(&mut events);
        Ok(events)
    }

    /// Send a measurement notification, fragmenting as needed. Queued for
    /// re-delivery if another operation is in flight.
    pub fn notify(&mut self, conn: ConnectionId, value: Measurement) -> ProfileResult<()> {
        let features = self.feature_config()?.features;
        let ctx = self
            .connections
            .get_mut(&conn)
            .ok_or(ProfileError::RequestDisallowed)?;
        ctx.start_notify(value, &self.profile, features, &mut self.transport)
    }

    /// Server-initiated update of a characteristic value held in the
    /// attribute database (e.g. sensor location).
    pub fn update_config_value(&mut self, handle: Handle, value: &[u8]) -> ProfileResult<()> {
        self.feature_config()?;
        self.store.set_value(handle, value)
    }

    /// Application's answer to a forwarded control point request; packs and
    /// sends the response indication.
    pub fn control_point_confirm(
        &mut self,
        conn: ConnectionId,
        status: u8,
        value: &[u8],
    ) -> ProfileResult<()> {
        self.feature_config()?;
        let ctx = self
            .connections
            .get_mut(&conn)
            .ok_or(ProfileError::RequestDisallowed)?;
        ctx.app_confirm(status, value, &self.profile, &mut self.transport)
    }

    /// Demultiplex an inbound transport event.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Vec<ProfileEvent> {
        let mut events = Vec::new();
        match event {
            TransportEvent::Write { conn, handle, offset, value } => {
                self.on_write(conn, handle, offset, value, &mut events);
                self.drain_deferred(conn, &mut events);
            }
            TransportEvent::Read { conn, handle } => self.on_read(conn, handle),
            TransportEvent::SendComplete { conn, kind, status } => {
                if let Some(ctx) = self.connections.get_mut(&conn) {
                    ctx.send_complete(kind, status, &self.profile, &mut self.transport, &mut events);
                } else {
                    warn!("send-complete for unknown conn {}", conn);
                }
                self.drain_deferred(conn, &mut events);
            }
            // Highest-priority cancellation: discard anything pending,
            // report only the disable snapshot.
            TransportEvent::Disconnect { conn } => {
                if let Some(ctx) = self.connections.remove(&conn) {
                    ctx.into_disabled(&mut events);
                }
            }
        }
        events
    }

    fn on_write(
        &mut self,
        conn: ConnectionId,
        handle: Handle,
        offset: u16,
        value: Vec<u8>,
        events: &mut Vec<ProfileEvent>,
    ) {
        let Some(config) = self.config else {
            self.transport.write_response(conn, handle, AttStatus::RequestNotSupported);
            return;
        };
        let Some(ctx) = self.connections.get_mut(&conn) else {
            warn!("write from unknown conn {}", conn);
            self.transport.write_response(conn, handle, AttStatus::Unlikely);
            return;
        };
        if offset != 0 {
            self.transport.write_response(conn, handle, AttStatus::InvalidOffset);
            return;
        }

        let control_handle = self
            .profile
            .control_point
            .and_then(|id| self.profile.characteristic(id))
            .map(|spec| spec.value_handle);
        if control_handle == Some(handle) {
            ctx.control_write(handle, value, &self.profile, config.features, &mut self.transport, events);
            return;
        }

        if let Some(spec) = self.profile.characteristics.iter().find(|s| s.ccc_handle == handle) {
            match ctx.config.set_raw(spec.id, &value) {
                Ok(new_value) => {
                    self.transport.write_response(conn, handle, AttStatus::Success);
                    events.push(ProfileEvent::ConfigChanged {
                        conn,
                        characteristic: spec.id,
                        value: new_value,
                    });
                }
                Err(status) => self.transport.write_response(conn, handle, status),
            }
            return;
        }

        self.transport.write_response(conn, handle, AttStatus::WriteNotPermitted);
    }

    /// Peer read of a value the database does not cache: per-connection CCC
    /// descriptors, or the stored attribute value. No state change.
    fn on_read(&mut self, conn: ConnectionId, handle: Handle) {
        if let Some(ctx) = self.connections.get(&conn) {
            if let Some(spec) = self.profile.characteristics.iter().find(|s| s.ccc_handle == handle) {
                match ctx.config.get_raw(spec.id) {
                    Some(raw) => self.transport.read_response(conn, handle, &raw),
                    None => self.transport.error_response(conn, handle, AttStatus::InvalidHandle),
                }
                return;
            }
        }
        match self.store.value(handle) {
            Some(value) => self.transport.read_response(conn, handle, &value),
            None => self.transport.error_response(conn, handle, AttStatus::InvalidHandle),
        }
    }

    /// Re-deliver deferred events once the connection is back to `Connected`.
    /// Stops as soon as a re-delivered event puts an operation in flight.
    fn drain_deferred(&mut self, conn: ConnectionId, events: &mut Vec<ProfileEvent>) {
        let Some(config) = self.config else { return };
        loop {
            let Some(ctx) = self.connections.get_mut(&conn) else { return };
            if !matches!(ctx.state, LinkState::Connected) {
                return;
            }
            let Some(item) = ctx.deferred.pop_front() else { return };
            match item {
                Deferred::ControlWrite { handle, value } => {
                    debug!("conn {}: re-delivering deferred control point write", conn);
                    ctx.control_write(handle, value, &self.profile, config.features, &mut self.transport, events);
                }
                Deferred::Notify(value) => {
                    debug!("conn {}: re-delivering deferred notify", conn);
                    if let Err(err) =
                        ctx.start_notify(value, &self.profile, config.features, &mut self.transport)
                    {
                        warn!("conn {}: deferred notify failed: {}", conn, err);
                        events.push(ProfileEvent::Complete {
                            conn,
                            operation: Operation::Notify,
                            status: AttStatus::Unlikely,
                        });
                    }
                }
            }
        }
    }
}
