//! Error types for the sensorgatt engine
//!
//! Command-level failures are reported to the caller as [`ProfileError`];
//! malformed peer traffic is answered on the wire with an [`AttStatus`] and
//! never surfaces as a Rust error.

use crate::constants::*;
use thiserror::Error;

/// Status codes carried in ATT write/read responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttStatus {
    /// Operation completed
    Success,
    /// No attribute behind the handle
    InvalidHandle,
    /// Attribute is not readable
    ReadNotPermitted,
    /// Attribute is not writable
    WriteNotPermitted,
    /// Malformed request
    InvalidPdu,
    /// Request not supported by the server
    RequestNotSupported,
    /// Non-zero offset on a value that does not support partial access
    InvalidOffset,
    /// Wrong value length for the attribute
    InvalidAttributeValueLength,
    /// Unspecified failure
    Unlikely,
    /// Notify/indicate requested while the CCC descriptor is not set up
    CccImproperlyConfigured,
    /// A control point procedure is already in flight
    ProcedureAlreadyInProgress,
    /// Any other status byte
    Unknown(u8),
}

impl From<u8> for AttStatus {
    fn from(code: u8) -> Self {
        match code {
            ATT_STATUS_SUCCESS => AttStatus::Success,
            ATT_STATUS_INVALID_HANDLE => AttStatus::InvalidHandle,
            ATT_STATUS_READ_NOT_PERMITTED => AttStatus::ReadNotPermitted,
            ATT_STATUS_WRITE_NOT_PERMITTED => AttStatus::WriteNotPermitted,
            ATT_STATUS_INVALID_PDU => AttStatus::InvalidPdu,
            ATT_STATUS_REQUEST_NOT_SUPPORTED => AttStatus::RequestNotSupported,
            ATT_STATUS_INVALID_OFFSET => AttStatus::InvalidOffset,
            ATT_STATUS_INVALID_ATTRIBUTE_VALUE_LENGTH => AttStatus::InvalidAttributeValueLength,
            ATT_STATUS_UNLIKELY => AttStatus::Unlikely,
            ATT_STATUS_CCC_IMPROPERLY_CONFIGURED => AttStatus::CccImproperlyConfigured,
            ATT_STATUS_PROCEDURE_ALREADY_IN_PROGRESS => AttStatus::ProcedureAlreadyInProgress,
            _ => AttStatus::Unknown(code),
        }
    }
}

impl From<AttStatus> for u8 {
    fn from(status: AttStatus) -> u8 {
        match status {
            AttStatus::Success => ATT_STATUS_SUCCESS,
            AttStatus::InvalidHandle => ATT_STATUS_INVALID_HANDLE,
            AttStatus::ReadNotPermitted => ATT_STATUS_READ_NOT_PERMITTED,
            AttStatus::WriteNotPermitted => ATT_STATUS_WRITE_NOT_PERMITTED,
            AttStatus::InvalidPdu => ATT_STATUS_INVALID_PDU,
            AttStatus::RequestNotSupported => ATT_STATUS_REQUEST_NOT_SUPPORTED,
            AttStatus::InvalidOffset => ATT_STATUS_INVALID_OFFSET,
            AttStatus::InvalidAttributeValueLength => ATT_STATUS_INVALID_ATTRIBUTE_VALUE_LENGTH,
            AttStatus::Unlikely => ATT_STATUS_UNLIKELY,
            AttStatus::CccImproperlyConfigured => ATT_STATUS_CCC_IMPROPERLY_CONFIGURED,
            AttStatus::ProcedureAlreadyInProgress => ATT_STATUS_PROCEDURE_ALREADY_IN_PROGRESS,
            AttStatus::Unknown(code) => code,
        }
    }
}

/// Errors reported by the engine's outbound collaborator calls.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("link to connection {0} is gone")]
    LinkLost(u16),

    #[error("transmit buffers exhausted")]
    BufferExhausted,
}

/// Errors returned to the application for engine commands.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("operation not allowed in the current state")]
    RequestDisallowed,

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("peer has not enabled notifications or indications")]
    ImproperlyConfigured,

    #[error("unexpected length: expected {expected}, got {got}")]
    UnexpectedLength { expected: usize, got: usize },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type used throughout the engine.
pub type ProfileResult<T> = Result<T, ProfileError>;
