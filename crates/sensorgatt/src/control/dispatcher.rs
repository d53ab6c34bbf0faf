//! Table-driven validation and dispatch of control point writes
//!
//! Every profile declares a static [`OpcodeSpec`] table. A peer write is
//! checked against it in a fixed order (opcode known, feature enabled, exact
//! operand length, operand range) and either decoded into a typed
//! [`ControlRequest`] for the application or answered locally with a negative
//! [`ResponseStatus`]; malformed requests never reach the application.

use crate::codec::FeatureMask;
use crate::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use std::ops::RangeInclusive;

/// Status byte of a control point response indication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    OpcodeNotSupported,
    InvalidParameter,
    OperationFailed,
}

impl From<ResponseStatus> for u8 {
    fn from(status: ResponseStatus) -> u8 {
        match status {
            ResponseStatus::Success => CP_STATUS_SUCCESS,
            ResponseStatus::OpcodeNotSupported => CP_STATUS_OPCODE_NOT_SUPPORTED,
            ResponseStatus::InvalidParameter => CP_STATUS_INVALID_PARAMETER,
            ResponseStatus::OperationFailed => CP_STATUS_OPERATION_FAILED,
        }
    }
}

impl ResponseStatus {
    /// Map an application-supplied status byte onto the wire, clamping
    /// anything out of range to a generic failure.
    pub fn clamp(raw: u8) -> u8 {
        match raw {
            CP_STATUS_SUCCESS..=CP_STATUS_OPERATION_FAILED => raw,
            _ => CP_STATUS_OPERATION_FAILED,
        }
    }
}

/// Decoded operand of a control point command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    U8(u8),
    U16(u16),
    U32(u32),
    Raw(Vec<u8>),
}

impl Operand {
    fn numeric(&self) -> Option<u32> {
        match self {
            Operand::U8(v) => Some(u32::from(*v)),
            Operand::U16(v) => Some(u32::from(*v)),
            Operand::U32(v) => Some(*v),
            _ => None,
        }
    }
}

/// A validated command ready to be forwarded to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub opcode: u8,
    pub operand: Operand,
}

/// Static description of one supported control point opcode.
#[derive(Debug, Clone)]
pub struct OpcodeSpec {
    pub code: u8,
    /// Feature bits the device must declare for this opcode to exist.
    pub feature: FeatureMask,
    /// Exact operand length in bytes.
    pub operand_len: usize,
    /// Inclusive bound on a numeric operand (enumerated selectors).
    pub operand_range: Option<RangeInclusive<u32>>,
}

impl OpcodeSpec {
    pub const fn new(
        code: u8,
        feature: FeatureMask,
        operand_len: usize,
        operand_range: Option<RangeInclusive<u32>>,
    ) -> Self {
        Self { code, feature, operand_len, operand_range }
    }
}

/// A profile's control point opcode table.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeTable(pub &'static [OpcodeSpec]);

impl OpcodeTable {
    /// Validate and decode a peer control point write.
    ///
    /// Check order: opcode known and feature-enabled, exact operand length,
    /// value range. A rejection is answered locally with the returned status;
    /// only an `Ok` request is forwarded to the application.
    pub fn dispatch(
        &self,
        opcode: u8,
        operand: &[u8],
        features: FeatureMask,
    ) -> Result<ControlRequest, ResponseStatus> {
        let spec = self
            .0
            .iter()
            .find(|spec| spec.code == opcode)
            .ok_or(ResponseStatus::OpcodeNotSupported)?;

        if !features.contains(spec.feature) {
            return Err(ResponseStatus::OpcodeNotSupported);
        }
        if operand.len() != spec.operand_len {
            return Err(ResponseStatus::InvalidParameter);
        }

        let operand = match spec.operand_len {
            0 => Operand::None,
            1 => Operand::U8(operand[0]),
            2 => Operand::U16(LittleEndian::read_u16(operand)),
            3 | 4 => Operand::U32(LittleEndian::read_uint(operand, spec.operand_len) as u32),
            _ => Operand::Raw(operand.to_vec()),
        };

        if let Some(range) = &spec.operand_range {
            match operand.numeric() {
                Some(v) if range.contains(&v) => {}
                _ => return Err(ResponseStatus::InvalidParameter),
            }
        }

        Ok(ControlRequest { opcode, operand })
    }
}

/// Pack a control point response indication.
///
/// Layout: response code, echoed opcode, status, then the response value —
/// the value is appended only on success.
pub fn pack_response(opcode: u8, status: u8, value: &[u8]) -> Vec<u8> {
    let status = ResponseStatus::clamp(status);
    let mut out = Vec::with_capacity(CONTROL_RESPONSE_HEADER_LEN + value.len());
    out.push(CONTROL_RESPONSE_CODE);
    out.push(opcode);
    out.push(status);
    if status == CP_STATUS_SUCCESS {
        out.extend_from_slice(value);
    }
    out
}
