//! Wire-level constants shared across the profile engine

// ATT status codes carried in write/read responses
pub const ATT_STATUS_SUCCESS: u8 = 0x00;
pub const ATT_STATUS_INVALID_HANDLE: u8 = 0x01;
pub const ATT_STATUS_READ_NOT_PERMITTED: u8 = 0x02;
pub const ATT_STATUS_WRITE_NOT_PERMITTED: u8 = 0x03;
pub const ATT_STATUS_INVALID_PDU: u8 = 0x04;
pub const ATT_STATUS_REQUEST_NOT_SUPPORTED: u8 = 0x06;
pub const ATT_STATUS_INVALID_OFFSET: u8 = 0x07;
pub const ATT_STATUS_INVALID_ATTRIBUTE_VALUE_LENGTH: u8 = 0x0D;
pub const ATT_STATUS_UNLIKELY: u8 = 0x0E;

// Common profile error codes (Core Spec Supplement)
pub const ATT_STATUS_CCC_IMPROPERLY_CONFIGURED: u8 = 0xFD;
pub const ATT_STATUS_PROCEDURE_ALREADY_IN_PROGRESS: u8 = 0xFE;

// Client Characteristic Configuration values a peer may write
pub const CCC_VALUE_STOP: u16 = 0x0000;
pub const CCC_VALUE_NOTIFY: u16 = 0x0001;
pub const CCC_VALUE_INDICATE: u16 = 0x0002;
pub const CCC_VALUE_LEN: usize = 2;

// Control point response layout: [response code, request opcode, status, value...]
pub const CONTROL_RESPONSE_CODE: u8 = 0x20;
pub const CONTROL_RESPONSE_HEADER_LEN: usize = 3;

// Control point response status values
pub const CP_STATUS_SUCCESS: u8 = 0x01;
pub const CP_STATUS_OPCODE_NOT_SUPPORTED: u8 = 0x02;
pub const CP_STATUS_INVALID_PARAMETER: u8 = 0x03;
pub const CP_STATUS_OPERATION_FAILED: u8 = 0x04;

// MTU handling
pub const ATT_DEFAULT_MTU: u16 = 23;
pub const ATT_MAX_MTU: u16 = 517;
/// Opcode (1) + attribute handle (2) preceding a notified value.
pub const ATT_VALUE_HEADER_SIZE: usize = 3;

/// Size of the flags word that opens every encoded measurement.
pub const MEASUREMENT_FLAGS_SIZE: usize = 2;

/// Bound on the per-connection deferred event queue (control point writes
/// and notify commands parked behind an in-flight operation).
pub const DEFERRED_QUEUE_CAPACITY: usize = 4;
