//! Control point command decoding and response packing

pub mod dispatcher;

pub use self::dispatcher::{
    pack_response, ControlRequest, Operand, OpcodeSpec, OpcodeTable, ResponseStatus,
};
