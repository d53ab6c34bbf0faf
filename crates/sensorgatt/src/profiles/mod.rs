//! Static profile definitions consumed by the generic engine
//!
//! Each profile contributes its measurement field table, its control point
//! opcode table and a default attribute handle layout. All of it is
//! configuration; the engine logic lives in `codec`, `control` and `server`.

pub mod location;
pub mod power;
