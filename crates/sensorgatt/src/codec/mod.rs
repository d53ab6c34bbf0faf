//! Flag-driven measurement codec
//!
//! A measurement value is a 16-bit flags word followed by mandatory fields at
//! fixed offsets and optional variable-width fields in table order. The same
//! declarative field table drives encoding, decoding and MTU fragmentation.

pub mod fields;
pub mod fragment;

#[cfg(test)]
mod tests;

pub use self::fields::{decode, encode, FeatureMask, FieldDescriptor, FieldTable, Measurement};
pub use self::fragment::{split, Split};
