//! Two-packet MTU fragmentation of oversized measurements
//!
//! A value that does not fit one ATT packet is carried in exactly two
//! notifications. Each fragment is a self-describing measurement: it repeats
//! the mandatory prefix, carries the static flag bits of the original value,
//! and sets the presence bits of only the fields it contains. The field table
//! is validated at database creation so a third fragment can never be needed.

use super::fields::{surviving_fields, FeatureMask, FieldTable, Measurement};
use crate::constants::MEASUREMENT_FLAGS_SIZE;
use crate::error::{ProfileError, ProfileResult};
use byteorder::{ByteOrder, LittleEndian};

/// Result of [`split`]: the fragment(s) to transmit.
///
/// `second` is buffered by the connection state machine as the pending
/// notification and flushed only after the first fragment's send-complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub first: Vec<u8>,
    pub second: Option<Vec<u8>>,
}

impl Split {
    /// True when a continuation fragment is pending.
    pub fn pending(&self) -> bool {
        self.second.is_some()
    }
}

struct Fragment {
    buf: Vec<u8>,
    flags: u16,
}

impl Fragment {
    fn seed(prefix: &[u8], static_flags: u16) -> Self {
        Self { buf: prefix.to_vec(), flags: static_flags }
    }

    fn finish(mut self) -> Vec<u8> {
        LittleEndian::write_u16(&mut self.buf[..MEASUREMENT_FLAGS_SIZE], self.flags);
        self.buf
    }
}

/// Split a measurement into at most two MTU-bounded packets.
///
/// Fields are walked in table order after the feature gate; once a field no
/// longer fits fragment 1 the target switches to fragment 2 permanently, so
/// concatenating the variable fields of both fragments reproduces the
/// original field order.
pub fn split(
    value: &Measurement,
    features: FeatureMask,
    table: &FieldTable,
    mtu_budget: usize,
) -> ProfileResult<Split> {
    let full = super::fields::encode(value, features, table)?;
    if full.len() <= mtu_budget {
        return Ok(Split { first: full, second: None });
    }

    let prefix_len = table.mandatory_len();
    if prefix_len >= mtu_budget {
        return Err(ProfileError::InvalidParameter(
            "mandatory fields do not fit the MTU budget",
        ));
    }

    // Presence bits belong to the fragment carrying the field; everything
    // else in the flags word is copied into both fragments.
    let static_flags = LittleEndian::read_u16(&full[..MEASUREMENT_FLAGS_SIZE])
        & !table.field_flag_mask();
    let prefix = &full[..prefix_len];
    let mut first = Fragment::seed(prefix, static_flags);
    let mut second = Fragment::seed(prefix, static_flags);

    let mut offset = prefix_len;
    let mut in_second = false;
    for (d, _) in surviving_fields(value, features, table)? {
        let bytes = &full[offset..offset + d.width];
        offset += d.width;
        if !in_second && first.buf.len() + d.width > mtu_budget {
            in_second = true;
        }
        let target = if in_second { &mut second } else { &mut first };
        target.buf.extend_from_slice(bytes);
        target.flags |= d.flag;
    }

    debug_assert!(
        second.buf.len() <= mtu_budget,
        "field table exceeds two fragments; FieldTable::validate must reject it"
    );

    Ok(Split { first: first.finish(), second: Some(second.finish()) })
}
