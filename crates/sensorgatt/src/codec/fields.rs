//! Field table definitions and the measurement encoder/decoder

use crate::constants::MEASUREMENT_FLAGS_SIZE;
use crate::error::{ProfileError, ProfileResult};
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};

bitflags! {
    /// Feature-support bitmask fixed at database creation time.
    ///
    /// Bit meanings are assigned by each profile (see `profiles::power`,
    /// `profiles::location`); the engine only tests containment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FeatureMask: u32 {
        const _ = !0;
    }
}

/// One optional field of a measurement characteristic.
///
/// `flag` is the presence bit in the measurement flags word, `width` the
/// fixed on-air size in bytes (1..=7), and `feature` the feature bits that
/// must be enabled for the field to be emitted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub flag: u16,
    pub width: usize,
    pub feature: FeatureMask,
}

impl FieldDescriptor {
    pub const fn new(flag: u16, width: usize, feature: FeatureMask) -> Self {
        Self { flag, width, feature }
    }

    /// Ungated field, present whenever its flag bit is set.
    pub const fn plain(flag: u16, width: usize) -> Self {
        Self::new(flag, width, FeatureMask::empty())
    }
}

/// Static wire layout of a measurement characteristic.
///
/// Never mutated at runtime; one table is shared read-only by every
/// connection of a profile.
#[derive(Debug, Clone, Copy)]
pub struct FieldTable {
    /// Widths of the mandatory fields following the flags word.
    pub mandatory_widths: &'static [usize],
    /// Optional fields in declared wire order.
    pub fields: &'static [FieldDescriptor],
}

impl FieldTable {
    pub const fn new(mandatory_widths: &'static [usize], fields: &'static [FieldDescriptor]) -> Self {
        Self { mandatory_widths, fields }
    }

    /// OR of every presence bit the table defines. Flag bits outside this
    /// mask are positional/static indicators copied through verbatim.
    pub fn field_flag_mask(&self) -> u16 {
        self.fields.iter().fold(0, |mask, d| mask | d.flag)
    }

    /// Flags word plus all mandatory fields; the fixed prefix of every
    /// encoded value and of every fragment.
    pub fn mandatory_len(&self) -> usize {
        MEASUREMENT_FLAGS_SIZE + self.mandatory_widths.iter().sum::<usize>()
    }

    /// Encoded length with every optional field present.
    pub fn max_encoded_len(&self) -> usize {
        self.mandatory_len() + self.fields.iter().map(|d| d.width).sum::<usize>()
    }

    /// Encoded length for a given flags word, gates already applied.
    pub fn encoded_len(&self, flags: u16) -> usize {
        self.mandatory_len()
            + self
                .fields
                .iter()
                .filter(|d| flags & d.flag != 0)
                .map(|d| d.width)
                .sum::<usize>()
    }

    /// Construction-time sanity check, run once at database creation.
    ///
    /// The fragmenter supports at most two ATT packets, so the worst-case
    /// value (every field present) must fit two fragments at `mtu_budget`,
    /// and every single field must fit one fragment after the mandatory
    /// prefix. Field widths are limited to 1..=7 bytes.
    pub fn validate(&self, mtu_budget: usize) -> ProfileResult<()> {
        let prefix = self.mandatory_len();
        if prefix >= mtu_budget {
            return Err(ProfileError::InvalidParameter(
                "mandatory fields do not fit the MTU budget",
            ));
        }
        let mut seen: u16 = 0;
        for d in self.fields {
            if d.width == 0 || d.width > 7 {
                return Err(ProfileError::InvalidParameter("field width out of range"));
            }
            if d.flag == 0 || d.flag.count_ones() != 1 || seen & d.flag != 0 {
                return Err(ProfileError::InvalidParameter("field flag bits must be distinct"));
            }
            seen |= d.flag;
            if prefix + d.width > mtu_budget {
                return Err(ProfileError::InvalidParameter("field too wide for one fragment"));
            }
        }
        // Both fragments repeat the mandatory prefix, and fragment 1 may
        // waste up to the widest field minus one byte before the switch.
        let wasted = self.fields.iter().map(|d| d.width).max().unwrap_or(1) - 1;
        if self.max_encoded_len() + prefix + wasted > 2 * mtu_budget {
            return Err(ProfileError::InvalidParameter(
                "field table does not fit two fragments",
            ));
        }
        Ok(())
    }
}

/// A measurement value as supplied by the application.
///
/// `optional[i]` pairs with the i-th *set* presence flag in table order; raw
/// little-endian field contents, already scaled by the application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Measurement {
    pub flags: u16,
    pub mandatory: Vec<u64>,
    pub optional: Vec<u64>,
}

fn width_mask(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

fn put_uint(out: &mut Vec<u8>, value: u64, width: usize) {
    let mut buf = [0u8; 8];
    LittleEndian::write_uint(&mut buf, value & width_mask(width), width);
    out.extend_from_slice(&buf[..width]);
}

/// Optional fields that survive the feature gate, paired with their values.
///
/// Fields whose flag is set but whose feature is not enabled are dropped
/// silently (capability downgrade); their supplied values are consumed so the
/// pairing of later fields is preserved.
pub(crate) fn surviving_fields(
    value: &Measurement,
    features: FeatureMask,
    table: &FieldTable,
) -> ProfileResult<Vec<(FieldDescriptor, u64)>> {
    let mut values = value.optional.iter();
    let mut survivors = Vec::new();
    for d in table.fields {
        if value.flags & d.flag == 0 {
            continue;
        }
        let v = *values
            .next()
            .ok_or(ProfileError::InvalidParameter("missing optional field value"))?;
        if !features.contains(d.feature) {
            continue;
        }
        survivors.push((*d, v));
    }
    Ok(survivors)
}

/// Encode a measurement against a field table.
///
/// The canonical flags word (static bits plus the presence bits that survived
/// the feature gate) lands at byte offset 0. Unsupported fields are dropped,
/// never cause a failure.
pub fn encode(
    value: &Measurement,
    features: FeatureMask,
    table: &FieldTable,
) -> ProfileResult<Vec<u8>> {
    if value.mandatory.len() != table.mandatory_widths.len() {
        return Err(ProfileError::InvalidParameter("mandatory field count mismatch"));
    }

    let mut out = Vec::with_capacity(table.encoded_len(value.flags));
    out.extend_from_slice(&[0, 0]); // flags placeholder
    for (v, width) in value.mandatory.iter().zip(table.mandatory_widths) {
        put_uint(&mut out, *v, *width);
    }

    let mut out_flags = value.flags & !table.field_flag_mask();
    for (d, v) in surviving_fields(value, features, table)? {
        put_uint(&mut out, v, d.width);
        out_flags |= d.flag;
    }

    LittleEndian::write_u16(&mut out[..MEASUREMENT_FLAGS_SIZE], out_flags);
    Ok(out)
}

/// Decode an encoded measurement back into field values.
///
/// Inverse of [`encode`] for the fields present in the flags word; the input
/// must be exactly the encoded length implied by its own flags.
pub fn decode(bytes: &[u8], table: &FieldTable) -> ProfileResult<Measurement> {
    if bytes.len() < MEASUREMENT_FLAGS_SIZE {
        return Err(ProfileError::UnexpectedLength {
            expected: MEASUREMENT_FLAGS_SIZE,
            got: bytes.len(),
        });
    }
    let flags = LittleEndian::read_u16(&bytes[..MEASUREMENT_FLAGS_SIZE]);
    let expected = table.encoded_len(flags);
    if bytes.len() != expected {
        return Err(ProfileError::UnexpectedLength { expected, got: bytes.len() });
    }

    let mut offset = MEASUREMENT_FLAGS_SIZE;
    let mut mandatory = Vec::with_capacity(table.mandatory_widths.len());
    for width in table.mandatory_widths {
        mandatory.push(LittleEndian::read_uint(&bytes[offset..offset + width], *width));
        offset += width;
    }

    let mut optional = Vec::new();
    for d in table.fields {
        if flags & d.flag == 0 {
            continue;
        }
        optional.push(LittleEndian::read_uint(&bytes[offset..offset + d.width], d.width));
        offset += d.width;
    }

    Ok(Measurement { flags, mandatory, optional })
}
