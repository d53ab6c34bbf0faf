//! Unit tests for the measurement codec and fragmenter

use super::fields::{decode, encode, FeatureMask, FieldDescriptor, FieldTable, Measurement};
use super::fragment::split;
use crate::constants::MEASUREMENT_FLAGS_SIZE;
use crate::error::ProfileError;

const FEAT_A: FeatureMask = FeatureMask::from_bits_retain(1 << 0);
const FEAT_B: FeatureMask = FeatureMask::from_bits_retain(1 << 1);

// Mandatory 2-byte value, then five gated fields covering the width range.
static FIELDS: [FieldDescriptor; 5] = [
    FieldDescriptor::new(0x0001, 1, FEAT_A),
    FieldDescriptor::new(0x0002, 2, FEAT_A),
    FieldDescriptor::new(0x0004, 3, FEAT_B),
    FieldDescriptor::new(0x0008, 4, FEAT_B),
    FieldDescriptor::plain(0x0010, 7),
];
static TABLE: FieldTable = FieldTable::new(&[2], &FIELDS);

// Bit 15 is not a presence flag in TABLE, so it is static.
const STATIC_BIT: u16 = 0x8000;

fn all_features() -> FeatureMask {
    FEAT_A | FEAT_B
}

fn full_measurement() -> Measurement {
    Measurement {
        flags: 0x001F | STATIC_BIT,
        mandatory: vec![0x1234],
        optional: vec![0xAA, 0xBBCC, 0x01_0203, 0x0405_0607, 0x0011_2233_4455_66],
    }
}

#[test]
fn encode_decode_round_trip() {
    let value = full_measurement();
    let bytes = encode(&value, all_features(), &TABLE).unwrap();
    assert_eq!(bytes.len(), TABLE.encoded_len(value.flags));
    let back = decode(&bytes, &TABLE).unwrap();
    assert_eq!(back, value);
}

#[test]
fn encode_downgrades_gated_fields_silently() {
    let value = full_measurement();
    // FEAT_B disabled: the 3- and 4-byte fields must vanish and their flag
    // bits must be cleared; later fields keep their values.
    let bytes = encode(&value, FEAT_A, &TABLE).unwrap();
    let back = decode(&bytes, &TABLE).unwrap();
    assert_eq!(back.flags, 0x0013 | STATIC_BIT);
    assert_eq!(back.mandatory, vec![0x1234]);
    assert_eq!(back.optional, vec![0xAA, 0xBBCC, 0x0011_2233_4455_66]);
}

#[test]
fn encode_rejects_missing_field_values() {
    let mut value = full_measurement();
    value.optional.pop();
    let err = encode(&value, all_features(), &TABLE).unwrap_err();
    assert!(matches!(err, ProfileError::InvalidParameter(_)));
}

#[test]
fn encode_rejects_mandatory_count_mismatch() {
    let mut value = full_measurement();
    value.mandatory.clear();
    assert!(matches!(
        encode(&value, all_features(), &TABLE),
        Err(ProfileError::InvalidParameter(_))
    ));
}

#[test]
fn decode_rejects_truncated_input() {
    let value = full_measurement();
    let mut bytes = encode(&value, all_features(), &TABLE).unwrap();
    bytes.pop();
    assert!(matches!(
        decode(&bytes, &TABLE),
        Err(ProfileError::UnexpectedLength { .. })
    ));
}

#[test]
fn small_value_is_not_split() {
    let value = Measurement {
        flags: 0x0001,
        mandatory: vec![42],
        optional: vec![7],
    };
    let full = encode(&value, all_features(), &TABLE).unwrap();
    let parts = split(&value, all_features(), &TABLE, 20).unwrap();
    assert!(!parts.pending());
    assert_eq!(parts.first, full);
}

#[test]
fn oversized_value_splits_in_order() {
    let value = full_measurement();
    let full = encode(&value, all_features(), &TABLE).unwrap();
    // Budget below the 21-byte full encoding forces a continuation.
    let budget = 14;
    let parts = split(&value, all_features(), &TABLE, budget).unwrap();
    let second = parts.second.clone().expect("continuation expected");
    assert!(parts.first.len() <= budget);
    assert!(second.len() <= budget);

    // Each fragment is itself a decodable measurement.
    let first = decode(&parts.first, &TABLE).unwrap();
    let tail = decode(&second, &TABLE).unwrap();

    // Static bit replicated, presence bits disjoint and complete.
    assert_ne!(first.flags & STATIC_BIT, 0);
    assert_ne!(tail.flags & STATIC_BIT, 0);
    let field_mask = TABLE.field_flag_mask();
    assert_eq!(first.flags & tail.flags & field_mask, 0);
    assert_eq!((first.flags | tail.flags) & field_mask, value.flags & field_mask);

    // Concatenating the variable-field bytes of both fragments reproduces
    // the original variable-field byte sequence.
    let prefix = TABLE.mandatory_len();
    let mut joined = parts.first[prefix..].to_vec();
    joined.extend_from_slice(&second[prefix..]);
    assert_eq!(joined, full[prefix..].to_vec());
}

#[test]
fn split_switch_to_second_fragment_is_permanent() {
    // Field order: 1, 2, 3, 4, 7 bytes after a 4-byte prefix. With budget 10
    // the 4-byte field forces the switch even though no later field would fit
    // fragment 1 either; with a table ending in a small field the small field
    // must still land in fragment 2.
    static TAIL_FIELDS: [FieldDescriptor; 3] = [
        FieldDescriptor::plain(0x0001, 4),
        FieldDescriptor::plain(0x0002, 4),
        FieldDescriptor::plain(0x0004, 1),
    ];
    static TAIL_TABLE: FieldTable = FieldTable::new(&[2], &TAIL_FIELDS);
    let value = Measurement {
        flags: 0x0007,
        mandatory: vec![0],
        optional: vec![1, 2, 3],
    };
    let parts = split(&value, FeatureMask::empty(), &TAIL_TABLE, 9).unwrap();
    let first = decode(&parts.first, &TAIL_TABLE).unwrap();
    let tail = decode(&parts.second.unwrap(), &TAIL_TABLE).unwrap();
    assert_eq!(first.flags, 0x0001);
    // The 1-byte field would fit fragment 1's leftover byte, but the walk
    // never moves back.
    assert_eq!(tail.flags, 0x0002 | 0x0004);
}

#[test]
fn validate_rejects_tables_needing_three_fragments() {
    static WIDE_FIELDS: [FieldDescriptor; 4] = [
        FieldDescriptor::plain(0x0001, 7),
        FieldDescriptor::plain(0x0002, 7),
        FieldDescriptor::plain(0x0004, 7),
        FieldDescriptor::plain(0x0008, 7),
    ];
    static WIDE_TABLE: FieldTable = FieldTable::new(&[2], &WIDE_FIELDS);
    // 4 + 28 field bytes can never fit two 12-byte fragments.
    assert!(WIDE_TABLE.validate(12).is_err());
    // A generous budget passes.
    assert!(WIDE_TABLE.validate(24).is_ok());
}

#[test]
fn validate_rejects_duplicate_flags_and_bad_widths() {
    static DUP: [FieldDescriptor; 2] = [
        FieldDescriptor::plain(0x0001, 2),
        FieldDescriptor::plain(0x0001, 2),
    ];
    static DUP_TABLE: FieldTable = FieldTable::new(&[], &DUP);
    assert!(DUP_TABLE.validate(20).is_err());

    static WIDE: [FieldDescriptor; 1] = [FieldDescriptor::plain(0x0001, 8)];
    static WIDE_TABLE: FieldTable = FieldTable::new(&[], &WIDE);
    assert!(WIDE_TABLE.validate(20).is_err());
}

#[test]
fn flags_word_sits_at_offset_zero() {
    let value = full_measurement();
    let bytes = encode(&value, all_features(), &TABLE).unwrap();
    let flags = u16::from_le_bytes([bytes[0], bytes[1]]);
    assert_eq!(flags, value.flags);
    assert_eq!(MEASUREMENT_FLAGS_SIZE, 2);
}
