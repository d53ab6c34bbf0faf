//! Cycling power profile tables

use crate::codec::{FeatureMask, FieldDescriptor, FieldTable};
use crate::control::{OpcodeSpec, OpcodeTable};
use crate::server::{CccKind, CharacteristicId, CharacteristicSpec, Handle, ProfileDefinition};

// Feature bits published in the feature characteristic
pub const FEAT_PEDAL_POWER_BALANCE: FeatureMask = FeatureMask::from_bits_retain(1 << 0);
pub const FEAT_ACCUMULATED_TORQUE: FeatureMask = FeatureMask::from_bits_retain(1 << 1);
pub const FEAT_WHEEL_REV_DATA: FeatureMask = FeatureMask::from_bits_retain(1 << 2);
pub const FEAT_CRANK_REV_DATA: FeatureMask = FeatureMask::from_bits_retain(1 << 3);
pub const FEAT_EXTREME_MAGNITUDES: FeatureMask = FeatureMask::from_bits_retain(1 << 4);
pub const FEAT_EXTREME_ANGLES: FeatureMask = FeatureMask::from_bits_retain(1 << 5);
pub const FEAT_DEAD_SPOT_ANGLES: FeatureMask = FeatureMask::from_bits_retain(1 << 6);
pub const FEAT_ACCUMULATED_ENERGY: FeatureMask = FeatureMask::from_bits_retain(1 << 7);
pub const FEAT_OFFSET_COMPENSATION: FeatureMask = FeatureMask::from_bits_retain(1 << 8);
pub const FEAT_CONTENT_MASKING: FeatureMask = FeatureMask::from_bits_retain(1 << 9);
pub const FEAT_MULTIPLE_SENSOR_LOCATIONS: FeatureMask = FeatureMask::from_bits_retain(1 << 10);
pub const FEAT_CRANK_LENGTH_ADJUSTMENT: FeatureMask = FeatureMask::from_bits_retain(1 << 11);
pub const FEAT_EXTENDED_CALIBRATION: FeatureMask = FeatureMask::from_bits_retain(1 << 12);

// Measurement flags word. Bits without a field entry below (balance
// reference, torque source, offset compensation indicator) are static and
// travel in both fragments of a split value.
pub const FLAG_PEDAL_POWER_BALANCE: u16 = 0x0001;
pub const FLAG_PEDAL_POWER_BALANCE_REFERENCE: u16 = 0x0002;
pub const FLAG_ACCUMULATED_TORQUE: u16 = 0x0004;
pub const FLAG_ACCUMULATED_TORQUE_SOURCE: u16 = 0x0008;
pub const FLAG_WHEEL_REV_DATA: u16 = 0x0010;
pub const FLAG_CRANK_REV_DATA: u16 = 0x0020;
pub const FLAG_EXTREME_FORCE_MAGNITUDES: u16 = 0x0040;
pub const FLAG_EXTREME_ANGLES: u16 = 0x0080;
pub const FLAG_TOP_DEAD_SPOT_ANGLE: u16 = 0x0100;
pub const FLAG_BOTTOM_DEAD_SPOT_ANGLE: u16 = 0x0200;
pub const FLAG_ACCUMULATED_ENERGY: u16 = 0x0400;
pub const FLAG_OFFSET_COMPENSATION_INDICATOR: u16 = 0x0800;

// Mandatory instantaneous power (sint16) after the flags word, then the
// optional fields in wire order.
static MEASUREMENT_FIELDS: [FieldDescriptor; 9] = [
    FieldDescriptor::new(FLAG_PEDAL_POWER_BALANCE, 1, FEAT_PEDAL_POWER_BALANCE),
    FieldDescriptor::new(FLAG_ACCUMULATED_TORQUE, 2, FEAT_ACCUMULATED_TORQUE),
    FieldDescriptor::new(FLAG_WHEEL_REV_DATA, 6, FEAT_WHEEL_REV_DATA),
    FieldDescriptor::new(FLAG_CRANK_REV_DATA, 4, FEAT_CRANK_REV_DATA),
    FieldDescriptor::new(FLAG_EXTREME_FORCE_MAGNITUDES, 4, FEAT_EXTREME_MAGNITUDES),
    FieldDescriptor::new(FLAG_EXTREME_ANGLES, 3, FEAT_EXTREME_ANGLES),
    FieldDescriptor::new(FLAG_TOP_DEAD_SPOT_ANGLE, 2, FEAT_DEAD_SPOT_ANGLES),
    FieldDescriptor::new(FLAG_BOTTOM_DEAD_SPOT_ANGLE, 2, FEAT_DEAD_SPOT_ANGLES),
    FieldDescriptor::new(FLAG_ACCUMULATED_ENERGY, 2, FEAT_ACCUMULATED_ENERGY),
];
pub static MEASUREMENT_TABLE: FieldTable = FieldTable::new(&[2], &MEASUREMENT_FIELDS);

// Control point opcodes
pub const OP_SET_CUMULATIVE_VALUE: u8 = 0x01;
pub const OP_UPDATE_SENSOR_LOCATION: u8 = 0x02;
pub const OP_REQUEST_SUPPORTED_SENSOR_LOCATIONS: u8 = 0x03;
pub const OP_SET_CRANK_LENGTH: u8 = 0x04;
pub const OP_REQUEST_CRANK_LENGTH: u8 = 0x05;
pub const OP_START_OFFSET_COMPENSATION: u8 = 0x06;
pub const OP_MASK_MEASUREMENT_CONTENT: u8 = 0x07;
pub const OP_REQUEST_SAMPLING_RATE: u8 = 0x08;
pub const OP_REQUEST_CALIBRATION_DATE: u8 = 0x09;

/// Highest defined sensor location selector.
pub const SENSOR_LOCATION_MAX: u32 = 16;

// The content mask covers a fixed set of 9 maskable field groups; it does
// not grow with the measurement table.
pub const CONTENT_MASK_BITS: u32 = 0x01FF;

static OPCODES: [OpcodeSpec; 9] = [
    OpcodeSpec::new(OP_SET_CUMULATIVE_VALUE, FEAT_WHEEL_REV_DATA, 4, None),
    OpcodeSpec::new(
        OP_UPDATE_SENSOR_LOCATION,
        FEAT_MULTIPLE_SENSOR_LOCATIONS,
        1,
        Some(0..=SENSOR_LOCATION_MAX),
    ),
    OpcodeSpec::new(OP_REQUEST_SUPPORTED_SENSOR_LOCATIONS, FEAT_MULTIPLE_SENSOR_LOCATIONS, 0, None),
    OpcodeSpec::new(OP_SET_CRANK_LENGTH, FEAT_CRANK_LENGTH_ADJUSTMENT, 2, None),
    OpcodeSpec::new(OP_REQUEST_CRANK_LENGTH, FEAT_CRANK_LENGTH_ADJUSTMENT, 0, None),
    OpcodeSpec::new(OP_START_OFFSET_COMPENSATION, FEAT_OFFSET_COMPENSATION, 0, None),
    OpcodeSpec::new(OP_MASK_MEASUREMENT_CONTENT, FEAT_CONTENT_MASKING, 2, Some(0..=CONTENT_MASK_BITS)),
    OpcodeSpec::new(OP_REQUEST_SAMPLING_RATE, FeatureMask::empty(), 0, None),
    OpcodeSpec::new(OP_REQUEST_CALIBRATION_DATE, FEAT_EXTENDED_CALIBRATION, 0, None),
];

// Characteristic identities within the profile
pub const MEASUREMENT: CharacteristicId = CharacteristicId(0);
pub const VECTOR: CharacteristicId = CharacteristicId(1);
pub const CONTROL_POINT: CharacteristicId = CharacteristicId(2);

/// Optional-characteristic mask bit for the power vector characteristic.
pub const OPT_VECTOR: u32 = 1 << 0;

// Default attribute handle layout
pub const FEATURE_VALUE_HANDLE: Handle = 0x0010;
pub const MEASUREMENT_VALUE_HANDLE: Handle = 0x0012;
pub const MEASUREMENT_CCC_HANDLE: Handle = 0x0013;
pub const VECTOR_VALUE_HANDLE: Handle = 0x0015;
pub const VECTOR_CCC_HANDLE: Handle = 0x0016;
pub const CONTROL_POINT_VALUE_HANDLE: Handle = 0x0018;
pub const CONTROL_POINT_CCC_HANDLE: Handle = 0x0019;

/// Cycling power profile with the default handle layout.
pub fn profile() -> ProfileDefinition {
    ProfileDefinition {
        name: "cycling-power",
        fields: &MEASUREMENT_TABLE,
        opcodes: OpcodeTable(&OPCODES),
        characteristics: vec![
            CharacteristicSpec {
                id: MEASUREMENT,
                ccc: CccKind::Notify,
                value_handle: MEASUREMENT_VALUE_HANDLE,
                ccc_handle: MEASUREMENT_CCC_HANDLE,
                optional_bit: None,
            },
            CharacteristicSpec {
                id: VECTOR,
                ccc: CccKind::Notify,
                value_handle: VECTOR_VALUE_HANDLE,
                ccc_handle: VECTOR_CCC_HANDLE,
                optional_bit: Some(OPT_VECTOR),
            },
            CharacteristicSpec {
                id: CONTROL_POINT,
                ccc: CccKind::Indicate,
                value_handle: CONTROL_POINT_VALUE_HANDLE,
                ccc_handle: CONTROL_POINT_CCC_HANDLE,
                optional_bit: None,
            },
        ],
        measurement: MEASUREMENT,
        control_point: Some(CONTROL_POINT),
        feature_handle: FEATURE_VALUE_HANDLE,
    }
}
