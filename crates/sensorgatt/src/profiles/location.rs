//! Location and navigation profile tables

use crate::codec::{FeatureMask, FieldDescriptor, FieldTable};
use crate::control::{OpcodeSpec, OpcodeTable};
use crate::server::{CccKind, CharacteristicId, CharacteristicSpec, Handle, ProfileDefinition};

// Feature bits
pub const FEAT_INSTANTANEOUS_SPEED: FeatureMask = FeatureMask::from_bits_retain(1 << 0);
pub const FEAT_TOTAL_DISTANCE: FeatureMask = FeatureMask::from_bits_retain(1 << 1);
pub const FEAT_LOCATION: FeatureMask = FeatureMask::from_bits_retain(1 << 2);
pub const FEAT_ELEVATION: FeatureMask = FeatureMask::from_bits_retain(1 << 3);
pub const FEAT_HEADING: FeatureMask = FeatureMask::from_bits_retain(1 << 4);
pub const FEAT_ROLLING_TIME: FeatureMask = FeatureMask::from_bits_retain(1 << 5);
pub const FEAT_UTC_TIME: FeatureMask = FeatureMask::from_bits_retain(1 << 6);
pub const FEAT_NAVIGATION: FeatureMask = FeatureMask::from_bits_retain(1 << 7);

// Location and speed flags word. Position status and source bits above the
// field range are static.
pub const FLAG_INSTANTANEOUS_SPEED: u16 = 0x0001;
pub const FLAG_TOTAL_DISTANCE: u16 = 0x0002;
pub const FLAG_LATITUDE: u16 = 0x0004;
pub const FLAG_LONGITUDE: u16 = 0x0008;
pub const FLAG_ELEVATION: u16 = 0x0010;
pub const FLAG_HEADING: u16 = 0x0020;
pub const FLAG_ROLLING_TIME: u16 = 0x0040;
pub const FLAG_UTC_TIME: u16 = 0x0080;
pub const FLAG_POSITION_STATUS: u16 = 0x0300;
pub const FLAG_ELEVATION_SOURCE: u16 = 0x0C00;
pub const FLAG_HEADING_SOURCE: u16 = 0x1000;

// No mandatory field; everything is flag-selected. The 3-byte total
// distance and 7-byte UTC time need explicit non-native widths.
static LOCATION_SPEED_FIELDS: [FieldDescriptor; 8] = [
    FieldDescriptor::new(FLAG_INSTANTANEOUS_SPEED, 2, FEAT_INSTANTANEOUS_SPEED),
    FieldDescriptor::new(FLAG_TOTAL_DISTANCE, 3, FEAT_TOTAL_DISTANCE),
    FieldDescriptor::new(FLAG_LATITUDE, 4, FEAT_LOCATION),
    FieldDescriptor::new(FLAG_LONGITUDE, 4, FEAT_LOCATION),
    FieldDescriptor::new(FLAG_ELEVATION, 3, FEAT_ELEVATION),
    FieldDescriptor::new(FLAG_HEADING, 2, FEAT_HEADING),
    FieldDescriptor::new(FLAG_ROLLING_TIME, 1, FEAT_ROLLING_TIME),
    FieldDescriptor::new(FLAG_UTC_TIME, 7, FEAT_UTC_TIME),
];
pub static LOCATION_SPEED_TABLE: FieldTable = FieldTable::new(&[], &LOCATION_SPEED_FIELDS);

// Control point opcodes
pub const OP_SET_CUMULATIVE_DISTANCE: u8 = 0x01;
pub const OP_MASK_CONTENT: u8 = 0x02;
pub const OP_NAVIGATION_CONTROL: u8 = 0x03;
pub const OP_REQUEST_NUMBER_OF_ROUTES: u8 = 0x04;
pub const OP_REQUEST_NAME_OF_ROUTE: u8 = 0x05;
pub const OP_SELECT_ROUTE: u8 = 0x06;

/// Navigation control selector range (stop, start, pause, resume, skip
/// waypoint, set nearest).
pub const NAVIGATION_CONTROL_MAX: u32 = 5;
pub const CONTENT_MASK_BITS: u32 = 0x00FF;

static OPCODES: [OpcodeSpec; 6] = [
    // Cumulative distance is a uint24, hence the 3-byte operand.
    OpcodeSpec::new(OP_SET_CUMULATIVE_DISTANCE, FEAT_TOTAL_DISTANCE, 3, None),
    OpcodeSpec::new(OP_MASK_CONTENT, FeatureMask::empty(), 2, Some(0..=CONTENT_MASK_BITS)),
    OpcodeSpec::new(OP_NAVIGATION_CONTROL, FEAT_NAVIGATION, 1, Some(0..=NAVIGATION_CONTROL_MAX)),
    OpcodeSpec::new(OP_REQUEST_NUMBER_OF_ROUTES, FEAT_NAVIGATION, 0, None),
    OpcodeSpec::new(OP_REQUEST_NAME_OF_ROUTE, FEAT_NAVIGATION, 2, None),
    OpcodeSpec::new(OP_SELECT_ROUTE, FEAT_NAVIGATION, 2, None),
];

// Characteristic identities
pub const LOCATION_SPEED: CharacteristicId = CharacteristicId(0);
pub const NAVIGATION: CharacteristicId = CharacteristicId(1);
pub const CONTROL_POINT: CharacteristicId = CharacteristicId(2);

/// Optional-characteristic mask bit for the navigation characteristic.
pub const OPT_NAVIGATION: u32 = 1 << 0;

// Default attribute handle layout
pub const FEATURE_VALUE_HANDLE: Handle = 0x0020;
pub const LOCATION_SPEED_VALUE_HANDLE: Handle = 0x0022;
pub const LOCATION_SPEED_CCC_HANDLE: Handle = 0x0023;
pub const NAVIGATION_VALUE_HANDLE: Handle = 0x0025;
pub const NAVIGATION_CCC_HANDLE: Handle = 0x0026;
pub const CONTROL_POINT_VALUE_HANDLE: Handle = 0x0028;
pub const CONTROL_POINT_CCC_HANDLE: Handle = 0x0029;

/// Location and navigation profile with the default handle layout.
pub fn profile() -> ProfileDefinition {
    ProfileDefinition {
        name: "location-navigation",
        fields: &LOCATION_SPEED_TABLE,
        opcodes: OpcodeTable(&OPCODES),
        characteristics: vec![
            CharacteristicSpec {
                id: LOCATION_SPEED,
                ccc: CccKind::Notify,
                value_handle: LOCATION_SPEED_VALUE_HANDLE,
                ccc_handle: LOCATION_SPEED_CCC_HANDLE,
                optional_bit: None,
            },
            CharacteristicSpec {
                id: NAVIGATION,
                ccc: CccKind::Notify,
                value_handle: NAVIGATION_VALUE_HANDLE,
                ccc_handle: NAVIGATION_CCC_HANDLE,
                optional_bit: Some(OPT_NAVIGATION),
            },
            CharacteristicSpec {
                id: CONTROL_POINT,
                ccc: CccKind::Indicate,
                value_handle: CONTROL_POINT_VALUE_HANDLE,
                ccc_handle: CONTROL_POINT_CCC_HANDLE,
                optional_bit: None,
            },
        ],
        measurement: LOCATION_SPEED,
        control_point: Some(CONTROL_POINT),
        feature_handle: FEATURE_VALUE_HANDLE,
    }
}
