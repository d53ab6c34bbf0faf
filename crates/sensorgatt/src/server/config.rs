//! Per-connection Client Characteristic Configuration store

use super::types::{CccKind, CccValue, CharacteristicId, CharacteristicSpec, ConfigSnapshot};
use crate::constants::*;
use crate::error::AttStatus;
use byteorder::{ByteOrder, LittleEndian};

/// Current notify/indicate enablement of one characteristic.
#[derive(Debug, Clone, Copy)]
struct ConfigurationRecord {
    id: CharacteristicId,
    kind: CccKind,
    value: CccValue,
}

/// CCC values for every characteristic present in a service instance.
///
/// One store per connection; created at enable with defaults (everything
/// stopped) or a restored snapshot, mutated by peer descriptor writes.
#[derive(Debug, Clone)]
pub struct ConfigurationStore {
    records: Vec<ConfigurationRecord>,
}

impl ConfigurationStore {
    /// Build the store for the characteristics this instance exposes.
    pub fn new(characteristics: &[CharacteristicSpec], optional_mask: u32) -> Self {
        let records = characteristics
            .iter()
            .filter(|spec| spec.optional_bit.map_or(true, |bit| optional_mask & bit != 0))
            .map(|spec| ConfigurationRecord {
                id: spec.id,
                kind: spec.ccc,
                value: CccValue::Stop,
            })
            .collect();
        Self { records }
    }

    /// Restore values from a previous session. Entries for characteristics
    /// not present in this instance are ignored, as are values the
    /// characteristic cannot accept.
    pub fn apply_snapshot(&mut self, snapshot: &ConfigSnapshot) {
        for (id, value) in snapshot {
            if let Some(record) = self.records.iter_mut().find(|r| r.id == *id) {
                if Self::accepts(record.kind, *value) {
                    record.value = *value;
                }
            }
        }
    }

    fn accepts(kind: CccKind, value: CccValue) -> bool {
        matches!(
            (kind, value),
            (_, CccValue::Stop) | (CccKind::Notify, CccValue::Notify) | (CccKind::Indicate, CccValue::Indicate)
        )
    }

    /// Validate and apply a peer CCC write. On rejection the stored value is
    /// left unchanged.
    pub fn set_raw(&mut self, id: CharacteristicId, raw: &[u8]) -> Result<CccValue, AttStatus> {
        if raw.len() != CCC_VALUE_LEN {
            return Err(AttStatus::InvalidAttributeValueLength);
        }
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AttStatus::InvalidHandle)?;

        let value = match LittleEndian::read_u16(raw) {
            CCC_VALUE_STOP => CccValue::Stop,
            CCC_VALUE_NOTIFY => CccValue::Notify,
            CCC_VALUE_INDICATE => CccValue::Indicate,
            _ => return Err(AttStatus::InvalidPdu),
        };
        if !Self::accepts(record.kind, value) {
            return Err(AttStatus::InvalidPdu);
        }
        record.value = value;
        Ok(value)
    }

    /// Current value, `None` if the characteristic is not in this instance.
    pub fn get(&self, id: CharacteristicId) -> Option<CccValue> {
        self.records.iter().find(|r| r.id == id).map(|r| r.value)
    }

    /// Wire encoding of the stored value, for peer reads of the descriptor.
    pub fn get_raw(&self, id: CharacteristicId) -> Option<[u8; CCC_VALUE_LEN]> {
        self.get(id).map(|v| v.raw().to_le_bytes())
    }

    /// Everything currently stored; reported back at disable.
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.records.iter().map(|r| (r.id, r.value)).collect()
    }
}
