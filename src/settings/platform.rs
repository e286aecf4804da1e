use crate::settings::{
    SettingsError,
    nvm::{Eeprom, Nvm, RECORD_HEADER_LEN, SEGMENT_SIZE},
};

/// Services the settings engine needs from the device.
///
/// `load` and `save` move whole blobs keyed by `(kind, slot)`; where the
/// bytes live is up to the implementation.
pub trait Platform {
    /// Copies the blob saved for `(kind, slot)` into `buf` and returns its length.
    fn load(&mut self, kind: u8, slot: u8, buf: &mut [u8]) -> Result<usize, SettingsError>;
    /// Persists `blob` for `(kind, slot)`.
    fn save(&mut self, kind: u8, slot: u8, blob: &[u8]) -> Result<(), SettingsError>;
    /// Forgets whatever is saved for `(kind, slot)`.
    fn erase(&mut self, kind: u8, slot: u8) -> Result<(), SettingsError>;
    /// Device serial number or address reported to remote tools.
    fn serial_number(&self) -> u32;
    /// Free-running millisecond counter.
    fn tick_ms(&self) -> u32;
    /// Restarts the device. Called by the reset commands.
    fn reset(&mut self) {}
}

/// Segments reserved for each slot's record.
pub const SEGMENTS_PER_SLOT: usize = 2;
/// Largest blob that fits a slot's segments after the record header.
pub const SLOT_BLOB_CAPACITY: usize = SEGMENTS_PER_SLOT * SEGMENT_SIZE - RECORD_HEADER_LEN;

/// Segment holding the blob for `slot`. Segment 0 is never used.
pub const fn segment_for_slot(slot: u8) -> usize {
    slot as usize * SEGMENTS_PER_SLOT + 1
}

fn no_clock() -> u32 {
    0
}

fn no_reset() {}

/// [`Platform`] storing one record per slot in EEPROM segments.
///
/// The kind is not part of the address; a blob saved under another kind is
/// rejected by the header check on load.
pub struct NvmPlatform<E: Eeprom> {
    nvm: Nvm<E>,
    serial: u32,
    clock: fn() -> u32,
    on_reset: fn(),
}

impl<E: Eeprom> NvmPlatform<E> {
    pub fn new(eeprom: E, serial: u32) -> Self {
        Self {
            nvm: Nvm::new(eeprom),
            serial,
            clock: no_clock,
            on_reset: no_reset,
        }
    }

    /// Uses `clock` as the millisecond tick source.
    pub fn with_clock(self, clock: fn() -> u32) -> Self {
        Self { clock, ..self }
    }

    /// Calls `on_reset` when a reset is requested.
    pub fn with_reset(self, on_reset: fn()) -> Self {
        Self { on_reset, ..self }
    }

    pub fn nvm(&mut self) -> &mut Nvm<E> {
        &mut self.nvm
    }
}

impl<E: Eeprom> Platform for NvmPlatform<E> {
    fn load(&mut self, _kind: u8, slot: u8, buf: &mut [u8]) -> Result<usize, SettingsError> {
        self.nvm.read(segment_for_slot(slot), buf)
    }

    /// Blobs longer than [`SLOT_BLOB_CAPACITY`] are refused with
    /// [`SettingsError::BufferFull`] before storage is touched.
    fn save(&mut self, _kind: u8, slot: u8, blob: &[u8]) -> Result<(), SettingsError> {
        if blob.len() > SLOT_BLOB_CAPACITY {
            warn!("slot {}: {} byte blob does not fit", slot, blob.len());
            return Err(SettingsError::BufferFull);
        }
        self.nvm.write(segment_for_slot(slot), blob)
    }

    fn erase(&mut self, _kind: u8, slot: u8) -> Result<(), SettingsError> {
        self.nvm.erase(segment_for_slot(slot))
    }

    fn serial_number(&self) -> u32 {
        self.serial
    }

    fn tick_ms(&self) -> u32 {
        (self.clock)()
    }

    fn reset(&mut self) {
        (self.on_reset)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::test_support::MemEeprom;

    #[test]
    fn slots_map_to_odd_segments() {
        assert_eq!(segment_for_slot(0), 1);
        assert_eq!(segment_for_slot(1), 3);
        assert_eq!(segment_for_slot(7), 15);
    }

    #[test]
    fn save_load_erase_by_slot() {
        let mut p = NvmPlatform::new(MemEeprom::new(), 0x8100_0001).with_clock(|| 42);
        p.save(0, 2, b"blob").unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(p.load(0, 2, &mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"blob");
        assert_eq!(p.load(0, 1, &mut buf), Err(SettingsError::BadMagic));

        // record sits at segment 5, segment 0 is untouched
        let mut raw = [0u8; SEGMENT_SIZE];
        p.nvm().read_raw(5, &mut raw).unwrap();
        assert_eq!(raw[6..10], *b"blob");
        p.nvm().read_raw(0, &mut raw).unwrap();
        assert!(raw.iter().all(|b| *b == 0xFF));

        p.erase(0, 2).unwrap();
        assert_eq!(p.load(0, 2, &mut buf), Err(SettingsError::BadMagic));

        assert_eq!(p.serial_number(), 0x8100_0001);
        assert_eq!(p.tick_ms(), 42);
    }

    #[test]
    fn oversized_blob_leaves_next_slot_intact() {
        let mut p = NvmPlatform::new(MemEeprom::new(), 0);
        p.save(0, 2, b"slot-two").unwrap();

        let full = [0x5Au8; SLOT_BLOB_CAPACITY];
        p.save(0, 1, &full).unwrap();
        assert_eq!(
            p.save(0, 1, &[0x5A; SLOT_BLOB_CAPACITY + 1]),
            Err(SettingsError::BufferFull)
        );

        let mut buf = [0u8; SLOT_BLOB_CAPACITY];
        assert_eq!(p.load(0, 2, &mut buf).unwrap(), 8);
        assert_eq!(&buf[..8], b"slot-two");
        // the refused save did not touch slot 1 either
        assert_eq!(p.load(0, 1, &mut buf).unwrap(), SLOT_BLOB_CAPACITY);
        assert_eq!(buf, full);
    }
}
