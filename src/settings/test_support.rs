//! Test support utilities - only compiled in test builds.

use core::cell::Cell;

use crate::settings::{
    SettingsError,
    builder::SettingsBuilder,
    compose::{Composition, Layer},
    element::{Element, InputKind},
    engine::{AppInfo, SettingsEngine},
    nvm::{Eeprom, Nvm, SEGMENT_SIZE},
    platform::{Platform, segment_for_slot},
    resolved::Resolved,
    validate::{MinMax, Text},
    value::Value,
};

const SEGMENTS: usize = 16;

/// 1 KiB of RAM standing in for an EEPROM, 16 segments of 64 bytes.
#[derive(Clone)]
pub struct MemEeprom {
    bytes: [u8; SEGMENTS * SEGMENT_SIZE],
    erases: [u32; SEGMENTS],
}

impl MemEeprom {
    pub fn new() -> Self {
        Self {
            bytes: [0xFF; SEGMENTS * SEGMENT_SIZE],
            erases: [0; SEGMENTS],
        }
    }

    /// XORs `mask` into the byte at `addr`.
    pub fn corrupt(&mut self, addr: usize, mask: u8) {
        self.bytes[addr] ^= mask;
    }

    pub fn erase_count(&self, segment: usize) -> u32 {
        self.erases[segment]
    }
}

impl Eeprom for MemEeprom {
    fn segment_count(&self) -> usize {
        SEGMENTS
    }

    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), SettingsError> {
        let src = self
            .bytes
            .get(addr..addr + buf.len())
            .ok_or(SettingsError::Storage)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), SettingsError> {
        let dst = self
            .bytes
            .get_mut(addr..addr + data.len())
            .ok_or(SettingsError::Storage)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn erase(&mut self, segment: usize) -> Result<(), SettingsError> {
        let at = segment * SEGMENT_SIZE;
        self.bytes[at..at + SEGMENT_SIZE].fill(0xFF);
        self.erases[segment] += 1;
        Ok(())
    }
}

/// Platform over [`MemEeprom`] that counts resets and advances its clock
/// by 5 ms per reading.
pub struct MemPlatform {
    pub nvm: Nvm<MemEeprom>,
    pub resets: u32,
    pub erases: u32,
    clock: Cell<u32>,
}

impl MemPlatform {
    pub fn new() -> Self {
        Self {
            nvm: Nvm::new(MemEeprom::new()),
            resets: 0,
            erases: 0,
            clock: Cell::new(0),
        }
    }
}

impl Platform for MemPlatform {
    fn load(&mut self, _kind: u8, slot: u8, buf: &mut [u8]) -> Result<usize, SettingsError> {
        self.nvm.read(segment_for_slot(slot), buf)
    }

    fn save(&mut self, _kind: u8, slot: u8, blob: &[u8]) -> Result<(), SettingsError> {
        self.nvm.write(segment_for_slot(slot), blob)
    }

    fn erase(&mut self, _kind: u8, slot: u8) -> Result<(), SettingsError> {
        self.erases += 1;
        self.nvm.erase(segment_for_slot(slot))
    }

    fn serial_number(&self) -> u32 {
        0x8123_4567
    }

    fn tick_ms(&self) -> u32 {
        let now = self.clock.get() + 5;
        self.clock.set(now);
        now
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

pub const LID: u16 = 2;
pub const CH: u16 = 3;
pub const NAME: u16 = 64;

pub static BASE: [Element; 3] = [
    Element::new(LID, Value::U8(1))
        .label("LID", "Logical ID")
        .format(InputKind::Dec, 3, b'i')
        .range(0, 100)
        .validator(&MinMax),
    Element::new(CH, Value::U8(18))
        .label("CHN", "Channel")
        .format(InputKind::Dec, 2, b'c')
        .range(11, 26)
        .validator(&MinMax),
    Element::new(NAME, Value::Str(b"node"))
        .capacity(8)
        .label("NAM", "Name")
        .format(InputKind::String, 8, b'n')
        .validator(&Text),
];

pub static BOARD: [Element; 2] = [
    Element::new(CH, Value::U8(25))
        .label("CHN", "Channel")
        .format(InputKind::Dec, 2, b'c')
        .range(11, 26)
        .validator(&MinMax),
    Element::new(70, Value::U16(1000)).label("INT", "Interval"),
];

pub static SLOT_CH: [Element; 1] = [Element::new(CH, Value::U8(15))
    .label("CHN", "Channel")
    .format(InputKind::Dec, 2, b'c')
    .range(11, 26)
    .validator(&MinMax)];

/// Custom-default list removing `CH`.
pub static REMOVE_CH: [u8; 2] = [CH as u8, 0x00];

/// Kind 1, slot 0, base layer only.
pub const fn base_only() -> Composition {
    Composition::new(1, 0).layer(Layer::Base, &BASE)
}

pub type TestResolved = Resolved<8, 16, 4>;

pub fn resolved_for(composition: &Composition) -> TestResolved {
    let mut r = TestResolved::new();
    r.merge(composition).unwrap();
    r
}

pub const APP: AppInfo = AppInfo {
    app_id: 0x1234_5678,
    firmware_version: 0x0001_0203,
    settings_version: 2,
    min_compatible_version: 1,
};

/// Kind 1 with slot 4 re-declaring `CH` in the slot layer; other slots fall
/// back to slot 0.
pub static REGISTRY: [Composition; 2] = [
    base_only(),
    Composition::new(1, 4)
        .layer(Layer::Base, &BASE)
        .layer(Layer::Slot, &SLOT_CH),
];

pub type TestEngine = SettingsEngine<MemPlatform, 8, 16, 4>;

/// Engine over [`REGISTRY`] with kind 1, slot 0 selected.
pub fn test_engine() -> TestEngine {
    let mut engine = SettingsBuilder::new(APP)
        .registry(&REGISTRY)
        .platform(MemPlatform::new())
        .build::<8, 16, 4>();
    engine.set_settings(1, 0).unwrap();
    engine
}
