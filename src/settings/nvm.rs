//! Sector persistence over a byte-addressed EEPROM.
//!
//! Each saved blob occupies one or more consecutive segments:
//!
//! ```text
//! [magic:4 BE][len:1][crc8:1][payload:len]
//! ```
//!
//! Saving erases every segment the record spans before writing it, so a
//! power cut in between leaves erased segments that read back as
//! [`SettingsError::BadMagic`].

use crate::settings::{SettingsError, crc::crc8};

/// Erase granularity in bytes.
pub const SEGMENT_SIZE: usize = 64;
/// Bytes preceding the payload in a record.
pub const RECORD_HEADER_LEN: usize = 6;
/// Marks the start of a valid record.
pub const MAGIC: u32 = 0xA501_EF5A;

const ERASED: u8 = 0xFF;

/// Raw byte access to the underlying memory.
pub trait Eeprom {
    /// Number of `SEGMENT_SIZE` segments available.
    fn segment_count(&self) -> usize;
    /// Reads `buf.len()` bytes starting at `addr`.
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), SettingsError>;
    /// Writes `data` starting at `addr`.
    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), SettingsError>;

    /// Returns one segment to the erased state.
    fn erase(&mut self, segment: usize) -> Result<(), SettingsError> {
        self.write(segment * SEGMENT_SIZE, &[ERASED; SEGMENT_SIZE])
    }
}

/// Record-level access to segments of an [`Eeprom`].
pub struct Nvm<E: Eeprom> {
    eeprom: E,
}

impl<E: Eeprom> Nvm<E> {
    pub fn new(eeprom: E) -> Self {
        Self { eeprom }
    }

    pub fn eeprom(&self) -> &E {
        &self.eeprom
    }

    pub fn eeprom_mut(&mut self) -> &mut E {
        &mut self.eeprom
    }

    pub fn into_inner(self) -> E {
        self.eeprom
    }

    fn check_span(&self, segment: usize, bytes: usize) -> Result<usize, SettingsError> {
        let span = bytes.div_ceil(SEGMENT_SIZE).max(1);
        if segment + span > self.eeprom.segment_count() {
            return Err(SettingsError::Storage);
        }
        Ok(span)
    }

    /// Reads the record at `segment` into `buf` and returns its payload length.
    pub fn read(&mut self, segment: usize, buf: &mut [u8]) -> Result<usize, SettingsError> {
        self.check_span(segment, RECORD_HEADER_LEN)?;
        let addr = segment * SEGMENT_SIZE;

        let mut head = [0u8; RECORD_HEADER_LEN];
        self.eeprom.read(addr, &mut head)?;
        let magic = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
        if magic != MAGIC {
            return Err(SettingsError::BadMagic);
        }
        let len = head[4] as usize;
        if len == 0 {
            return Err(SettingsError::Empty);
        }
        self.check_span(segment, RECORD_HEADER_LEN + len)?;
        let payload = buf.get_mut(..len).ok_or(SettingsError::BufferFull)?;

        self.eeprom.read(addr + RECORD_HEADER_LEN, payload)?;
        if crc8(payload) != head[5] {
            warn!("segment {}: crc mismatch", segment);
            return Err(SettingsError::CrcMismatch);
        }
        Ok(len)
    }

    /// Erases the segments `payload` needs, then writes the record.
    ///
    /// The erase-write sequence runs inside a critical section.
    pub fn write(&mut self, segment: usize, payload: &[u8]) -> Result<(), SettingsError> {
        if payload.is_empty() {
            return Err(SettingsError::Empty);
        }
        let len = u8::try_from(payload.len()).map_err(|_| SettingsError::BufferFull)?;
        let span = self.check_span(segment, RECORD_HEADER_LEN + payload.len())?;

        let mut head = [0u8; RECORD_HEADER_LEN];
        head[..4].copy_from_slice(&MAGIC.to_be_bytes());
        head[4] = len;
        head[5] = crc8(payload);

        let addr = segment * SEGMENT_SIZE;
        critical_section::with(|_| {
            for s in segment..segment + span {
                self.eeprom.erase(s)?;
            }
            self.eeprom.write(addr, &head)?;
            self.eeprom.write(addr + RECORD_HEADER_LEN, payload)
        })
    }

    /// Fills one segment with `0xFF`.
    pub fn erase(&mut self, segment: usize) -> Result<(), SettingsError> {
        self.check_span(segment, SEGMENT_SIZE)?;
        critical_section::with(|_| self.eeprom.erase(segment))
    }

    /// Copies a whole segment without interpreting it.
    pub fn read_raw(
        &mut self,
        segment: usize,
        buf: &mut [u8; SEGMENT_SIZE],
    ) -> Result<(), SettingsError> {
        self.check_span(segment, SEGMENT_SIZE)?;
        self.eeprom.read(segment * SEGMENT_SIZE, buf)
    }
}
