//! Save-format framing.
//!
//! ```text
//! [format:1][app_hash:1][version:1][kind:1][slot:1][len:1][(id:1, tag:1, value:N)*]
//! ```
//!
//! `len` counts the bytes of the element collection that follows it.

use crate::settings::{
    SettingsError,
    cursor::{Reader, Writer},
    value::Value,
};

/// Current save-format version.
pub const FORMAT_VERSION: u8 = 0x01;
/// Header bytes before the element collection, including the length byte.
pub const HEADER_LEN: usize = 6;

/// Fixed fields preceding a serialized element collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SliceHeader {
    pub format: u8,
    pub app_hash: u8,
    pub version: u8,
    pub kind: u8,
    pub slot: u8,
}

impl SliceHeader {
    pub fn new(app_hash: u8, version: u8, kind: u8, slot: u8) -> Self {
        Self {
            format: FORMAT_VERSION,
            app_hash,
            version,
            kind,
            slot,
        }
    }

    /// Checks that a stored blob may be applied.
    ///
    /// `slot` of `None` accepts any stored slot.
    pub fn verify(
        &self,
        app_hash: u8,
        min_version: u8,
        kind: u8,
        slot: Option<u8>,
    ) -> Result<(), SettingsError> {
        if self.app_hash != app_hash {
            return Err(SettingsError::AppMismatch);
        }
        if self.version < min_version {
            return Err(SettingsError::IncompatibleVersion);
        }
        if self.kind != kind {
            return Err(SettingsError::KindMismatch);
        }
        match slot {
            Some(slot) if slot != self.slot => Err(SettingsError::SlotMismatch),
            _ => Ok(()),
        }
    }
}

/// Parsed header plus a borrowed view of the element collection.
#[derive(Debug, Clone, Copy)]
pub struct Slice<'a> {
    header: SliceHeader,
    payload: &'a [u8],
}

impl<'a> Slice<'a> {
    /// Parses `bytes`, walking the whole collection once so later lookups
    /// cannot fail.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, SettingsError> {
        let mut r = Reader::new(bytes);
        let format = r.read_u8()?;
        if format != FORMAT_VERSION {
            return Err(SettingsError::UnknownFormat);
        }
        let header = SliceHeader {
            format,
            app_hash: r.read_u8()?,
            version: r.read_u8()?,
            kind: r.read_u8()?,
            slot: r.read_u8()?,
        };
        let len = r.read_u8()? as usize;
        let payload = r.take(len)?;

        let slice = Self { header, payload };
        for item in slice.iter() {
            item?;
        }
        Ok(slice)
    }

    pub fn header(&self) -> &SliceHeader {
        &self.header
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Iterates `(id, value)` pairs in stored order.
    pub fn iter(&self) -> SliceIter<'a> {
        SliceIter {
            reader: Reader::new(self.payload),
        }
    }

    /// Value stored for the wire id `id`, if any.
    pub fn find(&self, id: u8) -> Option<Value<'a>> {
        self.iter()
            .filter_map(Result::ok)
            .find(|(stored, _)| *stored == id)
            .map(|(_, v)| v)
    }
}

pub struct SliceIter<'a> {
    reader: Reader<'a>,
}

impl<'a> SliceIter<'a> {
    fn next_entry(&mut self) -> Result<(u8, Value<'a>), SettingsError> {
        let id = self.reader.read_u8()?;
        let tag = self.reader.read_u8()?;
        Ok((id, Value::decode(tag, &mut self.reader)?))
    }
}

impl<'a> Iterator for SliceIter<'a> {
    type Item = Result<(u8, Value<'a>), SettingsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.is_exhausted() {
            return None;
        }
        let item = self.next_entry();
        if item.is_err() {
            let rest = self.reader.remaining();
            let _ = self.reader.skip(rest);
        }
        Some(item)
    }
}

/// Assembles a blob: header first, entries appended, length patched last.
pub struct SliceWriter<'a> {
    w: Writer<'a>,
    len_at: usize,
    count: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn begin(buf: &'a mut [u8], header: SliceHeader) -> Result<Self, SettingsError> {
        let mut w = Writer::new(buf);
        w.write_u8(header.format)?;
        w.write_u8(header.app_hash)?;
        w.write_u8(header.version)?;
        w.write_u8(header.kind)?;
        w.write_u8(header.slot)?;
        let len_at = w.reserve_u8()?;
        Ok(Self {
            w,
            len_at,
            count: 0,
        })
    }

    /// Appends one `(id, value)` entry.
    pub fn push(&mut self, id: u8, value: Value<'_>) -> Result<(), SettingsError> {
        let start = self.w.position();
        let res = self.w.write_u8(id).and_then(|_| value.encode(&mut self.w));
        if res.is_err() {
            self.w.rewind(start);
        }
        res?;
        self.count += 1;
        Ok(())
    }

    /// Direct access for bulk writers such as [`Resolved::write_payload`].
    ///
    /// [`Resolved::write_payload`]: crate::settings::Resolved::write_payload
    pub fn writer(&mut self) -> &mut Writer<'a> {
        &mut self.w
    }

    /// Patches the length byte and returns the blob length.
    pub fn finish(mut self) -> Result<usize, SettingsError> {
        let len = self.w.position() - self.len_at - 1;
        let len = u8::try_from(len).map_err(|_| SettingsError::BufferFull)?;
        self.w.patch_u8(self.len_at, len)?;
        Ok(self.w.position())
    }

    /// Returns true if no entry has been written yet.
    pub fn is_empty(&self) -> bool {
        self.w.position() == self.len_at + 1
    }

    pub fn count(&self) -> usize {
        self.count
    }
}
