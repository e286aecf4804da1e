use super::macros::{
    impl_cursor_common, impl_write_primitive, impl_write_primitives,
};
use crate::settings::SettingsError;

/// Forward-only, bounds-checked writer over a borrowed buffer.
///
/// A write that does not fit fails with [`SettingsError::BufferFull`] and
/// writes nothing.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    #[inline]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    impl_cursor_common!();

    fn put(&mut self, src: &[u8]) -> Result<(), SettingsError> {
        let end = self
            .pos
            .checked_add(src.len())
            .ok_or(SettingsError::BufferFull)?;
        self.buf
            .get_mut(self.pos..end)
            .ok_or(SettingsError::BufferFull)?
            .copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, src: &[u8]) -> Result<(), SettingsError> {
        self.put(src)
    }

    /// Reserves one byte to be patched later and returns its offset.
    pub fn reserve_u8(&mut self) -> Result<usize, SettingsError> {
        let at = self.pos;
        self.put(&[0])?;
        Ok(at)
    }

    /// Overwrites an already written byte.
    pub fn patch_u8(&mut self, offset: usize, value: u8) -> Result<(), SettingsError> {
        if offset >= self.pos {
            return Err(SettingsError::BufferFull);
        }
        self.buf[offset] = value;
        Ok(())
    }

    /// Rolls the cursor back to `position`, discarding anything after it.
    pub fn rewind(&mut self, position: usize) {
        if position < self.pos {
            self.pos = position;
        }
    }

    /// The bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    impl_write_primitives!();
}
