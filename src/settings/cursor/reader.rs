use super::macros::{
    impl_cursor_common, impl_read_primitive, impl_read_primitives,
};
use crate::settings::SettingsError;

/// Forward-only, bounds-checked reader over a borrowed byte run.
///
/// Every read past the end fails with [`SettingsError::Truncated`] and leaves
/// the position unchanged.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    #[inline]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    impl_cursor_common!();

    /// Borrows the next `len` bytes without copying and advances past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], SettingsError> {
        let end = self.pos.checked_add(len).ok_or(SettingsError::Truncated)?;
        let run = self.buf.get(self.pos..end).ok_or(SettingsError::Truncated)?;
        self.pos = end;
        Ok(run)
    }

    /// Advances past `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), SettingsError> {
        self.take(len).map(|_| ())
    }

    /// The unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    impl_read_primitives!();
}
