/// Generates a bounds-checked read method for a single primitive type.
macro_rules! impl_read_primitive {
    (u8) => {
        /// Reads a `u8` and advances the cursor.
        #[inline]
        pub fn read_u8(&mut self) -> Result<u8, SettingsError> {
            Ok(self.take(1)?[0])
        }
    };
    (i8) => {
        /// Reads an `i8` and advances the cursor.
        #[inline]
        pub fn read_i8(&mut self) -> Result<i8, SettingsError> {
            Ok(self.take(1)?[0] as i8)
        }
    };
    ($type:ty, $size:literal) => {
        paste::paste! {
            #[doc = "Reads a big-endian `" $type "` and advances the cursor."]
            #[doc = ""]
            #[doc = "Fails with `Truncated` if fewer than " $size " bytes remain."]
            #[inline]
            pub fn [<read_ $type _be>](&mut self) -> Result<$type, SettingsError> {
                let mut raw = [0u8; $size];
                raw.copy_from_slice(self.take($size)?);
                Ok(<$type>::from_be_bytes(raw))
            }
        }
    };
}

macro_rules! impl_read_primitives {
    () => {
        impl_read_primitive!(u8);
        impl_read_primitive!(i8);
        impl_read_primitive!(u16, 2);
        impl_read_primitive!(i16, 2);
        impl_read_primitive!(u32, 4);
        impl_read_primitive!(i32, 4);
    };
}

/// Generates a bounds-checked write method for a single primitive type.
macro_rules! impl_write_primitive {
    (u8) => {
        /// Writes a `u8` and advances the cursor.
        #[inline]
        pub fn write_u8(&mut self, value: u8) -> Result<(), SettingsError> {
            self.put(&[value])
        }
    };
    (i8) => {
        /// Writes an `i8` and advances the cursor.
        #[inline]
        pub fn write_i8(&mut self, value: i8) -> Result<(), SettingsError> {
            self.put(&[value as u8])
        }
    };
    ($type:ty, $size:literal) => {
        paste::paste! {
            #[doc = "Writes a big-endian `" $type "` and advances the cursor."]
            #[doc = ""]
            #[doc = "Fails with `BufferFull` if fewer than " $size " bytes remain."]
            #[inline]
            pub fn [<write_ $type _be>](&mut self, value: $type) -> Result<(), SettingsError> {
                self.put(&value.to_be_bytes())
            }
        }
    };
}

macro_rules! impl_write_primitives {
    () => {
        impl_write_primitive!(u8);
        impl_write_primitive!(i8);
        impl_write_primitive!(u16, 2);
        impl_write_primitive!(i16, 2);
        impl_write_primitive!(u32, 4);
        impl_write_primitive!(i32, 4);
    };
}

/// Generates position bookkeeping shared by both cursors.
macro_rules! impl_cursor_common {
    () => {
        /// Bytes consumed so far.
        #[inline]
        pub fn position(&self) -> usize {
            self.pos
        }

        /// Bytes left before the end of the buffer.
        #[inline]
        pub fn remaining(&self) -> usize {
            self.buf.len() - self.pos
        }

        /// Returns true when the cursor reached the end of the buffer.
        #[inline]
        pub fn is_exhausted(&self) -> bool {
            self.pos == self.buf.len()
        }
    };
}

pub(super) use impl_cursor_common;
pub(super) use impl_read_primitive;
pub(super) use impl_read_primitives;
pub(super) use impl_write_primitive;
pub(super) use impl_write_primitives;
