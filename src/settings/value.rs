use crate::settings::{
    SettingsError,
    cursor::{Reader, Writer},
};

/// Longest string a single tag byte can describe.
pub const STR_MAX_LEN: usize = 0x0F;

/// Tag byte that marks an id for removal in a custom-default list.
pub(crate) const TAG_UNUSED: u8 = 0x00;

const TAG_STR: u8 = 0x80;
const TAG_LEN_MASK: u8 = 0x0F;

/// Storage type of a value, with its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueType {
    Unset,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    Str,
}

impl ValueType {
    /// Wire code. Integer codes occupy the high nibble of a tag byte.
    pub const fn code(self) -> u8 {
        match self {
            ValueType::Unset => 0,
            ValueType::U8 => 1,
            ValueType::I8 => 2,
            ValueType::U16 => 3,
            ValueType::I16 => 4,
            ValueType::U32 => 5,
            ValueType::I32 => 6,
            ValueType::Str => TAG_STR,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ValueType::Unset),
            1 => Some(ValueType::U8),
            2 => Some(ValueType::I8),
            3 => Some(ValueType::U16),
            4 => Some(ValueType::I16),
            5 => Some(ValueType::U32),
            6 => Some(ValueType::I32),
            TAG_STR => Some(ValueType::Str),
            _ => None,
        }
    }

    /// Byte length of the encoded payload for fixed-size types.
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            ValueType::Unset => Some(0),
            ValueType::U8 | ValueType::I8 => Some(1),
            ValueType::U16 | ValueType::I16 => Some(2),
            ValueType::U32 | ValueType::I32 => Some(4),
            ValueType::Str => None,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, ValueType::I8 | ValueType::I16 | ValueType::I32)
    }
}

/// A typed setting value.
///
/// Strings borrow their bytes; the lifetime ties them to the schema, the
/// string pool of a resolved configuration, or a blob being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value<'a> {
    Unset,
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    Str(&'a [u8]),
}

macro_rules! impl_value_accessors {
    ($($variant:ident => $type:ty),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = "Returns the `" $type "` payload of a `" $variant "` value."]
                #[inline]
                pub fn [<as_ $type>](&self) -> Option<$type> {
                    match self {
                        Value::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            )*
        }
    };
}

impl<'a> Value<'a> {
    impl_value_accessors!(U8 => u8, I8 => i8, U16 => u16, I16 => i16, U32 => u32, I32 => i32);

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Unset => ValueType::Unset,
            Value::U8(_) => ValueType::U8,
            Value::I8(_) => ValueType::I8,
            Value::U16(_) => ValueType::U16,
            Value::I16(_) => ValueType::I16,
            Value::U32(_) => ValueType::U32,
            Value::I32(_) => ValueType::I32,
            Value::Str(_) => ValueType::Str,
        }
    }

    /// Integer payload as raw 32 bits, signed types sign-extended.
    pub fn to_bits(&self) -> Option<u32> {
        match *self {
            Value::U8(v) => Some(v as u32),
            Value::I8(v) => Some(v as i32 as u32),
            Value::U16(v) => Some(v as u32),
            Value::I16(v) => Some(v as i32 as u32),
            Value::U32(v) => Some(v),
            Value::I32(v) => Some(v as u32),
            Value::Unset | Value::Str(_) => None,
        }
    }

    /// Integer payload widened without loss.
    pub fn to_i64(&self) -> Option<i64> {
        match *self {
            Value::U8(v) => Some(v as i64),
            Value::I8(v) => Some(v as i64),
            Value::U16(v) => Some(v as i64),
            Value::I16(v) => Some(v as i64),
            Value::U32(v) => Some(v as i64),
            Value::I32(v) => Some(v as i64),
            Value::Unset | Value::Str(_) => None,
        }
    }

    /// Builds an integer value of type `ty` by truncating `bits`.
    pub fn from_bits(ty: ValueType, bits: u32) -> Value<'static> {
        match ty {
            ValueType::U8 => Value::U8(bits as u8),
            ValueType::I8 => Value::I8(bits as i8),
            ValueType::U16 => Value::U16(bits as u16),
            ValueType::I16 => Value::I16(bits as i16),
            ValueType::U32 => Value::U32(bits),
            ValueType::I32 => Value::I32(bits as i32),
            ValueType::Unset | ValueType::Str => Value::Unset,
        }
    }

    /// Tag byte describing this value on the wire.
    pub fn tag(&self) -> Result<u8, SettingsError> {
        match self {
            Value::Str(s) if s.len() > STR_MAX_LEN => Err(SettingsError::StringTooLong),
            Value::Str(s) => Ok(TAG_STR | s.len() as u8),
            other => {
                let ty = other.value_type();
                let len = ty.fixed_len().unwrap_or(0) as u8;
                Ok((ty.code() << 4) | len)
            }
        }
    }

    /// Writes the tag byte followed by the big-endian payload.
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), SettingsError> {
        let tag = self.tag()?;
        let start = w.position();
        let res = w.write_u8(tag).and_then(|_| self.encode_payload(w));
        if res.is_err() {
            w.rewind(start);
        }
        res
    }

    fn encode_payload(&self, w: &mut Writer<'_>) -> Result<(), SettingsError> {
        match *self {
            Value::Unset => Ok(()),
            Value::U8(v) => w.write_u8(v),
            Value::I8(v) => w.write_i8(v),
            Value::U16(v) => w.write_u16_be(v),
            Value::I16(v) => w.write_i16_be(v),
            Value::U32(v) => w.write_u32_be(v),
            Value::I32(v) => w.write_i32_be(v),
            Value::Str(s) => w.write_bytes(s),
        }
    }

    /// Decodes the payload described by `tag`.
    ///
    /// Unknown types, and integer tags whose length disagrees with the type,
    /// consume their declared length and yield [`Value::Unset`].
    pub fn decode(tag: u8, r: &mut Reader<'a>) -> Result<Value<'a>, SettingsError> {
        let len = (tag & TAG_LEN_MASK) as usize;
        if tag & TAG_STR != 0 {
            return Ok(Value::Str(r.take(len)?));
        }

        let ty = ValueType::from_code(tag >> 4);
        match ty {
            Some(ty) if ty.fixed_len() == Some(len) => Ok(match ty {
                ValueType::U8 => Value::U8(r.read_u8()?),
                ValueType::I8 => Value::I8(r.read_i8()?),
                ValueType::U16 => Value::U16(r.read_u16_be()?),
                ValueType::I16 => Value::I16(r.read_i16_be()?),
                ValueType::U32 => Value::U32(r.read_u32_be()?),
                ValueType::I32 => Value::I32(r.read_i32_be()?),
                ValueType::Unset | ValueType::Str => Value::Unset,
            }),
            _ => {
                r.skip(len)?;
                Ok(Value::Unset)
            }
        }
    }
}
