//! Validators turn typed-in text into values and values back into text.

use core::fmt::Write;

use crate::settings::{
    SettingsError,
    element::{Element, InputKind},
    value::{Value, ValueType},
};

/// Buffer for rendered values.
pub type DisplayText = heapless::String<32>;

/// Converts user or wire input for one element.
///
/// Implementations are usually unit structs referenced from a static
/// [`Element`]; any parameters beyond the element's `min`/`max` live in the
/// validator itself.
pub trait Validate: Sync {
    /// Parses `input` into a value for `element`.
    ///
    /// Returning an error must leave the caller's current value untouched.
    fn parse<'i>(&self, element: &Element, input: &'i [u8]) -> Result<Value<'i>, SettingsError>;

    /// Writes a custom rendering of `value`. Returns false to fall back to
    /// the element's plain format.
    fn display(&self, _element: &Element, _value: Value<'_>, _out: &mut DisplayText) -> bool {
        false
    }
}

fn trim(text: &[u8]) -> &[u8] {
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    let end = text
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &text[start..end]
}

fn tokens(text: &[u8]) -> impl Iterator<Item = &[u8]> {
    text.split(|b| *b == b',' || *b == b'.').map(trim)
}

/// Parses an optionally negative decimal number.
pub fn parse_dec(text: &[u8]) -> Result<i64, SettingsError> {
    let (negative, digits) = match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, text),
    };
    if digits.is_empty() || digits.len() > 10 {
        return Err(SettingsError::InvalidInput);
    }

    let mut n: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(SettingsError::InvalidInput);
        }
        n = n * 10 + (b - b'0') as i64;
    }
    Ok(if negative { -n } else { n })
}

/// Parses up to eight hex digits, with or without a `0x` prefix.
pub fn parse_hex(text: &[u8]) -> Result<u32, SettingsError> {
    let digits = match text {
        [b'0', b'x' | b'X', rest @ ..] => rest,
        _ => text,
    };
    if digits.is_empty() || digits.len() > 8 {
        return Err(SettingsError::InvalidInput);
    }

    let mut n: u32 = 0;
    for &b in digits {
        let d = (b as char).to_digit(16).ok_or(SettingsError::InvalidInput)?;
        n = (n << 4) | d;
    }
    Ok(n)
}

fn type_bounds(ty: ValueType) -> (i64, i64) {
    match ty {
        ValueType::U8 => (0, u8::MAX as i64),
        ValueType::I8 => (i8::MIN as i64, i8::MAX as i64),
        ValueType::U16 => (0, u16::MAX as i64),
        ValueType::I16 => (i16::MIN as i64, i16::MAX as i64),
        ValueType::U32 => (0, u32::MAX as i64),
        ValueType::I32 => (i32::MIN as i64, i32::MAX as i64),
        ValueType::Unset | ValueType::Str => (0, -1),
    }
}

/// Numeric input checked against the element's `min..=max`.
///
/// The text is read according to the element's [`InputKind`]; deca and hecto
/// inputs are divided before the range check.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinMax;

impl Validate for MinMax {
    fn parse<'i>(&self, element: &Element, input: &'i [u8]) -> Result<Value<'i>, SettingsError> {
        let text = trim(input);
        if text.is_empty() {
            return Ok(element.default);
        }

        let ty = element.value_type();
        let n = match element.format.kind {
            InputKind::Dec => parse_dec(text)?,
            InputKind::DecDeca => parse_dec(text)? / 10,
            InputKind::DecHecto => parse_dec(text)? / 100,
            InputKind::Hex => parse_hex(text)? as i64,
            InputKind::String => return Err(SettingsError::TypeMismatch),
        };

        let (lo, hi) = type_bounds(ty);
        if n < lo || n > hi || n < element.min || n > element.max {
            return Err(SettingsError::OutOfRange);
        }
        Ok(Value::from_bits(ty, n as u32))
    }
}

/// Free text up to the element's declared length.
#[derive(Debug, Default, Clone, Copy)]
pub struct Text;

impl Validate for Text {
    fn parse<'i>(&self, element: &Element, input: &'i [u8]) -> Result<Value<'i>, SettingsError> {
        if element.value_type() != ValueType::Str {
            return Err(SettingsError::TypeMismatch);
        }
        if input.len() > element.len as usize {
            return Err(SettingsError::StringTooLong);
        }
        Ok(Value::Str(input))
    }
}

/// 32-bit application id in hex. Neither half may be 0x0000 or 0xFFFF.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppId;

impl Validate for AppId {
    fn parse<'i>(&self, element: &Element, input: &'i [u8]) -> Result<Value<'i>, SettingsError> {
        let text = trim(input);
        if text.is_empty() {
            return Ok(element.default);
        }
        if element.value_type() != ValueType::U32 {
            return Err(SettingsError::TypeMismatch);
        }

        let id = parse_hex(text)?;
        let halves = [(id >> 16) as u16, id as u16];
        if halves.iter().any(|h| *h == 0x0000 || *h == 0xFFFF) {
            return Err(SettingsError::OutOfRange);
        }
        Ok(Value::U32(id))
    }
}

/// Lowest selectable radio channel.
pub const CHANNEL_MIN: u8 = 11;
/// Highest selectable radio channel.
pub const CHANNEL_MAX: u8 = 26;
const CHANNEL_LIST_MAX: usize = 3;

/// Up to three radio channels such as `11,15,24`, stored as a `u16` mask
/// where bit 0 is channel 11.
///
/// Tokens outside the channel range are ignored; at least one must be valid.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelList;

impl ChannelList {
    pub const fn mask_of(channel: u8) -> u16 {
        1 << (channel - CHANNEL_MIN)
    }
}

impl Validate for ChannelList {
    fn parse<'i>(&self, element: &Element, input: &'i [u8]) -> Result<Value<'i>, SettingsError> {
        let text = trim(input);
        if text.is_empty() {
            return Ok(element.default);
        }
        if element.value_type() != ValueType::U16 {
            return Err(SettingsError::TypeMismatch);
        }

        let mut mask = 0u16;
        for token in tokens(text).take(CHANNEL_LIST_MAX) {
            if let Ok(ch) = parse_dec(token) {
                if (CHANNEL_MIN as i64..=CHANNEL_MAX as i64).contains(&ch) {
                    mask |= Self::mask_of(ch as u8);
                }
            }
        }

        if mask == 0 {
            return Err(SettingsError::OutOfRange);
        }
        Ok(Value::U16(mask))
    }

    fn display(&self, _element: &Element, value: Value<'_>, out: &mut DisplayText) -> bool {
        let Some(mask) = value.as_u16() else {
            return false;
        };

        let mut first = true;
        for ch in CHANNEL_MIN..=CHANNEL_MAX {
            if mask & Self::mask_of(ch) == 0 {
                continue;
            }
            let sep = if first { "" } else { "," };
            if write!(out, "{}{}", sep, ch).is_err() {
                return false;
            }
            first = false;
        }
        !first
    }
}

const UART_PARITY_MASK: u8 = 0x3;
const UART_STOP_2: u8 = 0x4;
const UART_WORD_7: u8 = 0x8;
const UART_BAUD_MASK: u16 = 0x0FFF;

/// Baud rate plus optional framing such as `115200,8N1`.
///
/// The low 12 bits hold baud / 100, the high 4 bits the framing flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct UartBaudOpt;

impl UartBaudOpt {
    fn parse_framing(text: &[u8]) -> Result<u8, SettingsError> {
        if text.is_empty() || text.len() > 3 {
            return Err(SettingsError::InvalidInput);
        }

        let (mut parity, mut stop, mut word) = (0, 0, 0);
        for &c in text {
            match c {
                b'N' | b'n' => parity = 0,
                b'O' | b'o' => parity = 1,
                b'E' | b'e' => parity = 2,
                b'1' => stop = 0,
                b'2' => stop = UART_STOP_2,
                b'8' => word = 0,
                b'7' => word = UART_WORD_7,
                _ => return Err(SettingsError::InvalidInput),
            }
        }
        Ok(parity | stop | word)
    }
}

impl Validate for UartBaudOpt {
    fn parse<'i>(&self, element: &Element, input: &'i [u8]) -> Result<Value<'i>, SettingsError> {
        let text = trim(input);
        if text.is_empty() {
            return Ok(element.default);
        }
        if element.value_type() != ValueType::U16 {
            return Err(SettingsError::TypeMismatch);
        }

        let mut parts = tokens(text);
        let baud = parse_dec(parts.next().unwrap_or(b""))? / 100;
        if !(96..2500).contains(&baud) {
            return Err(SettingsError::OutOfRange);
        }

        let mut packed = baud as u16 & UART_BAUD_MASK;
        if let Some(framing) = parts.next() {
            packed |= (Self::parse_framing(framing)? as u16) << 12;
        }
        if parts.next().is_some() {
            return Err(SettingsError::InvalidInput);
        }
        Ok(Value::U16(packed))
    }

    fn display(&self, _element: &Element, value: Value<'_>, out: &mut DisplayText) -> bool {
        let Some(packed) = value.as_u16() else {
            return false;
        };
        let framing = (packed >> 12) as u8;
        let word = if framing & UART_WORD_7 != 0 { '7' } else { '8' };
        let parity = ['N', 'O', 'E', '@'][(framing & UART_PARITY_MASK) as usize];
        let stop = if framing & UART_STOP_2 != 0 { '2' } else { '1' };

        write!(
            out,
            "{}00,{}{}{}",
            packed & UART_BAUD_MASK,
            word,
            parity,
            stop
        )
        .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static LID: Element = Element::new(2, Value::U8(1))
        .format(InputKind::Dec, 3, b'i')
        .range(0, 100)
        .validator(&MinMax);
    static OFFSET: Element = Element::new(90, Value::I16(0))
        .format(InputKind::Dec, 6, b't')
        .range(-500, 500)
        .validator(&MinMax);
    static APP: Element = Element::new(1, Value::U32(0x6772_6301))
        .format(InputKind::Hex, 8, b'a')
        .validator(&AppId);
    static CHL: Element = Element::new(4, Value::U16(ChannelList::mask_of(18)))
        .format(InputKind::String, 8, b'c')
        .custom_display()
        .validator(&ChannelList);
    static UOP: Element = Element::new(7, Value::U16(384))
        .format(InputKind::String, 10, b'b')
        .custom_display()
        .validator(&UartBaudOpt);
    static NAME: Element = Element::new(64, Value::Str(b""))
        .capacity(8)
        .format(InputKind::String, 8, b'n')
        .validator(&Text);

    #[test]
    fn number_parsers() {
        assert_eq!(parse_dec(b"-42").unwrap(), -42);
        assert_eq!(parse_dec(b"007").unwrap(), 7);
        assert_eq!(parse_dec(b"4x"), Err(SettingsError::InvalidInput));
        assert_eq!(parse_dec(b"-"), Err(SettingsError::InvalidInput));
        assert_eq!(parse_hex(b"0xBeEf").unwrap(), 0xBEEF);
        assert_eq!(parse_hex(b"123456789"), Err(SettingsError::InvalidInput));
    }

    #[test]
    fn min_max_unsigned() {
        assert_eq!(MinMax.parse(&LID, b"42").unwrap(), Value::U8(42));
        assert_eq!(MinMax.parse(&LID, b" 100 ").unwrap(), Value::U8(100));
        assert_eq!(MinMax.parse(&LID, b"101"), Err(SettingsError::OutOfRange));
        assert_eq!(MinMax.parse(&LID, b"-1"), Err(SettingsError::OutOfRange));
        // empty input restores the default
        assert_eq!(MinMax.parse(&LID, b"").unwrap(), Value::U8(1));
    }

    #[test]
    fn min_max_signed_and_scaled() {
        assert_eq!(MinMax.parse(&OFFSET, b"-500").unwrap(), Value::I16(-500));
        assert_eq!(MinMax.parse(&OFFSET, b"-501"), Err(SettingsError::OutOfRange));

        let deca = Element::new(91, Value::U16(0))
            .format(InputKind::DecDeca, 5, b'd')
            .range(0, 1000);
        assert_eq!(MinMax.parse(&deca, b"2500").unwrap(), Value::U16(250));

        let hecto = Element::new(92, Value::U16(0))
            .format(InputKind::DecHecto, 6, b'h')
            .range(96, 2500);
        assert_eq!(MinMax.parse(&hecto, b"115200").unwrap(), Value::U16(1152));
    }

    #[test]
    fn app_id_halves() {
        assert_eq!(AppId.parse(&APP, b"12345678").unwrap(), Value::U32(0x1234_5678));
        assert_eq!(AppId.parse(&APP, b"0000ABCD"), Err(SettingsError::OutOfRange));
        assert_eq!(AppId.parse(&APP, b"ABCDFFFF"), Err(SettingsError::OutOfRange));
        assert_eq!(AppId.parse(&APP, b"zz"), Err(SettingsError::InvalidInput));
    }

    #[test]
    fn channel_list_parse_and_display() {
        let v = ChannelList.parse(&CHL, b"11,15.24").unwrap();
        assert_eq!(v, Value::U16((1 << 0) | (1 << 4) | (1 << 13)));

        let mut out = DisplayText::new();
        assert!(ChannelList.display(&CHL, v, &mut out));
        assert_eq!(out.as_str(), "11,15,24");

        // out-of-range tokens are dropped, only the first three are read
        assert_eq!(
            ChannelList.parse(&CHL, b"5,26,30,12").unwrap(),
            Value::U16(ChannelList::mask_of(26))
        );
        assert_eq!(ChannelList.parse(&CHL, b"1,2"), Err(SettingsError::OutOfRange));
    }

    #[test]
    fn uart_baud_and_framing() {
        assert_eq!(UartBaudOpt.parse(&UOP, b"115200").unwrap(), Value::U16(1152));
        assert_eq!(
            UartBaudOpt.parse(&UOP, b"9600,7E2").unwrap(),
            Value::U16(96 | ((0x8 | 0x2 | 0x4) << 12))
        );
        assert_eq!(UartBaudOpt.parse(&UOP, b"300"), Err(SettingsError::OutOfRange));
        assert_eq!(UartBaudOpt.parse(&UOP, b"9600,8X1"), Err(SettingsError::InvalidInput));

        let mut out = DisplayText::new();
        assert!(UartBaudOpt.display(&UOP, Value::U16(384), &mut out));
        assert_eq!(out.as_str(), "38400,8N1");

        out.clear();
        let v = UartBaudOpt.parse(&UOP, b"9600,7E2").unwrap();
        assert!(UartBaudOpt.display(&UOP, v, &mut out));
        assert_eq!(out.as_str(), "9600,7E2");
    }

    #[test]
    fn text_respects_declared_length() {
        assert_eq!(Text.parse(&NAME, b"sensor").unwrap(), Value::Str(b"sensor"));
        assert_eq!(Text.parse(&NAME, b"too-long!"), Err(SettingsError::StringTooLong));
        assert_eq!(Text.parse(&LID, b"x"), Err(SettingsError::TypeMismatch));
    }
}
