use core::fmt::Write;

use crate::settings::{
    validate::{DisplayText, Validate},
    value::{Value, ValueType},
};

/// How an element's value is typed in and shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputKind {
    String,
    Dec,
    Hex,
    /// Decimal input divided by 10 before storing, shown multiplied by 10.
    DecDeca,
    /// Decimal input divided by 100 before storing, shown multiplied by 100.
    DecHecto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    pub kind: InputKind,
    /// Longest accepted input text.
    pub max_len: u8,
    /// Single-character menu key.
    pub shortcut: u8,
    /// Render through the validator instead of the plain format.
    pub custom_display: bool,
}

impl InputFormat {
    pub const fn new(kind: InputKind, max_len: u8, shortcut: u8) -> Self {
        Self {
            kind,
            max_len,
            shortcut,
            custom_display: false,
        }
    }
}

/// Compile-time description of one setting.
///
/// Built with chained `const fn` calls so whole layers can live in statics:
///
/// ```rust
/// use embedded_settings::prelude::*;
///
/// static CHANNEL: Element = Element::new(3, Value::U8(18))
///     .label("CHN", "Channel")
///     .format(InputKind::Dec, 2, b'c')
///     .range(11, 26)
///     .validator(&MinMax);
/// ```
#[derive(Clone, Copy)]
pub struct Element {
    pub id: u16,
    pub default: Value<'static>,
    /// Declared byte length. For strings this sizes the pool carve-out.
    pub len: u8,
    pub label: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub format: InputFormat,
    pub min: i64,
    pub max: i64,
    pub validator: Option<&'static dyn Validate>,
}

impl Element {
    pub const fn new(id: u16, default: Value<'static>) -> Self {
        let len = match default {
            Value::Str(s) => s.len() as u8,
            Value::U8(_) | Value::I8(_) => 1,
            Value::U16(_) | Value::I16(_) => 2,
            Value::U32(_) | Value::I32(_) => 4,
            Value::Unset => 0,
        };
        Self {
            id,
            default,
            len,
            label: "",
            name: "",
            description: "",
            format: InputFormat::new(InputKind::Dec, 0, 0),
            min: 0,
            max: 0,
            validator: None,
        }
    }

    /// Declared length of a string element.
    pub const fn capacity(self, len: u8) -> Self {
        Self { len, ..self }
    }

    pub const fn label(self, label: &'static str, name: &'static str) -> Self {
        Self { label, name, ..self }
    }

    pub const fn description(self, description: &'static str) -> Self {
        Self {
            description,
            ..self
        }
    }

    pub const fn format(self, kind: InputKind, max_len: u8, shortcut: u8) -> Self {
        Self {
            format: InputFormat {
                kind,
                max_len,
                shortcut,
                custom_display: self.format.custom_display,
            },
            ..self
        }
    }

    pub const fn custom_display(self) -> Self {
        let mut format = self.format;
        format.custom_display = true;
        Self { format, ..self }
    }

    pub const fn range(self, min: i64, max: i64) -> Self {
        Self { min, max, ..self }
    }

    pub const fn validator(self, validator: &'static dyn Validate) -> Self {
        Self {
            validator: Some(validator),
            ..self
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.default.value_type()
    }

    /// Renders `value` for display, preferring the validator's custom form.
    pub fn render(&self, value: Value<'_>, out: &mut DisplayText) -> core::fmt::Result {
        out.clear();
        if self.format.custom_display {
            if let Some(v) = self.validator {
                if v.display(self, value, out) {
                    return Ok(());
                }
                out.clear();
            }
        }

        if let Value::Str(s) = value {
            for &b in s {
                out.push(b as char).map_err(|_| core::fmt::Error)?;
            }
            return Ok(());
        }

        let Some(n) = value.to_i64() else {
            return Ok(());
        };
        match self.format.kind {
            InputKind::Hex => {
                let width = (self.len as usize * 2).min(8);
                write!(out, "0x{:0width$X}", value.to_bits().unwrap_or(0), width = width)
            }
            InputKind::DecDeca if n != 0 => write!(out, "{}0", n),
            InputKind::DecHecto if n != 0 => write!(out, "{}00", n),
            _ => write!(out, "{}", n),
        }
    }
}
