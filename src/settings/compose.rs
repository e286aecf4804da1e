use crate::settings::{
    SettingsError,
    cursor::Reader,
    element::Element,
    value::{TAG_UNUSED, Value},
};

/// Schema precedence tier. Later tiers override earlier ones for the same id.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Layer {
    #[default]
    Base = 0,
    Board = 1,
    Slot = 2,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Base, Layer::Board, Layer::Slot];
}

/// One parsed custom-default entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomDefault {
    /// Drop the element from the resolved list.
    Remove(u8),
    /// Replace the element's default.
    Set(u8, Value<'static>),
}

/// Layer-scoped default overrides encoded as `(id, tag, value)*`.
///
/// Uses the same entry encoding as a saved payload; a tag of `0x00` removes
/// the id instead of setting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomDefaults(&'static [u8]);

impl CustomDefaults {
    pub const fn new(bytes: &'static [u8]) -> Self {
        Self(bytes)
    }

    pub fn entries(&self) -> CustomDefaultIter {
        CustomDefaultIter {
            reader: Reader::new(self.0),
        }
    }

    /// Walks the whole list once, failing on the first malformed entry.
    pub fn check(&self) -> Result<(), SettingsError> {
        self.entries().try_for_each(|e| e.map(|_| ()))
    }
}

pub struct CustomDefaultIter {
    reader: Reader<'static>,
}

impl CustomDefaultIter {
    fn next_entry(&mut self) -> Result<CustomDefault, SettingsError> {
        let id = self.reader.read_u8()?;
        let tag = self.reader.read_u8()?;
        if tag == TAG_UNUSED {
            return Ok(CustomDefault::Remove(id));
        }
        if tag & 0x0F == 0 {
            return Err(SettingsError::MalformedCustomDefault);
        }
        Ok(CustomDefault::Set(id, Value::decode(tag, &mut self.reader)?))
    }
}

impl Iterator for CustomDefaultIter {
    type Item = Result<CustomDefault, SettingsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.is_exhausted() {
            return None;
        }
        let item = self.next_entry().map_err(|e| match e {
            SettingsError::Truncated => SettingsError::MalformedCustomDefault,
            other => other,
        });
        if item.is_err() {
            // stop after the first error
            let rest = self.reader.remaining();
            let _ = self.reader.skip(rest);
        }
        Some(item)
    }
}

/// Schema layers and custom defaults selected by a `(kind, slot)` pair.
#[derive(Clone, Copy)]
pub struct Composition {
    pub kind: u8,
    pub slot: u8,
    pub layers: [Option<&'static [Element]>; 3],
    pub custom_defaults: [Option<CustomDefaults>; 3],
}

impl Composition {
    pub const fn new(kind: u8, slot: u8) -> Self {
        Self {
            kind,
            slot,
            layers: [None; 3],
            custom_defaults: [None; 3],
        }
    }

    pub const fn layer(mut self, layer: Layer, elements: &'static [Element]) -> Self {
        self.layers[layer as usize] = Some(elements);
        self
    }

    pub const fn custom(mut self, layer: Layer, list: &'static [u8]) -> Self {
        self.custom_defaults[layer as usize] = Some(CustomDefaults::new(list));
        self
    }

    pub fn elements(&self, layer: Layer) -> &'static [Element] {
        self.layers[layer as usize].unwrap_or(&[])
    }

    pub fn custom_defaults(&self, layer: Layer) -> Option<CustomDefaults> {
        self.custom_defaults[layer as usize]
    }
}

/// Finds the composition for `(kind, slot)`, falling back to `(kind, 0)`.
pub fn lookup(registry: &'static [Composition], kind: u8, slot: u8) -> Option<&'static Composition> {
    registry
        .iter()
        .find(|c| c.kind == kind && c.slot == slot)
        .or_else(|| registry.iter().find(|c| c.kind == kind && c.slot == 0))
}
