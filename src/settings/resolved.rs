use bitmaps::Bitmap;
use heapless::Vec;

use crate::settings::{
    SettingsError,
    compose::{Composition, CustomDefault, CustomDefaults, Layer},
    cursor::Writer,
    element::Element,
    slice::Slice,
    validate::DisplayText,
    value::{STR_MAX_LEN, Value},
};

/// Bookkeeping attached to each resolved value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// Value came from this slot's saved data.
    pub saved: bool,
    /// Value came from slot 0's saved data while another slot is selected.
    pub saved_higher: bool,
    /// Value changed since the last load or save.
    pub modified: bool,
    /// Layer that last declared or customized the element.
    pub origin: Layer,
    /// Default was replaced by a custom default.
    pub custom_default: bool,
}

impl Status {
    fn declared(origin: Layer) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    /// One-character marker for menus.
    pub fn mark(&self) -> char {
        if self.modified {
            '*'
        } else if self.saved {
            '$'
        } else if self.saved_higher {
            '^'
        } else {
            ' '
        }
    }
}

/// How loaded values are applied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Leave entries declared by the slot layer untouched.
    pub skip_slot_layer: bool,
    /// Mark applied values modified instead of saved.
    pub as_unsaved: bool,
}

/// Which entries go into a save blob.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Also write values inherited from slot 0's saved data.
    pub include_higher: bool,
}

#[derive(Clone, Copy)]
enum Held {
    Value(Value<'static>),
    Pooled { at: u16, len: u8, cap: u8 },
}

#[derive(Clone, Copy)]
struct Entry {
    element: &'static Element,
    held: Held,
    status: Status,
    custom: Option<u8>,
}

/// Read-only view of one resolved entry.
#[derive(Clone, Copy)]
pub struct EntryRef<'a> {
    pub element: &'static Element,
    pub value: Value<'a>,
    pub status: Status,
}

/// The flattened configuration built from a [`Composition`].
///
/// # Const Generics
/// - `N`: maximum number of entries
/// - `SP`: string pool size in bytes
/// - `CD`: maximum number of custom-default values
///
/// Merging keeps entries in first-declaration order. String values live in a
/// pool that is rebuilt on every merge.
pub struct Resolved<const N: usize, const SP: usize, const CD: usize> {
    entries: Vec<Entry, N>,
    shortcuts: Vec<u8, N>,
    custom_defaults: Vec<Value<'static>, CD>,
    pool: Vec<u8, SP>,
}

impl<const N: usize, const SP: usize, const CD: usize> Default for Resolved<N, SP, CD> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const SP: usize, const CD: usize> Resolved<N, SP, CD> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            shortcuts: Vec::new(),
            custom_defaults: Vec::new(),
            pool: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.shortcuts.clear();
        self.custom_defaults.clear();
        self.pool.clear();
    }

    /// Rebuilds the entry list from `composition`.
    ///
    /// On error the configuration is left empty.
    pub fn merge(&mut self, composition: &Composition) -> Result<(), SettingsError> {
        self.clear();
        let res = self.merge_layers(composition);
        if res.is_err() {
            self.clear();
        }
        res
    }

    fn merge_layers(&mut self, composition: &Composition) -> Result<(), SettingsError> {
        for layer in Layer::ALL {
            self.declare(layer, composition.elements(layer))?;
            if let Some(list) = composition.custom_defaults(layer) {
                self.customize(layer, list)?;
            }
        }
        self.finish()
    }

    fn position(&self, id: u16) -> Option<usize> {
        self.entries.iter().position(|e| e.element.id == id)
    }

    fn declare(&mut self, layer: Layer, elements: &'static [Element]) -> Result<(), SettingsError> {
        for element in elements {
            let entry = Entry {
                element,
                held: Held::Value(element.default),
                status: Status::declared(layer),
                custom: None,
            };
            match self.position(element.id) {
                Some(i) => self.entries[i] = entry,
                None => self
                    .entries
                    .push(entry)
                    .map_err(|_| SettingsError::EntriesFull)?,
            }
        }
        Ok(())
    }

    fn customize(&mut self, layer: Layer, list: CustomDefaults) -> Result<(), SettingsError> {
        for item in list.entries() {
            match item? {
                CustomDefault::Remove(id) => {
                    if let Some(i) = self.position_by_wire(id) {
                        self.entries.remove(i);
                    }
                }
                CustomDefault::Set(id, value) => {
                    let Some(i) = self.position_by_wire(id) else {
                        continue;
                    };
                    let entry = &mut self.entries[i];
                    if value.value_type() != entry.element.value_type() {
                        return Err(SettingsError::TypeMismatch);
                    }
                    entry.held = Held::Value(value);
                    entry.status.origin = layer;
                    entry.status.custom_default = true;
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SettingsError> {
        let mut seen = Bitmap::<256>::new();
        for entry in self.entries.iter_mut() {
            let wire = entry.element.id as u8;
            if wire == 0x00 || wire == 0xFF {
                return Err(SettingsError::ReservedId);
            }
            if seen.set(wire as usize, true) {
                return Err(SettingsError::DuplicateWireId);
            }

            self.shortcuts
                .push(entry.element.format.shortcut)
                .map_err(|_| SettingsError::EntriesFull)?;

            if entry.status.custom_default {
                if let Held::Value(v) = entry.held {
                    entry.custom = Some(self.custom_defaults.len() as u8);
                    self.custom_defaults
                        .push(v)
                        .map_err(|_| SettingsError::CustomDefaultsFull)?;
                }
            }

            if let Held::Value(Value::Str(text)) = entry.held {
                let cap = entry.element.len as usize;
                if cap > STR_MAX_LEN || text.len() > cap {
                    return Err(SettingsError::StringTooLong);
                }
                let at = self.pool.len();
                self.pool
                    .resize(at + cap, 0)
                    .map_err(|_| SettingsError::StringPoolFull)?;
                self.pool[at..at + text.len()].copy_from_slice(text);
                entry.held = Held::Pooled {
                    at: at as u16,
                    len: text.len() as u8,
                    cap: cap as u8,
                };
            }
        }
        debug!("resolved {} entries, pool {} bytes", self.entries.len(), self.pool.len());
        Ok(())
    }

    fn position_by_wire(&self, wire: u8) -> Option<usize> {
        self.entries.iter().position(|e| e.element.id as u8 == wire)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn value_of(&self, entry: &Entry) -> Value<'_> {
        match entry.held {
            Held::Value(v) => v,
            Held::Pooled { at, len, .. } => {
                let at = at as usize;
                Value::Str(&self.pool[at..at + len as usize])
            }
        }
    }

    fn default_of(&self, entry: &Entry) -> Value<'static> {
        entry
            .custom
            .and_then(|i| self.custom_defaults.get(i as usize).copied())
            .unwrap_or(entry.element.default)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntryRef<'_>> + '_ {
        self.entries.iter().map(|e| EntryRef {
            element: e.element,
            value: self.value_of(e),
            status: e.status,
        })
    }

    pub fn get(&self, id: u16) -> Option<EntryRef<'_>> {
        let e = &self.entries[self.position(id)?];
        Some(EntryRef {
            element: e.element,
            value: self.value_of(e),
            status: e.status,
        })
    }

    pub fn value(&self, id: u16) -> Option<Value<'_>> {
        self.get(id).map(|e| e.value)
    }

    pub fn status(&self, id: u16) -> Option<Status> {
        self.get(id).map(|e| e.status)
    }

    /// The value a fresh merge would give `id`: its custom default if any,
    /// else the schema default.
    pub fn default_value(&self, id: u16) -> Option<Value<'static>> {
        let i = self.position(id)?;
        Some(self.default_of(&self.entries[i]))
    }

    /// Id of the first entry bound to the menu key `key`.
    pub fn find_by_shortcut(&self, key: u8) -> Option<u16> {
        let i = self.shortcuts.iter().position(|k| *k == key)?;
        Some(self.entries[i].element.id)
    }

    fn store(&mut self, i: usize, value: Value<'_>) -> Result<(), SettingsError> {
        let entry = &mut self.entries[i];
        if value.value_type() != entry.element.value_type() {
            return Err(SettingsError::TypeMismatch);
        }
        match value {
            Value::Str(text) => {
                let Held::Pooled { at, len, cap } = &mut entry.held else {
                    return Err(SettingsError::TypeMismatch);
                };
                if text.len() > *cap as usize {
                    return Err(SettingsError::StringTooLong);
                }
                let at = *at as usize;
                self.pool[at..at + text.len()].copy_from_slice(text);
                *len = text.len() as u8;
            }
            scalar => {
                entry.held = Held::Value(Value::from_bits(
                    scalar.value_type(),
                    scalar.to_bits().unwrap_or(0),
                ));
            }
        }
        Ok(())
    }

    /// Sets a value directly and marks it modified.
    pub fn set_value(&mut self, id: u16, value: Value<'_>) -> Result<(), SettingsError> {
        let i = self.position(id).ok_or(SettingsError::NotFound)?;
        self.store(i, value)?;
        self.entries[i].status.modified = true;
        Ok(())
    }

    /// Runs `text` through the element's validator and stores the result.
    ///
    /// A rejected input leaves the current value and status unchanged.
    pub fn input(&mut self, id: u16, text: &[u8]) -> Result<(), SettingsError> {
        let i = self.position(id).ok_or(SettingsError::NotFound)?;
        let element = self.entries[i].element;
        let validator = element.validator.ok_or(SettingsError::ReadOnly)?;
        let value = validator.parse(element, text)?;
        self.store(i, value)?;
        self.entries[i].status.modified = true;
        Ok(())
    }

    /// Renders the current value of `id`.
    pub fn display(&self, id: u16) -> Result<DisplayText, SettingsError> {
        let entry = self.get(id).ok_or(SettingsError::NotFound)?;
        let mut out = DisplayText::new();
        entry
            .element
            .render(entry.value, &mut out)
            .map_err(|_| SettingsError::BufferFull)?;
        Ok(out)
    }

    /// Demotes saved values to saved-by-higher before another slot is loaded.
    pub fn mark_saved_as_higher(&mut self) {
        for e in self.entries.iter_mut() {
            if e.status.saved {
                e.status.saved = false;
                e.status.saved_higher = true;
            }
        }
    }

    /// Overlays the values found in `slice`.
    ///
    /// Entries the slice does not mention keep their current value. Values
    /// whose type disagrees with the schema are skipped.
    pub fn apply_slice(&mut self, slice: &Slice<'_>, opts: LoadOptions) -> usize {
        let mut applied = 0;
        for i in 0..self.entries.len() {
            let entry = self.entries[i];
            if opts.skip_slot_layer && entry.status.origin == Layer::Slot {
                continue;
            }
            let Some(value) = slice.find(entry.element.id as u8) else {
                continue;
            };
            if let Err(_e) = self.store(i, value) {
                warn!("skip stored id {}: {}", entry.element.id, _e);
                continue;
            }

            let status = &mut self.entries[i].status;
            status.saved_higher = false;
            if opts.as_unsaved {
                status.modified = true;
            } else {
                status.saved = true;
                status.modified = false;
            }
            applied += 1;
        }
        applied
    }

    fn should_write(&self, entry: &Entry, opts: SaveOptions) -> Option<bool> {
        let st = entry.status;
        if !(st.saved || st.modified || (opts.include_higher && st.saved_higher)) {
            return None;
        }
        let at_default = self.value_of(entry) == self.default_of(entry);
        Some(!at_default || st.saved_higher)
    }

    /// Encodes the entries a save would persist as `(id, tag, value)*`.
    ///
    /// Values equal to their default are left out unless inherited from a
    /// higher layer. Returns the number of entries written.
    pub fn write_payload(
        &self,
        w: &mut Writer<'_>,
        opts: SaveOptions,
    ) -> Result<usize, SettingsError> {
        let mut count = 0;
        for entry in self.entries.iter() {
            if self.should_write(entry, opts) != Some(true) {
                continue;
            }
            let start = w.position();
            let res = w
                .write_u8(entry.element.id as u8)
                .and_then(|_| self.value_of(entry).encode(w));
            if let Err(e) = res {
                w.rewind(start);
                return Err(e);
            }
            count += 1;
        }
        Ok(count)
    }

    /// Updates status after a payload written with `opts` was persisted.
    pub fn commit_saved(&mut self, opts: SaveOptions) {
        for i in 0..self.entries.len() {
            let Some(written) = self.should_write(&self.entries[i], opts) else {
                continue;
            };
            let status = &mut self.entries[i].status;
            status.modified = false;
            status.saved = written;
            if written {
                status.saved_higher = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::test_support::{
        BOARD, CH, LID, NAME, REMOVE_CH, SLOT_CH, TestResolved, base_only, resolved_for,
    };
    use crate::settings::value::ValueType;

    static WITH_BOARD: Composition = base_only().layer(Layer::Board, &BOARD);
    static BOARD_REMOVES_CH: Composition = base_only().custom(Layer::Board, &REMOVE_CH);
    static SLOT_REDECLARES_CH: Composition = base_only()
        .custom(Layer::Board, &REMOVE_CH)
        .layer(Layer::Slot, &SLOT_CH);

    #[test]
    fn base_layer_defaults() {
        let r = resolved_for(&base_only());

        assert_eq!(r.len(), 3);
        assert_eq!(r.value(CH).unwrap(), Value::U8(18));
        assert_eq!(r.value(NAME).unwrap(), Value::Str(b"node"));
        assert_eq!(r.status(CH).unwrap(), Status::default());
        assert_eq!(r.find_by_shortcut(b'c'), Some(CH));
    }

    #[test]
    fn higher_layer_supersedes_lower() {
        let r = resolved_for(&WITH_BOARD);

        // id order is kept from the first declaration
        let ids: heapless::Vec<u16, 8> = r.iter().map(|e| e.element.id).collect();
        assert_eq!(ids.as_slice(), &[LID, CH, NAME, 70]);

        let ch = r.get(CH).unwrap();
        assert_eq!(ch.value, Value::U8(25));
        assert_eq!(ch.status.origin, Layer::Board);
        assert_eq!(r.status(LID).unwrap().origin, Layer::Base);
    }

    #[test]
    fn custom_default_applies_and_is_remembered() {
        static LID_9: [u8; 3] = [LID as u8, 0x11, 9];
        static C: Composition = base_only().custom(Layer::Slot, &LID_9);
        let r = resolved_for(&C);

        let lid = r.get(LID).unwrap();
        assert_eq!(lid.value, Value::U8(9));
        assert!(lid.status.custom_default);
        assert_eq!(lid.status.origin, Layer::Slot);
        assert_eq!(r.default_value(LID), Some(Value::U8(9)));
    }

    #[test]
    fn later_plain_declaration_clears_customization() {
        static CH_20: [u8; 3] = [CH as u8, 0x11, 20];
        static C: Composition = base_only()
            .custom(Layer::Base, &CH_20)
            .layer(Layer::Slot, &SLOT_CH);
        let r = resolved_for(&C);

        let ch = r.get(CH).unwrap();
        assert_eq!(ch.value, Value::U8(15));
        assert!(!ch.status.custom_default);
        assert_eq!(r.default_value(CH), Some(Value::U8(15)));
    }

    #[test]
    fn unused_marker_removes_and_slot_redeclares() {
        let r = resolved_for(&BOARD_REMOVES_CH);
        assert!(r.get(CH).is_none());
        assert_eq!(r.len(), 2);

        let r = resolved_for(&SLOT_REDECLARES_CH);
        let ch = r.get(CH).unwrap();
        assert_eq!(ch.value, Value::U8(15));
        assert_eq!(ch.status.origin, Layer::Slot);
        // re-declared ids go to the end
        assert_eq!(r.iter().last().unwrap().element.id, CH);
    }

    #[test]
    fn capacity_errors_are_hard_failures() {
        let mut small: Resolved<2, 16, 2> = Resolved::new();
        assert_eq!(small.merge(&base_only()), Err(SettingsError::EntriesFull));
        assert!(small.is_empty());

        let mut no_pool: Resolved<8, 4, 2> = Resolved::new();
        assert_eq!(no_pool.merge(&base_only()), Err(SettingsError::StringPoolFull));
    }

    #[test]
    fn duplicate_wire_id_is_rejected() {
        static CLASH: [Element; 1] = [Element::new(0x103, Value::U8(0))];
        static C: Composition = base_only().layer(Layer::Board, &CLASH);
        let mut r = TestResolved::new();
        assert_eq!(r.merge(&C), Err(SettingsError::DuplicateWireId));
    }

    #[test]
    fn custom_default_type_must_match() {
        static WRONG: [u8; 4] = [CH as u8, 0x32, 0, 20];
        static C: Composition = base_only().custom(Layer::Base, &WRONG);
        let mut r = TestResolved::new();
        assert_eq!(r.merge(&C), Err(SettingsError::TypeMismatch));
    }

    #[test]
    fn set_value_checks_type_and_capacity() {
        let mut r = resolved_for(&base_only());

        r.set_value(CH, Value::U8(11)).unwrap();
        assert_eq!(r.value(CH).unwrap(), Value::U8(11));
        assert!(r.status(CH).unwrap().modified);

        assert_eq!(r.set_value(CH, Value::U16(11)), Err(SettingsError::TypeMismatch));
        assert_eq!(r.set_value(999, Value::U8(1)), Err(SettingsError::NotFound));

        r.set_value(NAME, Value::Str(b"gateway1")).unwrap();
        assert_eq!(r.value(NAME).unwrap(), Value::Str(b"gateway1"));
        r.set_value(NAME, Value::Str(b"gw")).unwrap();
        assert_eq!(r.value(NAME).unwrap(), Value::Str(b"gw"));
        assert_eq!(
            r.set_value(NAME, Value::Str(b"too-long!")),
            Err(SettingsError::StringTooLong)
        );
        assert_eq!(r.get(NAME).unwrap().element.value_type(), ValueType::Str);
    }

    #[test]
    fn input_goes_through_validator() {
        let mut r = resolved_for(&base_only());

        r.input(CH, b"26").unwrap();
        assert_eq!(r.value(CH).unwrap(), Value::U8(26));
        assert_eq!(r.status(CH).unwrap().mark(), '*');

        // rejected input leaves value alone
        assert_eq!(r.input(CH, b"27"), Err(SettingsError::OutOfRange));
        assert_eq!(r.value(CH).unwrap(), Value::U8(26));

        assert_eq!(r.display(CH).unwrap().as_str(), "26");
        assert_eq!(r.display(NAME).unwrap().as_str(), "node");
    }

    #[test]
    fn save_payload_skips_defaults() {
        let mut r = resolved_for(&base_only());
        r.set_value(CH, Value::U8(20)).unwrap();
        // touched but still at default
        r.set_value(LID, Value::U8(1)).unwrap();

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        let n = r.write_payload(&mut w, SaveOptions::default()).unwrap();
        assert_eq!(n, 1);
        assert_eq!(w.written(), &[CH as u8, 0x11, 20]);

        r.commit_saved(SaveOptions::default());
        assert!(r.status(CH).unwrap().saved);
        assert!(!r.status(CH).unwrap().modified);
        assert!(!r.status(LID).unwrap().saved);
        assert!(!r.status(LID).unwrap().modified);
    }

    #[test]
    fn save_payload_skips_custom_defaults() {
        static LID_9: [u8; 3] = [LID as u8, 0x11, 9];
        static C: Composition = base_only().custom(Layer::Slot, &LID_9);
        let mut r = resolved_for(&C);

        // touched, equal to the custom default
        r.set_value(LID, Value::U8(9)).unwrap();
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        assert_eq!(r.write_payload(&mut w, SaveOptions::default()).unwrap(), 0);

        // schema default differs from the custom one, so it is written
        r.set_value(LID, Value::U8(1)).unwrap();
        let mut w = Writer::new(&mut buf);
        assert_eq!(r.write_payload(&mut w, SaveOptions::default()).unwrap(), 1);
        assert_eq!(w.written(), &[LID as u8, 0x11, 1]);
    }

    #[test]
    fn inherited_values_need_include_higher() {
        use crate::settings::slice::{SliceHeader, SliceWriter};

        let mut blob = [0u8; 16];
        let mut sw = SliceWriter::begin(&mut blob, SliceHeader::new(0, 1, 1, 0)).unwrap();
        sw.push(CH as u8, Value::U8(18)).unwrap();
        let n = sw.finish().unwrap();
        let slice = Slice::parse(&blob[..n]).unwrap();

        let mut r = resolved_for(&base_only());
        assert_eq!(r.apply_slice(&slice, LoadOptions::default()), 1);
        r.mark_saved_as_higher();
        assert_eq!(r.status(CH).unwrap().mark(), '^');

        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        assert_eq!(r.write_payload(&mut w, SaveOptions::default()).unwrap(), 0);

        // at its default, but forced in as an inherited value
        let higher = SaveOptions {
            include_higher: true,
        };
        assert_eq!(r.write_payload(&mut w, higher).unwrap(), 1);
        assert_eq!(w.written(), &[CH as u8, 0x11, 18]);
    }

    #[test]
    fn save_payload_overflow_is_reported() {
        let mut r = resolved_for(&base_only());
        r.set_value(NAME, Value::Str(b"gateway1")).unwrap();

        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        assert_eq!(
            r.write_payload(&mut w, SaveOptions::default()),
            Err(SettingsError::BufferFull)
        );
        assert_eq!(w.position(), 0);
    }
}
