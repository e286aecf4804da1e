//! Load/save orchestration for one selected `(kind, slot)`.
//!
//! Loading cascades: slot 0's saved data is applied first (skipping entries
//! the slot layer declares), then the selected slot's own data. Values coming
//! from slot 0 end up marked saved-by-higher.

use crate::settings::{
    SettingsError,
    compose::{Composition, lookup},
    crc::app_id_hash,
    platform::Platform,
    resolved::{LoadOptions, Resolved, SaveOptions},
    slice::{Slice, SliceHeader, SliceWriter},
};

/// Largest blob the engine reads or writes.
pub const BLOB_CAPACITY: usize = 255;
/// Highest selectable slot.
pub const MAX_SLOT: u8 = 0x0F;

/// Identity and versioning of the application owning the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppInfo {
    pub app_id: u32,
    pub firmware_version: u32,
    /// Written into every saved blob.
    pub settings_version: u8,
    /// Oldest blob version still accepted on load.
    pub min_compatible_version: u8,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FinalFlags {
    /// A save went through since the last selection.
    pub saved: bool,
    /// Defaults were restored and not yet saved.
    pub reverted: bool,
}

/// Owns the resolved configuration and drives it against a [`Platform`].
///
/// Built with [`SettingsBuilder`](crate::settings::SettingsBuilder). Nothing
/// is selected until [`set_settings`](Self::set_settings) or
/// [`select`](Self::select) runs.
pub struct SettingsEngine<P: Platform, const N: usize, const SP: usize, const CD: usize> {
    app: AppInfo,
    registry: &'static [Composition],
    platform: P,
    resolved: Resolved<N, SP, CD>,
    kind: u8,
    slot: u8,
    flags: FinalFlags,
}

impl<P: Platform, const N: usize, const SP: usize, const CD: usize> SettingsEngine<P, N, SP, CD> {
    pub(crate) fn new(app: AppInfo, registry: &'static [Composition], platform: P) -> Self {
        Self {
            app,
            registry,
            platform,
            resolved: Resolved::new(),
            kind: 0,
            slot: 0,
            flags: FinalFlags::default(),
        }
    }

    pub fn app(&self) -> &AppInfo {
        &self.app
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn flags(&self) -> FinalFlags {
        self.flags
    }

    pub fn resolved(&self) -> &Resolved<N, SP, CD> {
        &self.resolved
    }

    pub fn resolved_mut(&mut self) -> &mut Resolved<N, SP, CD> {
        &mut self.resolved
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    fn app_hash(&self) -> u8 {
        app_id_hash(self.app.app_id)
    }

    fn header(&self, kind: u8, slot: u8) -> SliceHeader {
        SliceHeader::new(self.app_hash(), self.app.settings_version, kind, slot)
    }

    /// Selects `(kind, slot)` and rebuilds the configuration from schema
    /// defaults. Saved data is not read.
    pub fn set_settings(&mut self, kind: u8, slot: u8) -> Result<(), SettingsError> {
        let composition = lookup(self.registry, kind, slot).ok_or(SettingsError::NoComposition)?;
        self.kind = kind;
        self.slot = slot;
        self.flags = FinalFlags::default();
        self.resolved.merge(composition)
    }

    /// Applies saved data for `(kind, slot)` on top of the current values.
    ///
    /// For a non-zero slot, slot 0 is loaded first and its failures are only
    /// logged; the result is that of the slot's own data.
    pub fn load(&mut self, kind: u8, slot: u8) -> Result<(), SettingsError> {
        let higher = LoadOptions {
            skip_slot_layer: true,
            as_unsaved: false,
        };
        let slot0 = self.load_one(kind, 0, higher);
        if slot == 0 {
            return slot0.map(|_| ());
        }
        if let Err(_e) = slot0 {
            debug!("kind {} slot 0: nothing applied ({})", kind, _e);
        }
        self.resolved.mark_saved_as_higher();
        self.load_one(kind, slot, LoadOptions::default()).map(|_| ())
    }

    fn load_one(&mut self, kind: u8, slot: u8, opts: LoadOptions) -> Result<usize, SettingsError> {
        let mut buf = [0u8; BLOB_CAPACITY];
        let len = self.platform.load(kind, slot, &mut buf)?;
        let slice = Slice::parse(&buf[..len])?;
        if let Err(e) = slice.header().verify(
            self.app_hash(),
            self.app.min_compatible_version,
            kind,
            Some(slot),
        ) {
            warn!("kind {} slot {}: rejected ({})", kind, slot, e);
            return Err(e);
        }

        let applied = self.resolved.apply_slice(&slice, opts);
        debug!("kind {} slot {}: applied {} values", kind, slot, applied);
        Ok(applied)
    }

    /// [`set_settings`](Self::set_settings) followed by [`load`](Self::load).
    ///
    /// An integrity error from the load means no data was saved and leaves
    /// the defaults in place.
    pub fn select(&mut self, kind: u8, slot: u8) -> Result<(), SettingsError> {
        self.set_settings(kind, slot)?;
        self.load(kind, slot)
    }

    /// Persists the current values under `(kind, slot)` and returns the blob
    /// length.
    ///
    /// When nothing differs from its default the slot's storage is erased
    /// instead and 0 is returned.
    pub fn save(&mut self, kind: u8, slot: u8, opts: SaveOptions) -> Result<usize, SettingsError> {
        let started = self.platform.tick_ms();

        let mut buf = [0u8; BLOB_CAPACITY];
        let header = self.header(kind, slot);
        let mut sw = SliceWriter::begin(&mut buf, header)?;
        let count = self.resolved.write_payload(sw.writer(), opts)?;
        let len = sw.finish()?;

        let written = if count == 0 {
            self.platform.erase(kind, slot)?;
            0
        } else {
            self.platform.save(kind, slot, &buf[..len])?;
            len
        };

        self.resolved.commit_saved(opts);
        self.flags.saved = true;
        self.flags.reverted = false;

        let _elapsed = self.platform.tick_ms().wrapping_sub(started);
        info!(
            "kind {} slot {}: saved {} values, {} bytes in {} ms",
            kind, slot, count, written, _elapsed
        );
        Ok(written)
    }

    /// Saves to the selected `(kind, slot)`.
    pub fn save_current(&mut self, opts: SaveOptions) -> Result<usize, SettingsError> {
        self.save(self.kind, self.slot, opts)
    }

    /// Restores schema defaults without touching storage. The next save
    /// erases the slot.
    pub fn revert_to_default(&mut self) -> Result<(), SettingsError> {
        self.set_settings(self.kind, self.slot)?;
        self.flags.reverted = true;
        Ok(())
    }

    /// Writes the current values as a blob for the selected `(kind, slot)`.
    ///
    /// Status bits are left alone.
    pub fn serialize(&self, opts: SaveOptions, out: &mut [u8]) -> Result<usize, SettingsError> {
        let mut sw = SliceWriter::begin(out, self.header(self.kind, self.slot))?;
        self.resolved.write_payload(sw.writer(), opts)?;
        sw.finish()
    }

    /// Applies a blob received from a remote tool as unsaved changes.
    ///
    /// The blob's slot is ignored; values always land in the selected slot.
    pub fn apply_serialized(&mut self, blob: &[u8]) -> Result<usize, SettingsError> {
        let slice = Slice::parse(blob)?;
        slice.header().verify(
            self.app_hash(),
            self.app.min_compatible_version,
            self.kind,
            None,
        )?;
        let opts = LoadOptions {
            skip_slot_layer: false,
            as_unsaved: true,
        };
        Ok(self.resolved.apply_slice(&slice, opts))
    }

    /// Switches to another kind and/or slot and loads its saved data.
    ///
    /// `None` keeps the current value. Missing or unreadable saved data
    /// leaves the defaults and is not an error. Returns the new `(kind, slot)`.
    pub fn change_kind_slot(
        &mut self,
        kind: Option<u8>,
        slot: Option<u8>,
    ) -> Result<(u8, u8), SettingsError> {
        let kind = kind.unwrap_or(self.kind);
        let slot = slot.unwrap_or(self.slot);
        if slot > MAX_SLOT {
            return Err(SettingsError::OutOfRange);
        }

        self.set_settings(kind, slot)?;
        if let Err(_e) = self.load(kind, slot) {
            debug!("kind {} slot {}: keeping defaults ({})", kind, slot, _e);
        }
        Ok((self.kind, self.slot))
    }
}
