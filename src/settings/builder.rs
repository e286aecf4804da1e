use core::marker::PhantomData;

use crate::settings::{
    compose::Composition,
    engine::{AppInfo, SettingsEngine},
    platform::Platform,
};

// Builder states
pub struct NeedRegistry;
pub struct NeedPlatform;
pub struct Ready;

/// Type-state builder for [`SettingsEngine`].
///
/// ```rust
/// use embedded_settings::prelude::*;
/// use embedded_settings::settings::defsets;
///
/// struct Nop;
/// impl Platform for Nop {
///     fn load(&mut self, _: u8, _: u8, _: &mut [u8]) -> Result<usize, SettingsError> {
///         Err(SettingsError::BadMagic)
///     }
///     fn save(&mut self, _: u8, _: u8, _: &[u8]) -> Result<(), SettingsError> {
///         Ok(())
///     }
///     fn erase(&mut self, _: u8, _: u8) -> Result<(), SettingsError> {
///         Ok(())
///     }
///     fn serial_number(&self) -> u32 {
///         0
///     }
///     fn tick_ms(&self) -> u32 {
///         0
///     }
/// }
///
/// static REGISTRY: [Composition; 1] =
///     [Composition::new(1, 0).layer(Layer::Base, &defsets::BASE)];
///
/// let app = AppInfo {
///     app_id: 0x6772_6301,
///     firmware_version: 0x0001_0000,
///     settings_version: 1,
///     min_compatible_version: 1,
/// };
/// let mut engine = SettingsBuilder::new(app)
///     .registry(&REGISTRY)
///     .platform(Nop)
///     .build::<16, 0, 4>();
/// engine.set_settings(1, 0).unwrap();
/// assert_eq!(engine.resolved().len(), defsets::BASE.len());
/// ```
pub struct SettingsBuilder<P, State> {
    app: AppInfo,
    registry: &'static [Composition],
    platform: P,
    _phantom: PhantomData<State>,
}

// Start the builder
impl SettingsBuilder<(), NeedRegistry> {
    pub fn new(app: AppInfo) -> Self {
        SettingsBuilder {
            app,
            registry: &[],
            platform: (),
            _phantom: PhantomData,
        }
    }

    /// Compositions the engine may select from.
    pub fn registry(self, registry: &'static [Composition]) -> SettingsBuilder<(), NeedPlatform> {
        SettingsBuilder {
            app: self.app,
            registry,
            platform: (),
            _phantom: PhantomData,
        }
    }
}

impl SettingsBuilder<(), NeedPlatform> {
    pub fn platform<P: Platform>(self, platform: P) -> SettingsBuilder<P, Ready> {
        SettingsBuilder {
            app: self.app,
            registry: self.registry,
            platform,
            _phantom: PhantomData,
        }
    }
}

impl<P: Platform> SettingsBuilder<P, Ready> {
    /// Builds the engine with room for `N` entries, an `SP`-byte string pool
    /// and `CD` custom defaults.
    pub fn build<const N: usize, const SP: usize, const CD: usize>(
        self,
    ) -> SettingsEngine<P, N, SP, CD> {
        SettingsEngine::new(self.app, self.registry, self.platform)
    }
}
