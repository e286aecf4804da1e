//! A `no_std`, no-alloc layered settings engine for embedded devices.
//!
//! Settings are declared as static schemas, composed from up to three
//! layers, persisted as compact tagged blobs and edited through validators
//! or a small remote command protocol.
//!
//! # Features
//!
//! - **Zero heap allocation** - capacities are const generics
//! - **Layered schemas** - base, board and slot layers with custom defaults
//! - **Slot cascading** - slot 0's saved values show through in other slots
//! - **Minimal blobs** - values equal to their default are never written
//! - **Checked storage** - magic number and CRC-8 on every EEPROM record
//!
//! # Architecture
//!
//! ```text
//!  registry ──lookup(kind, slot)──▶ Composition
//!                                      │ merge
//!                                      ▼
//!  Platform::load ──Slice──apply──▶ Resolved ──write_payload──Slice──▶ Platform::save
//!                                      ▲
//!                  input / set_value / remote commands
//! ```
//!
//! - **Compositions** list the element layers and custom defaults for a
//!   `(kind, slot)` pair
//! - **Resolved** holds one value plus status per effective element
//! - **Platform** moves blobs to and from storage; [`settings::NvmPlatform`]
//!   stores them in EEPROM segments
//!
//! # Example
//!
//! ```rust
//! use embedded_settings::prelude::*;
//! use embedded_settings::settings::defsets;
//!
//! struct Ram([u8; 64], usize);
//!
//! impl Platform for Ram {
//!     fn load(&mut self, _: u8, _: u8, buf: &mut [u8]) -> Result<usize, SettingsError> {
//!         if self.1 == 0 {
//!             return Err(SettingsError::BadMagic);
//!         }
//!         buf[..self.1].copy_from_slice(&self.0[..self.1]);
//!         Ok(self.1)
//!     }
//!     fn save(&mut self, _: u8, _: u8, blob: &[u8]) -> Result<(), SettingsError> {
//!         self.0[..blob.len()].copy_from_slice(blob);
//!         self.1 = blob.len();
//!         Ok(())
//!     }
//!     fn erase(&mut self, _: u8, _: u8) -> Result<(), SettingsError> {
//!         self.1 = 0;
//!         Ok(())
//!     }
//!     fn serial_number(&self) -> u32 {
//!         0x8100_0000
//!     }
//!     fn tick_ms(&self) -> u32 {
//!         0
//!     }
//! }
//!
//! static REGISTRY: [Composition; 1] =
//!     [Composition::new(1, 0).layer(Layer::Base, &defsets::BASE)];
//!
//! let app = AppInfo {
//!     app_id: defsets::DEFAULT_APP_ID,
//!     firmware_version: 0x0001_0000,
//!     settings_version: 1,
//!     min_compatible_version: 1,
//! };
//! let mut engine = SettingsBuilder::new(app)
//!     .registry(&REGISTRY)
//!     .platform(Ram([0; 64], 0))
//!     .build::<16, 0, 4>();
//!
//! // nothing saved yet: schema defaults
//! assert!(engine.select(1, 0).unwrap_err().is_integrity());
//!
//! engine.resolved_mut().input(defsets::CHANNEL, b"25").unwrap();
//! engine.save_current(SaveOptions::default()).unwrap();
//!
//! engine.select(1, 0).unwrap();
//! assert_eq!(engine.resolved().value(defsets::CHANNEL), Some(Value::U8(25)));
//! assert_eq!(engine.resolved().status(defsets::CHANNEL).unwrap().mark(), '$');
//! ```

#![deny(unsafe_code)]
#![no_std]

mod fmt;

pub mod settings;

pub mod prelude {
    pub use crate::settings::prelude::*;
}
