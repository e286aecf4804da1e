pub mod builder;
pub mod command;
pub mod compose;
pub mod crc;
pub mod cursor;
pub mod defsets;
pub mod element;
pub mod engine;
pub mod error;
pub mod nvm;
pub mod platform;
pub mod resolved;
pub mod slice;
pub mod validate;
pub mod value;

#[cfg(test)]
mod test_support;

pub use builder::SettingsBuilder;
pub use command::{CommandOp, Reply};
pub use compose::{Composition, CustomDefault, CustomDefaults, Layer, lookup};
pub use cursor::{Reader, Writer};
pub use element::{Element, InputFormat, InputKind};
pub use engine::{AppInfo, FinalFlags, SettingsEngine};
pub use error::SettingsError;
pub use nvm::{Eeprom, Nvm};
pub use platform::{NvmPlatform, Platform, SLOT_BLOB_CAPACITY};
pub use resolved::{EntryRef, LoadOptions, Resolved, SaveOptions, Status};
pub use slice::{Slice, SliceHeader, SliceWriter};
pub use validate::{AppId, ChannelList, DisplayText, MinMax, Text, UartBaudOpt, Validate};
pub use value::{Value, ValueType};

pub mod prelude {
    pub use super::{
        AppId, AppInfo, ChannelList, CommandOp, Composition, DisplayText, Eeprom, Element,
        FinalFlags, InputKind, Layer, LoadOptions, MinMax, NvmPlatform, Platform, Reply,
        Resolved, SaveOptions, SettingsBuilder, SettingsEngine, SettingsError, Status, Text,
        UartBaudOpt, Validate, Value, ValueType,
    };
}
