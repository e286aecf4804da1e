/// Errors that can occur while resolving, loading or saving settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Two effective elements share the same wire id byte.
    DuplicateWireId,
    /// Element id maps to a reserved wire byte (0x00 or 0xFF).
    ReservedId,
    /// Custom-default list is truncated or carries a zero-length value.
    MalformedCustomDefault,
    /// Value type does not match the element's declared type.
    TypeMismatch,
    /// String longer than the element's declared length.
    StringTooLong,
    /// Resolved entry capacity exceeded.
    EntriesFull,
    /// String pool capacity exceeded.
    StringPoolFull,
    /// Custom-default value table capacity exceeded.
    CustomDefaultsFull,
    /// Output buffer capacity exceeded.
    BufferFull,
    /// Input text could not be parsed.
    InvalidInput,
    /// Parsed value lies outside the element's range.
    OutOfRange,
    /// No element with the requested id or shortcut.
    NotFound,
    /// Element has no validator and cannot take text input.
    ReadOnly,
    /// Unrecognized save-format version.
    UnknownFormat,
    /// Application id hash does not match.
    AppMismatch,
    /// Stored settings version is older than the minimum compatible one.
    IncompatibleVersion,
    /// Stored kind differs from the requested kind.
    KindMismatch,
    /// Stored slot differs from the requested slot.
    SlotMismatch,
    /// Blob ends before a declared length.
    Truncated,
    /// Sector does not start with the settings magic number.
    BadMagic,
    /// Sector header declares an empty payload.
    Empty,
    /// Sector payload checksum mismatch.
    CrcMismatch,
    /// Underlying storage reported a failure or an address out of range.
    Storage,
    /// Registry has no composition for the requested kind.
    NoComposition,
}

impl SettingsError {
    /// Returns true for failures that mean "no usable saved data".
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            SettingsError::BadMagic | SettingsError::Empty | SettingsError::CrcMismatch
        )
    }

    /// Returns true when a blob was readable but not acceptable for this configuration.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            SettingsError::UnknownFormat
                | SettingsError::AppMismatch
                | SettingsError::IncompatibleVersion
                | SettingsError::KindMismatch
                | SettingsError::SlotMismatch
                | SettingsError::Truncated
        )
    }
}

impl core::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SettingsError::DuplicateWireId => write!(f, "duplicate wire id"),
            SettingsError::ReservedId => write!(f, "reserved element id"),
            SettingsError::MalformedCustomDefault => write!(f, "malformed custom-default list"),
            SettingsError::TypeMismatch => write!(f, "value type mismatch"),
            SettingsError::StringTooLong => write!(f, "string exceeds declared length"),
            SettingsError::EntriesFull => write!(f, "entry capacity exceeded"),
            SettingsError::StringPoolFull => write!(f, "string pool capacity exceeded"),
            SettingsError::CustomDefaultsFull => write!(f, "custom-default table capacity exceeded"),
            SettingsError::BufferFull => write!(f, "buffer capacity exceeded"),
            SettingsError::InvalidInput => write!(f, "input could not be parsed"),
            SettingsError::OutOfRange => write!(f, "value out of range"),
            SettingsError::NotFound => write!(f, "element not found"),
            SettingsError::ReadOnly => write!(f, "element does not accept input"),
            SettingsError::UnknownFormat => write!(f, "unknown save format"),
            SettingsError::AppMismatch => write!(f, "application id mismatch"),
            SettingsError::IncompatibleVersion => write!(f, "incompatible settings version"),
            SettingsError::KindMismatch => write!(f, "kind mismatch"),
            SettingsError::SlotMismatch => write!(f, "slot mismatch"),
            SettingsError::Truncated => write!(f, "blob truncated"),
            SettingsError::BadMagic => write!(f, "bad magic number"),
            SettingsError::Empty => write!(f, "empty sector"),
            SettingsError::CrcMismatch => write!(f, "crc mismatch"),
            SettingsError::Storage => write!(f, "storage failure"),
            SettingsError::NoComposition => write!(f, "no settings for kind"),
        }
    }
}
