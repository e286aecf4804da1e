//! Standard elements shared by typical sensor and bridge applications.
//!
//! [`BASE`] is meant for the base layer. Applications that use only one of
//! the two channel settings drop the other with [`REMOVE_CHANNELS_3`] or
//! [`REMOVE_CHANNEL`]; both share the `c` menu key.

use crate::settings::{
    element::{Element, InputKind},
    validate::{AppId, ChannelList, MinMax, UartBaudOpt},
    value::{TAG_UNUSED, Value, ValueType},
};

pub const APPID: u16 = 1;
pub const LOGICALID: u16 = 2;
pub const CHANNEL: u16 = 3;
pub const CHANNELS_3: u16 = 4;
pub const POWER_N_RETRY: u16 = 5;
pub const OPTBITS: u16 = 6;
pub const UARTBAUD: u16 = 7;
/// Ids 8 to 10 are left for application-specific 32-bit options.
pub const OPT_DWORD1: u16 = 8;
pub const OPT_DWORD2: u16 = 9;
pub const OPT_DWORD3: u16 = 10;

pub const DEFAULT_APP_ID: u32 = 0x6772_6301;

pub static BASE: [Element; 7] = [
    Element::new(APPID, Value::U32(DEFAULT_APP_ID))
        .label("AID", "Application ID [HEX:32bit]")
        .format(InputKind::Hex, 8, b'a')
        .validator(&AppId),
    Element::new(LOGICALID, Value::U8(1))
        .label("LID", "Device ID [1-100,etc]")
        .format(InputKind::Dec, 3, b'i')
        .range(0, 100)
        .validator(&MinMax),
    Element::new(CHANNEL, Value::U8(18))
        .label("CHN", "Channel [11-26]")
        .format(InputKind::Dec, 2, b'c')
        .range(11, 26)
        .validator(&MinMax),
    Element::new(CHANNELS_3, Value::U16(ChannelList::mask_of(18)))
        .label("CHL", "Channels Set")
        .description("Input up to 3 channels like '11,15,24'.")
        .format(InputKind::String, 8, b'c')
        .custom_display()
        .validator(&ChannelList),
    Element::new(POWER_N_RETRY, Value::U8(0x03))
        .label("PWR", "RF Power/Retry [HEX:8bit]")
        .description("YZ Y=Retry(0:default,F:0,1-9:count) Z=Power(3:Max,2,1,0:Min)")
        .format(InputKind::Hex, 2, b'x')
        .range(0, 0xFF)
        .validator(&MinMax),
    Element::new(UARTBAUD, Value::U16(384))
        .label("UOP", "UART Baud [9600-230400]")
        .format(InputKind::String, 10, b'b')
        .custom_display()
        .validator(&UartBaudOpt),
    Element::new(OPTBITS, Value::U32(0))
        .label("OPT", "Option Bits [HEX:32bit]")
        .format(InputKind::Hex, 8, b'o')
        .range(0, 0xFFFF_FFFF)
        .validator(&MinMax),
];

const LID_TAG: u8 = (ValueType::U8.code() << 4) | 1;

static SLOT_LOGICAL_ID: [[u8; 3]; 7] = [
    [LOGICALID as u8, LID_TAG, 2],
    [LOGICALID as u8, LID_TAG, 3],
    [LOGICALID as u8, LID_TAG, 4],
    [LOGICALID as u8, LID_TAG, 5],
    [LOGICALID as u8, LID_TAG, 6],
    [LOGICALID as u8, LID_TAG, 7],
    [LOGICALID as u8, LID_TAG, 8],
];

/// Custom-default list giving slot `n` (1 to 7) the logical id `n + 1`.
///
/// Slot 0 keeps the schema default and has no list.
pub fn slot_logical_id(slot: u8) -> Option<&'static [u8]> {
    let i = (slot as usize).checked_sub(1)?;
    SLOT_LOGICAL_ID.get(i).map(|list| list.as_slice())
}

/// Custom-default list removing [`CHANNELS_3`].
pub static REMOVE_CHANNELS_3: [u8; 2] = [CHANNELS_3 as u8, TAG_UNUSED];
/// Custom-default list removing [`CHANNEL`].
pub static REMOVE_CHANNEL: [u8; 2] = [CHANNEL as u8, TAG_UNUSED];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{
        compose::{Composition, Layer},
        resolved::Resolved,
    };

    static SINGLE_CHANNEL: Composition = Composition::new(1, 0)
        .layer(Layer::Base, &BASE)
        .custom(Layer::Board, &REMOVE_CHANNELS_3);

    #[test]
    fn base_resolves_with_defaults() {
        let mut r: Resolved<8, 0, 2> = Resolved::new();
        r.merge(&SINGLE_CHANNEL).unwrap();

        assert_eq!(r.len(), 6);
        assert!(r.get(CHANNELS_3).is_none());
        assert_eq!(r.value(APPID), Some(Value::U32(DEFAULT_APP_ID)));
        assert_eq!(r.find_by_shortcut(b'c'), Some(CHANNEL));
        assert_eq!(r.display(UARTBAUD).unwrap().as_str(), "38400,8N1");
        assert_eq!(r.display(POWER_N_RETRY).unwrap().as_str(), "0x03");
        assert_eq!(r.display(APPID).unwrap().as_str(), "0x67726301");
    }

    #[test]
    fn channel_list_display() {
        static BOTH: Composition = Composition::new(1, 0)
            .layer(Layer::Base, &BASE)
            .custom(Layer::Board, &REMOVE_CHANNEL);
        let mut r: Resolved<8, 0, 2> = Resolved::new();
        r.merge(&BOTH).unwrap();

        assert_eq!(r.display(CHANNELS_3).unwrap().as_str(), "18");
        r.input(CHANNELS_3, b"11,26").unwrap();
        assert_eq!(r.display(CHANNELS_3).unwrap().as_str(), "11,26");
    }

    #[test]
    fn slot_lists_set_logical_id() {
        assert!(slot_logical_id(0).is_none());
        assert!(slot_logical_id(8).is_none());
        assert_eq!(slot_logical_id(1), Some(&[2u8, 0x11, 2][..]));

        let slot_3 = Composition::new(1, 3)
            .layer(Layer::Base, &BASE)
            .custom(Layer::Slot, slot_logical_id(3).unwrap());
        let mut r: Resolved<8, 0, 2> = Resolved::new();
        r.merge(&slot_3).unwrap();
        assert_eq!(r.value(LOGICALID), Some(Value::U8(4)));
        assert_eq!(r.default_value(LOGICALID), Some(Value::U8(4)));
    }
}
