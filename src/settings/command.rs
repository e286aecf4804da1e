//! Remote command handling.
//!
//! Each request is an op byte plus payload and produces one reply written
//! into the caller's buffer. Framing on the wire is the transport's job.

use crate::settings::{
    SettingsError,
    cursor::Writer,
    engine::SettingsEngine,
    platform::Platform,
    resolved::SaveOptions,
};

/// Supported op codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandOp {
    Ack = 0xF0,
    ModuleInfo = 0xF1,
    Apply = 0xF2,
    Query = 0xF3,
    Control = 0xF8,
    SaveReset = 0xFE,
    Reset = 0xFF,
}

impl CommandOp {
    pub fn from_byte(op: u8) -> Option<Self> {
        Some(match op {
            0xF0 => Self::Ack,
            0xF1 => Self::ModuleInfo,
            0xF2 => Self::Apply,
            0xF3 => Self::Query,
            0xF8 => Self::Control,
            0xFE => Self::SaveReset,
            0xFF => Self::Reset,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Module-info request for the device address.
pub const INFO_ADDRESS: u8 = 0x01;
/// Module-control request switching kind and slot.
pub const CONTROL_KIND_SLOT: u8 = 0x20;
/// Kind or slot byte meaning "keep current".
pub const KEEP: u8 = 0xFF;
/// Written after the option byte when a settings reply failed.
pub const VOID: u8 = 0xFF;
/// Reply payload for unknown op codes.
pub const UNKNOWN_OP_REPLY: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

/// Outcome of one command. The reply payload is `out[..len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    pub op: u8,
    pub ok: bool,
    pub len: usize,
}

impl Reply {
    fn ok(op: CommandOp, len: usize) -> Self {
        Self {
            op: op.code(),
            ok: true,
            len,
        }
    }

    fn failed(op: CommandOp, len: usize) -> Self {
        Self {
            op: op.code(),
            ok: false,
            len,
        }
    }
}

fn keep_or(byte: Option<&u8>) -> Option<u8> {
    byte.copied().filter(|b| *b != KEEP)
}

impl<P: Platform, const N: usize, const SP: usize, const CD: usize> SettingsEngine<P, N, SP, CD> {
    /// Handles one remote command.
    ///
    /// Failures of the command itself clear the reply's `ok` flag; an error
    /// is returned only when `out` cannot hold the reply.
    pub fn handle_command(
        &mut self,
        op: u8,
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<Reply, SettingsError> {
        let Some(cmd) = CommandOp::from_byte(op) else {
            debug!("command {}: unknown", op);
            let mut w = Writer::new(out);
            w.write_bytes(&UNKNOWN_OP_REPLY)?;
            return Ok(Reply::ok(CommandOp::Ack, w.position()));
        };
        debug!("command {}: {} byte payload", op, payload.len());

        match cmd {
            CommandOp::Ack => {
                let mut w = Writer::new(out);
                if payload.is_empty() {
                    w.write_u8(0x01)?;
                } else {
                    w.write_bytes(payload)?;
                }
                Ok(Reply::ok(cmd, w.position()))
            }
            CommandOp::ModuleInfo => {
                if payload.first() != Some(&INFO_ADDRESS) {
                    return Ok(Reply::failed(cmd, 0));
                }
                let mut w = Writer::new(out);
                w.write_u8(INFO_ADDRESS)?;
                w.write_u32_be(self.platform().serial_number())?;
                Ok(Reply::ok(cmd, w.position()))
            }
            CommandOp::Query => {
                let opt = payload.first().copied().unwrap_or(0);
                let include_higher = SaveOptions {
                    include_higher: true,
                };
                self.reply_with_settings(cmd, opt, include_higher, out)
            }
            CommandOp::Apply => {
                let opt = payload.first().copied().unwrap_or(0);
                let blob = payload.get(1..).unwrap_or(&[]);
                let applied = match blob {
                    [] => Err(SettingsError::Truncated),
                    blob => self.apply_serialized(blob),
                };
                match applied {
                    Ok(_n) => {
                        debug!("applied {} remote values", _n);
                        self.reply_with_settings(cmd, opt, SaveOptions::default(), out)
                    }
                    Err(_e) => {
                        warn!("apply rejected: {}", _e);
                        void_reply(cmd, opt, out)
                    }
                }
            }
            CommandOp::Control => {
                let mut w = Writer::new(out);
                match payload {
                    [CONTROL_KIND_SLOT, args @ ..] if args.len() >= 2 => {
                        w.write_u8(CONTROL_KIND_SLOT)?;
                        match self.change_kind_slot(keep_or(args.first()), keep_or(args.get(1))) {
                            Ok((kind, slot)) => {
                                w.write_u8(kind)?;
                                w.write_u8(slot)?;
                                Ok(Reply::ok(cmd, w.position()))
                            }
                            Err(_e) => {
                                warn!("kind/slot change rejected: {}", _e);
                                w.write_u8(VOID)?;
                                Ok(Reply::failed(cmd, w.position()))
                            }
                        }
                    }
                    [CONTROL_KIND_SLOT, ..] => {
                        w.write_u8(CONTROL_KIND_SLOT)?;
                        w.write_u8(VOID)?;
                        Ok(Reply::failed(cmd, w.position()))
                    }
                    _ => Ok(Reply::failed(cmd, 0)),
                }
            }
            CommandOp::SaveReset => {
                if let Err(_e) = self.save_current(SaveOptions::default()) {
                    error!("save before reset failed: {}", _e);
                }
                self.platform_mut().reset();
                reset_reply(cmd, out)
            }
            CommandOp::Reset => {
                self.platform_mut().reset();
                reset_reply(cmd, out)
            }
        }
    }

    /// Writes `opt` followed by the current blob, or `opt, VOID` if the blob
    /// does not fit.
    fn reply_with_settings(
        &self,
        cmd: CommandOp,
        opt: u8,
        opts: SaveOptions,
        out: &mut [u8],
    ) -> Result<Reply, SettingsError> {
        let (head, rest) = out.split_first_mut().ok_or(SettingsError::BufferFull)?;
        *head = opt;
        match self.serialize(opts, rest) {
            Ok(n) => Ok(Reply::ok(cmd, n + 1)),
            Err(_) => void_reply(cmd, opt, out),
        }
    }
}

fn void_reply(cmd: CommandOp, opt: u8, out: &mut [u8]) -> Result<Reply, SettingsError> {
    let mut w = Writer::new(out);
    w.write_u8(opt)?;
    w.write_u8(VOID)?;
    Ok(Reply::failed(cmd, w.position()))
}

fn reset_reply(cmd: CommandOp, out: &mut [u8]) -> Result<Reply, SettingsError> {
    let mut w = Writer::new(out);
    w.write_u8(0x00)?;
    Ok(Reply::ok(cmd, w.position()))
}
