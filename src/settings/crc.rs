//! CRC-8 used for sector payloads and the application-id hash.

use crc::{Algorithm, Crc};

/// CRC-8, polynomial 0x31, no reflection, zero init and xorout.
pub const CRC_8_SETTINGS: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0x00,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xA2,
    residue: 0x00,
};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SETTINGS);

/// Checksum of `data`.
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// One-byte hash of an application id, computed over its big-endian bytes.
pub fn app_id_hash(app_id: u32) -> u8 {
    crc8(&app_id.to_be_bytes())
}
