//! CRC16 as used by DSMR 4 telegrams.
//!
//! The polynomial is the IBM one (x^16 + x^15 + x^2 + 1), processed least
//! significant bit first, with no XOR on input or output. The accumulator
//! starts at zero.

use crc::{Algorithm, Crc};

/// CRC16 parameters for P1 telegrams.
pub const P1_CRC16: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x8005,
    init: 0x0000,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0xbb3d,
    residue: 0x0000,
};

const CRC: Crc<u16> = Crc::<u16>::new(&P1_CRC16);

/// Compute the telegram checksum over `bytes`.
pub fn checksum(bytes: &[u8]) -> u16 {
    CRC.checksum(bytes)
}

/// Render a checksum the way it appears on the wire: 4 uppercase hex digits.
pub fn format_checksum(crc: u16) -> String {
    format!("{crc:04X}")
}
