// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-humidity-sht3x crate, and is dually
// licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! CRC-8 used by the SHT3x to protect every 16-bit word on the bus.
//!
//! Polynomial 0x31 (x^8 + x^5 + x^4 + 1), no reflection, no final xor. The
//! seed is 0xFF for all transfers the sensor performs.

use ::crc::{Algorithm, Crc};

/// Initialization value for every checksum computed by the sensor
pub const SEED: u8 = 0xFF;

/// The CRC-8 variant used by Sensirion sensors (SHT3x datasheet 4.12)
pub const CRC_8_SENSIRION: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: SEED,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xF7,
    residue: 0x00,
};

const SENSIRION: Crc<u8> = Crc::<u8>::new(&CRC_8_SENSIRION);

/// Computes the checksum of a 2-byte word, starting from `seed`.
pub fn checksum(seed: u8, data: [u8; 2]) -> u8 {
    let mut digest = SENSIRION.digest_with_initial(seed);
    digest.update(&data);
    digest.finalize()
}

/// Serializes a word followed by its checksum.
pub(crate) fn word_with_crc(word: u16) -> [u8; 3] {
    let data = word.to_be_bytes();
    [data[0], data[1], checksum(SEED, data)]
}
