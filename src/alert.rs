// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-humidity-sht3x crate, and is dually
// licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Alert threshold registers.
//!
//! Each register holds one humidity/temperature pair in a single word: the 7
//! most significant bits of the humidity code followed by the 9 most
//! significant bits of the temperature code. Anything below that is lost,
//! so a written limit reads back up to ~0.34 C and ~0.78 %RH lower.

use crate::convert::{
    celsius_to_code, code_to_celsius, code_to_relative_humidity,
    relative_humidity_to_code,
};

const HUMIDITY_MASK: u16 = 0xFE00;
const TEMPERATURE_MASK: u16 = 0xFF80;
const TEMPERATURE_SHIFT: u32 = 7;

/// The four limits of the alert comparator. The sensor expects
/// HighSet > HighClear > LowClear > LowSet; the driver writes whatever it is
/// given.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AlertLimit {
    /// Alert is raised above this level
    HighSet,
    /// A high alert is cleared below this level
    HighClear,
    /// A low alert is cleared above this level
    LowClear,
    /// Alert is raised below this level
    LowSet,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct AlertLimitValue {
    pub temp: f32,
    pub rel_hum_percent: f32,
}

pub(crate) fn pack_limit(temp_code: u16, rel_hum_code: u16) -> u16 {
    (rel_hum_code & HUMIDITY_MASK) | ((temp_code & TEMPERATURE_MASK) >> TEMPERATURE_SHIFT)
}

/// Returns `(temp_code, rel_hum_code)` with the truncated bits zeroed.
pub(crate) fn unpack_limit(word: u16) -> (u16, u16) {
    let rel_hum_code = word & HUMIDITY_MASK;
    let temp_code = (word & !HUMIDITY_MASK) << TEMPERATURE_SHIFT;
    (temp_code, rel_hum_code)
}

impl AlertLimitValue {
    pub(crate) fn from_word(word: u16) -> Self {
        let (temp_code, rel_hum_code) = unpack_limit(word);
        AlertLimitValue {
            temp: code_to_celsius(temp_code),
            rel_hum_percent: code_to_relative_humidity(rel_hum_code),
        }
    }

    pub(crate) fn to_word(self) -> u16 {
        pack_limit(celsius_to_code(self.temp), relative_humidity_to_code(self.rel_hum_percent))
    }
}
