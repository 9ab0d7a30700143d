// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-humidity-sht3x crate, and is dually
// licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Conversions between the 16-bit codes transmitted by the sensor and
//! physical units (datasheet section 4.13).
//!
//! Physical values are rounded to two decimals. The inverse conversions
//! truncate, so a value converted to a code and back may drift by one code
//! (about 0.003 C or 0.002 %RH) plus the output rounding.

const CODE_SPAN: f32 = 65535.0;

fn round2(value: f32) -> f32 {
    libm::roundf(value * 100.0) / 100.0
}

pub fn code_to_celsius(code: u16) -> f32 {
    round2((code as f32) * 175.0 / CODE_SPAN - 45.0)
}

pub fn code_to_relative_humidity(code: u16) -> f32 {
    round2((code as f32) * 100.0 / CODE_SPAN)
}

/// Values outside the sensor range saturate at 0 or 0xFFFF.
pub fn celsius_to_code(celsius: f32) -> u16 {
    ((celsius + 45.0) * CODE_SPAN / 175.0) as u16
}

/// Values outside the sensor range saturate at 0 or 0xFFFF.
pub fn relative_humidity_to_code(rel_hum_percent: f32) -> u16 {
    (rel_hum_percent * CODE_SPAN / 100.0) as u16
}
