// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-humidity-sht3x crate, and is dually
// licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Status register of the SHT3x (datasheet table 17).
use core::fmt;

/// Raw content of the 16-bit status register. Flags are independent, any
/// combination may be set.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StatusBits(u16);

impl StatusBits {
    /// At least one alert is pending
    pub const ALERT_PENDING: u16 = 0x8000;
    pub const HEATER_ENABLED: u16 = 0x2000;
    /// RH tracking alert
    pub const HUMIDITY_ALERT: u16 = 0x0800;
    /// T tracking alert
    pub const TEMPERATURE_ALERT: u16 = 0x0400;
    /// Hard reset, soft reset or supply fail since the last clear
    pub const RESET_DETECTED: u16 = 0x0010;
    /// Last command was not processed (invalid or failed checksum)
    pub const COMMAND_FAILED: u16 = 0x0002;
    /// Checksum of the last write transfer failed
    pub const WRITE_DATA_CRC_FAILED: u16 = 0x0001;

    const NAMES: [(u16, &'static str); 7] = [
        (Self::ALERT_PENDING, "ALERT_PENDING"),
        (Self::HEATER_ENABLED, "HEATER_ENABLED"),
        (Self::HUMIDITY_ALERT, "HUMIDITY_ALERT"),
        (Self::TEMPERATURE_ALERT, "TEMPERATURE_ALERT"),
        (Self::RESET_DETECTED, "RESET_DETECTED"),
        (Self::COMMAND_FAILED, "COMMAND_FAILED"),
        (Self::WRITE_DATA_CRC_FAILED, "WRITE_DATA_CRC_FAILED"),
    ];

    pub const fn from_bits(bits: u16) -> Self {
        StatusBits(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub const fn alert_pending(self) -> bool {
        self.contains(Self::ALERT_PENDING)
    }

    pub const fn heater_enabled(self) -> bool {
        self.contains(Self::HEATER_ENABLED)
    }

    pub const fn humidity_alert(self) -> bool {
        self.contains(Self::HUMIDITY_ALERT)
    }

    pub const fn temperature_alert(self) -> bool {
        self.contains(Self::TEMPERATURE_ALERT)
    }

    pub const fn reset_detected(self) -> bool {
        self.contains(Self::RESET_DETECTED)
    }

    pub const fn command_failed(self) -> bool {
        self.contains(Self::COMMAND_FAILED)
    }

    pub const fn write_crc_failed(self) -> bool {
        self.contains(Self::WRITE_DATA_CRC_FAILED)
    }
}

/// Renders the set flags as `ALERT_PENDING | RESET_DETECTED`; bits without
/// a name are not printed.
impl fmt::Display for StatusBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Last status word read from the sensor, until something invalidates it.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StatusCache(Option<StatusBits>);

impl StatusCache {
    pub(crate) fn get(&self) -> Option<StatusBits> {
        self.0
    }

    pub(crate) fn store(&mut self, status: StatusBits) {
        self.0 = Some(status);
    }

    pub(crate) fn invalidate(&mut self) {
        self.0 = None;
    }
}
