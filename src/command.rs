// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-humidity-sht3x crate, and is dually
// licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//
use fugit::{MicrosDurationU32, MillisDurationU32};

use crate::alert::AlertLimit;

/// Repeatability trades measurement duration (and power) for lower noise.
///
/// Values given below are the typical repeatability (3 sigma) of consecutive
/// measurements in constant conditions, as listed in the SHT3x datasheet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Repeatability {
    /// Relative humididy meas. repeatability: 0.10 %RH
    /// Temperature meas. repeatability:       0.04 C
    /// Measurement duration (max):            15.5 ms
    High,

    /// Relative humididy meas. repeatability: 0.15 %RH
    /// Temperature meas. repeatability:       0.08 C
    /// Measurement duration (max):            6.5 ms
    Medium,

    /// Relative humididy meas. repeatability: 0.21 %RH
    /// Temperature meas. repeatability:       0.15 C
    /// Measurement duration (max):            4.5 ms
    Low,
}

impl Repeatability {
    /// Worst-case conversion time. The driver always waits this long, it does
    /// not try to detect an earlier completion.
    pub const fn conversion_time(self) -> MicrosDurationU32 {
        match self {
            Repeatability::High => MicrosDurationU32::micros(15_500),
            Repeatability::Medium => MicrosDurationU32::micros(6_500),
            Repeatability::Low => MicrosDurationU32::micros(4_500),
        }
    }
}

/// Measurements per second in periodic acquisition mode.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Rate {
    /// one measurement every 2 seconds
    HalfMps,
    OneMps,
    TwoMps,
    FourMps,
    TenMps,
}

impl Rate {
    /// Time between two consecutive samples of the sensor.
    pub const fn interval(self) -> MillisDurationU32 {
        match self {
            Rate::HalfMps => MillisDurationU32::millis(2000),
            Rate::OneMps => MillisDurationU32::millis(1000),
            Rate::TwoMps => MillisDurationU32::millis(500),
            Rate::FourMps => MillisDurationU32::millis(250),
            Rate::TenMps => MillisDurationU32::millis(100),
        }
    }
}

/// With clock stretching enabled the sensor holds SCL low until a
/// single-shot conversion completes, instead of NACKing the read header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ClockStretching {
    Enabled,
    Disabled,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Command {
    SingleShot(Repeatability, ClockStretching),
    Periodic(Rate, Repeatability),
    FetchData,
    Break,
    SoftReset,
    HeaterEnable,
    HeaterDisable,
    ReadStatus,
    ClearStatus,
    ReadAlertLimit(AlertLimit),
    WriteAlertLimit(AlertLimit),
}

impl Command {
    pub(crate) fn opcode(self) -> u16 {
        use ClockStretching::{Disabled, Enabled};
        use Repeatability::{High, Low, Medium};

        match self {
            Command::SingleShot(rep, stretch) => match (stretch, rep) {
                (Disabled, High) => 0x2400,
                (Disabled, Medium) => 0x240B,
                (Disabled, Low) => 0x2416,
                (Enabled, High) => 0x2C06,
                (Enabled, Medium) => 0x2C0D,
                (Enabled, Low) => 0x2C10,
            },
            Command::Periodic(rate, rep) => match (rate, rep) {
                (Rate::HalfMps, High) => 0x2032,
                (Rate::HalfMps, Medium) => 0x2024,
                (Rate::HalfMps, Low) => 0x202F,
                (Rate::OneMps, High) => 0x2130,
                (Rate::OneMps, Medium) => 0x2126,
                (Rate::OneMps, Low) => 0x212D,
                (Rate::TwoMps, High) => 0x2236,
                (Rate::TwoMps, Medium) => 0x2220,
                (Rate::TwoMps, Low) => 0x222B,
                (Rate::FourMps, High) => 0x2334,
                (Rate::FourMps, Medium) => 0x2322,
                (Rate::FourMps, Low) => 0x2329,
                (Rate::TenMps, High) => 0x2737,
                (Rate::TenMps, Medium) => 0x2721,
                (Rate::TenMps, Low) => 0x272A,
            },
            Command::FetchData => 0xE000,
            Command::Break => 0x3093,
            Command::SoftReset => 0x30A2,
            Command::HeaterEnable => 0x306D,
            Command::HeaterDisable => 0x3066,
            Command::ReadStatus => 0xF32D,
            Command::ClearStatus => 0x3041,
            Command::ReadAlertLimit(limit) => match limit {
                AlertLimit::HighSet => 0xE11F,
                AlertLimit::HighClear => 0xE114,
                AlertLimit::LowClear => 0xE109,
                AlertLimit::LowSet => 0xE102,
            },
            Command::WriteAlertLimit(limit) => match limit {
                AlertLimit::HighSet => 0x611D,
                AlertLimit::HighClear => 0x6116,
                AlertLimit::LowClear => 0x610B,
                AlertLimit::LowSet => 0x6100,
            },
        }
    }

    /// Whether the sensor keeps track of this command as part of its
    /// acquisition state. Status and fetch commands leave a running periodic
    /// acquisition untouched.
    pub(crate) fn changes_mode(self) -> bool {
        !matches!(
            self,
            Command::FetchData | Command::ReadStatus | Command::ClearStatus
        )
    }
}
