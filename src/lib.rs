// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-humidity-sht3x crate, and is dually
// licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//
#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! This is a rust [`embedded-hal`](https://github.com/rust-embedded/embedded-hal)
//! driver for the Sensirion SHT3x (SHT30, SHT31, SHT35) temperature and
//! relative-humidity sensors.
//!
//! By depending on embedded-hal, this driver is platform-agnostic and can be
//! used with any physical device implementing the embedded-hal 1.0 traits.
//!
//! The full details about the SHT3x sensors can be read in their datasheet:
//! https://sensirion.com/media/documents/213E6A3B/63A5A569/Datasheet_SHT3x_DIS.pdf
//!
//! The sensor supports two acquisition modes:
//!
//! * single shot: every measurement is triggered by a command and is ready
//!   after a fixed conversion time ([`SHT3xDriver::measure`]).
//! * periodic: the sensor measures at a fixed [`Rate`] and the host fetches
//!   the latest result ([`SHT3xDriver::start_periodic`],
//!   [`SHT3xDriver::fetch`], [`SHT3xDriver::stop_periodic`]). When no new
//!   sample is available the sensor NACKs the read, which the driver retries
//!   a bounded number of times. Those waits can be aborted through a
//!   [`Cancellation`] source.
//!
//! ## Usage:
//!
//! ```ignore
//! use linux_embedded_hal as hal;
//!
//! use hal::{I2cdev, Delay};
//! use sensor_temp_humidity_sht3x::{SHT3xDriver, I2CAddr, Rate, Repeatability};
//!
//! fn main() {
//!     let i2c_dev = I2cdev::new("/dev/i2c-1").unwrap();
//!     let mut sht3x = SHT3xDriver::new(i2c_dev, I2CAddr::SHT3x_A, Delay);
//!
//!     if let Ok(m) = sht3x.measure(Repeatability::High) {
//!       println!("Temp: {temp} C, Relative Humidity: {rh} %",
//!                temp = m.temp,
//!                rh = m.rel_hum_percent);
//!     }
//!
//!     sht3x.start_periodic(Rate::OneMps, Repeatability::Medium).unwrap();
//!     for _ in 0..10 {
//!         let m = sht3x.fetch().unwrap();
//!         println!("Temp: {} C, Relative Humidity: {} %", m.temp, m.rel_hum_percent);
//!     }
//!     sht3x.stop_periodic().unwrap();
//! }
//! ```

#[macro_use]
mod logging;

mod alert;
pub mod cancel;
mod command;
pub mod convert;
pub mod crc;
mod status;

use core::fmt;

use embedded_hal as hal;

use hal::delay::DelayNs;
use hal::i2c::{ErrorKind, I2c};

use fugit::MillisDurationU32;
use log::Log;
use sensirion_i2c::i2c;

pub use alert::{AlertLimit, AlertLimitValue};
pub use cancel::{Abort, CancelToken, Cancellation, Clock, Deadline, NoCancel};
pub use command::{ClockStretching, Rate, Repeatability};
pub use logging::{Silent, LOG_TARGET};
pub use status::StatusBits;

use command::Command;
use status::StatusCache;

/// Number of reads repeated after the first one when a periodic fetch is
/// NACKed by the sensor.
pub const FETCH_RETRIES: u8 = 5;

/// Granularity of the cancellable fetch wait.
const WAIT_SLICE_MS: u32 = 1;

const SOFT_RESET_TIME_US: u32 = 1500;
const HEATER_SWITCH_TIME_MS: u32 = 1;
const ALERT_WRITE_TIME_MS: u32 = 1;

/// I2C address of SHT3x sensors depends on the level of the ADDR pin.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum I2CAddr {
    /// ADDR pin connected to VSS (default)
    SHT3x_A = 0x44,

    /// ADDR pin connected to VDD
    SHT3x_B = 0x45,
}

#[derive(Debug, PartialEq)]
pub enum Error<E> {
    /// Error on the I2C bus
    I2c(E),
    /// The sensor did not acknowledge a transfer. During a periodic fetch this
    /// means no new sample is available yet.
    NotAcknowledged(E),
    /// Failed checksum validation
    Crc,
    /// A periodic fetch was requested but the last command sent to the sensor
    /// was not the matching periodic measurement command
    NoActiveAcquisition,
    /// The wait for a periodic sample was cancelled
    Cancelled,
    /// The deadline passed while waiting for a periodic sample
    DeadlineExceeded,
}

impl<E: hal::i2c::Error> Error<E> {
    fn from_bus(err: E) -> Self {
        match err.kind() {
            ErrorKind::NoAcknowledge(_) => Error::NotAcknowledged(err),
            _ => Error::I2c(err),
        }
    }
}

impl<I: I2c> From<i2c::Error<I>> for Error<I::Error> {
    fn from(err: i2c::Error<I>) -> Self {
        match err {
            i2c::Error::Crc => Error::Crc,
            i2c::Error::I2cWrite(e) |
            i2c::Error::I2cRead(e) => Error::from_bus(e),
        }
    }
}

impl<E> From<Abort> for Error<E> {
    fn from(abort: Abort) -> Self {
        match abort {
            Abort::Cancelled => Error::Cancelled,
            Abort::DeadlineExceeded => Error::DeadlineExceeded,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "i2c error: {:?}", e),
            Error::NotAcknowledged(e) => write!(f, "sensor did not acknowledge: {:?}", e),
            Error::Crc => f.write_str("checksum mismatch"),
            Error::NoActiveAcquisition => f.write_str("no periodic measurement running"),
            Error::Cancelled => f.write_str("cancelled"),
            Error::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Error<E> {}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Measurement {
    pub temp: f32,
    pub rel_hum_percent: f32,
    pub repeatability: Repeatability,
}

/// Sensor codes as received, checksums already verified.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RawMeasurement {
    pub temp_ticks: u16,
    pub rel_hum_ticks: u16,
    pub repeatability: Repeatability,
}

impl From<RawMeasurement> for Measurement {
    fn from(raw: RawMeasurement) -> Self {
        Measurement {
            temp: convert::code_to_celsius(raw.temp_ticks),
            rel_hum_percent: convert::code_to_relative_humidity(raw.rel_hum_ticks),
            repeatability: raw.repeatability,
        }
    }
}

/// A driver instance owns the bus handle for one sensor. Calls are not
/// atomic with respect to each other, so one instance must not be shared
/// between callers interleaving commands.
pub struct SHT3xDriver<I2c, Delay> {
    i2c: I2c,
    address: u8,
    delay: Delay,
    clock_stretching: ClockStretching,
    logger: &'static dyn Log,
    status: StatusCache,
    last_command: Option<Command>,
    periodic: Option<(Rate, Repeatability)>,
}

impl<I2C: fmt::Debug, D: fmt::Debug> fmt::Debug for SHT3xDriver<I2C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SHT3xDriver")
            .field("i2c", &self.i2c)
            .field("address", &self.address)
            .field("delay", &self.delay)
            .field("clock_stretching", &self.clock_stretching)
            .field("status", &self.status)
            .field("last_command", &self.last_command)
            .field("periodic", &self.periodic)
            .finish_non_exhaustive()
    }
}

impl<I2C, D, E> SHT3xDriver<I2C, D>
where
    I2C: I2c<Error = E>,
    E: hal::i2c::Error,
    D: DelayNs,
{
    pub fn new(i2c: I2C, address: I2CAddr, delay: D) -> Self {
        SHT3xDriver {
            i2c,
            address: address as u8,
            delay,
            clock_stretching: ClockStretching::Disabled,
            logger: &logging::SILENT,
            status: StatusCache::default(),
            last_command: None,
            periodic: None,
        }
    }

    /// Sends the driver's log records to `logger` instead of discarding them.
    pub fn with_logger(mut self, logger: &'static dyn Log) -> Self {
        self.logger = logger;
        self
    }

    /// Selects the single-shot command variant. With clock stretching
    /// enabled the sensor holds the bus until the conversion is done and the
    /// driver does not wait on its own.
    pub fn with_clock_stretching(mut self, clock_stretching: ClockStretching) -> Self {
        self.clock_stretching = clock_stretching;
        self
    }

    /// Releases the bus and delay.
    pub fn destroy(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn send_command(&mut self, cmd: Command) -> Result<(), Error<E>> {
        i2c::write_command_u16(&mut self.i2c, self.address, cmd.opcode())
            .map_err(Error::from_bus)?;
        self.record(cmd);
        Ok(())
    }

    fn record(&mut self, cmd: Command) {
        if cmd.changes_mode() {
            self.last_command = Some(cmd);
        }
    }

    /// Reads whole `[msb, lsb, crc]` blocks into `rx_bytes`, checking every
    /// checksum.
    fn read_with_crc(&mut self, rx_bytes: &mut [u8]) -> Result<(), Error<E>> {
        let result = i2c::read_words_with_crc(&mut self.i2c, self.address, rx_bytes)
            .map_err(Error::from);
        match result {
            Err(Error::Crc) => log_warn!(self.logger, "checksum mismatch in {:02x?}", rx_bytes),
            Ok(()) => log_trace!(self.logger, "checksums verified for {} bytes", rx_bytes.len()),
            Err(_) => {}
        }
        result
    }

    fn read_measurement(&mut self, repeatability: Repeatability) -> Result<RawMeasurement, Error<E>> {
        let mut rx_bytes = [0; 6];
        self.read_with_crc(&mut rx_bytes)?;
        Ok(RawMeasurement {
            temp_ticks: word_at(&rx_bytes, 0),
            rel_hum_ticks: word_at(&rx_bytes, 1),
            repeatability,
        })
    }

    fn read_single_word(&mut self) -> Result<u16, Error<E>> {
        let mut rx_bytes = [0; 3];
        self.read_with_crc(&mut rx_bytes)?;
        Ok(word_at(&rx_bytes, 0))
    }

    /// Triggers a single-shot measurement and returns the raw sensor codes.
    pub fn measure_raw(&mut self, repeatability: Repeatability) -> Result<RawMeasurement, Error<E>> {
        log_debug!(self.logger, "single shot measurement, {:?} repeatability", repeatability);
        self.send_command(Command::SingleShot(repeatability, self.clock_stretching))?;
        self.status.invalidate();
        if self.clock_stretching == ClockStretching::Disabled {
            self.delay.delay_us(repeatability.conversion_time().to_micros());
        }
        self.read_measurement(repeatability)
    }

    pub fn measure(&mut self, repeatability: Repeatability) -> Result<Measurement, Error<E>> {
        let raw = self.measure_raw(repeatability)?;
        log_debug!(self.logger, "raw temperature {}, raw humidity {}", raw.temp_ticks, raw.rel_hum_ticks);
        Ok(raw.into())
    }

    /// Starts periodic acquisition. Results are read with the `fetch`
    /// methods until [`stop_periodic`](Self::stop_periodic) is called.
    pub fn start_periodic(&mut self, rate: Rate, repeatability: Repeatability) -> Result<(), Error<E>> {
        log_debug!(self.logger, "starting periodic measurement, {:?} {:?}", rate, repeatability);
        self.send_command(Command::Periodic(rate, repeatability))?;
        self.status.invalidate();
        self.delay.delay_us(repeatability.conversion_time().to_micros());
        self.periodic = Some((rate, repeatability));
        Ok(())
    }

    /// Sends the break command, returning the sensor to single-shot mode.
    /// Sent unconditionally, whether or not a periodic acquisition runs.
    pub fn stop_periodic(&mut self) -> Result<(), Error<E>> {
        log_debug!(self.logger, "stopping periodic measurement");
        self.send_command(Command::Break)?;
        self.status.invalidate();
        Ok(())
    }

    /// The running periodic acquisition, if the last mode command sent to the
    /// sensor is the one started by `start_periodic`.
    pub fn active_periodic(&self) -> Option<(Rate, Repeatability)> {
        let (rate, repeatability) = self.periodic?;
        let started = Command::Periodic(rate, repeatability).opcode();
        match self.last_command {
            Some(last) if last.opcode() == started => Some((rate, repeatability)),
            _ => None,
        }
    }

    pub fn fetch_raw(&mut self) -> Result<RawMeasurement, Error<E>> {
        self.fetch_raw_with_cancel(NoCancel)
    }

    pub fn fetch(&mut self) -> Result<Measurement, Error<E>> {
        self.fetch_with_cancel(NoCancel)
    }

    pub fn fetch_with_cancel<C: Cancellation>(&mut self, cancel: C) -> Result<Measurement, Error<E>> {
        let raw = self.fetch_raw_with_cancel(cancel)?;
        log_debug!(self.logger, "raw temperature {}, raw humidity {}", raw.temp_ticks, raw.rel_hum_ticks);
        Ok(raw.into())
    }

    /// Fetches the latest periodic sample.
    ///
    /// While the sensor has no new sample it NACKs the read. The read is
    /// retried up to [`FETCH_RETRIES`] times: the first wait lasts one full
    /// sampling interval of the active [`Rate`], every later wait a tenth of
    /// it. A firing `cancel` ends the wait and the fetch immediately.
    pub fn fetch_raw_with_cancel<C: Cancellation>(&mut self, mut cancel: C)
        -> Result<RawMeasurement, Error<E>> {
        let (rate, repeatability) = match self.active_periodic() {
            Some(session) => session,
            None => {
                log_debug!(self.logger, "fetch without a running periodic measurement");
                return Err(Error::NoActiveAcquisition);
            }
        };
        self.send_command(Command::FetchData)?;

        let mut wait = rate.interval();
        let mut retries_left = FETCH_RETRIES;
        loop {
            match self.read_measurement(repeatability) {
                Err(Error::NotAcknowledged(err)) => {
                    if retries_left == 0 {
                        log_warn!(self.logger, "no data after {} retries", FETCH_RETRIES);
                        return Err(Error::NotAcknowledged(err));
                    }
                    log_trace!(self.logger, "data not ready, retrying in {} ms", wait.to_millis());
                    self.wait_cancellable(wait, &mut cancel)?;
                    if retries_left == FETCH_RETRIES {
                        wait = MillisDurationU32::from_ticks(wait.ticks() / 10);
                    }
                    retries_left -= 1;
                }
                result => return result,
            }
        }
    }

    fn wait_cancellable<C: Cancellation>(&mut self, wait: MillisDurationU32, cancel: &mut C)
        -> Result<(), Error<E>> {
        let mut remaining_ms = wait.to_millis();
        loop {
            if let Some(abort) = cancel.poll() {
                log_debug!(self.logger, "fetch aborted ({:?}) with {} ms left to wait", abort, remaining_ms);
                return Err(abort.into());
            }
            if remaining_ms == 0 {
                return Ok(());
            }
            let slice = remaining_ms.min(WAIT_SLICE_MS);
            self.delay.delay_ms(slice);
            remaining_ms -= slice;
        }
    }

    /// Soft reset. The cached status is kept: call
    /// [`refresh_status`](Self::refresh_status) to see the reset flag.
    pub fn soft_reset(&mut self) -> Result<(), Error<E>> {
        log_debug!(self.logger, "soft reset");
        self.send_command(Command::SoftReset)?;
        self.delay.delay_us(SOFT_RESET_TIME_US);
        Ok(())
    }

    pub fn set_heater(&mut self, enable: bool) -> Result<(), Error<E>> {
        log_debug!(self.logger, "switching heater {}", if enable { "on" } else { "off" });
        let cmd = if enable { Command::HeaterEnable } else { Command::HeaterDisable };
        self.send_command(cmd)?;
        self.status.invalidate();
        // not specified by the datasheet, but the sensor rejects a command
        // sent right after this one
        self.delay.delay_ms(HEATER_SWITCH_TIME_MS);
        Ok(())
    }

    /// Returns the cached status register, reading it from the sensor only if
    /// nothing is cached.
    pub fn read_status(&mut self) -> Result<StatusBits, Error<E>> {
        if let Some(status) = self.status.get() {
            return Ok(status);
        }
        self.send_command(Command::ReadStatus)?;
        let bits = self.read_single_word()?;
        let status = StatusBits::from_bits(bits);
        log_debug!(self.logger, "status register {:#06x} [{}]", bits, status);
        self.status.store(status);
        Ok(status)
    }

    /// Reads the status register from the sensor, ignoring the cache.
    pub fn refresh_status(&mut self) -> Result<StatusBits, Error<E>> {
        self.status.invalidate();
        self.read_status()
    }

    /// Clears the alert and reset flags of the status register.
    pub fn clear_status(&mut self) -> Result<(), Error<E>> {
        log_debug!(self.logger, "clearing status register");
        self.send_command(Command::ClearStatus)?;
        self.status.invalidate();
        Ok(())
    }

    pub fn is_alert_pending(&mut self) -> Result<bool, Error<E>> {
        Ok(self.refresh_status()?.alert_pending())
    }

    pub fn is_heater_on(&mut self) -> Result<bool, Error<E>> {
        Ok(self.refresh_status()?.heater_enabled())
    }

    pub fn is_humidity_alert(&mut self) -> Result<bool, Error<E>> {
        Ok(self.refresh_status()?.humidity_alert())
    }

    pub fn is_temperature_alert(&mut self) -> Result<bool, Error<E>> {
        Ok(self.refresh_status()?.temperature_alert())
    }

    pub fn is_reset_detected(&mut self) -> Result<bool, Error<E>> {
        Ok(self.refresh_status()?.reset_detected())
    }

    pub fn is_command_failed(&mut self) -> Result<bool, Error<E>> {
        Ok(self.refresh_status()?.command_failed())
    }

    pub fn is_write_crc_failed(&mut self) -> Result<bool, Error<E>> {
        Ok(self.refresh_status()?.write_crc_failed())
    }

    pub fn read_alert_limit(&mut self, limit: AlertLimit) -> Result<AlertLimitValue, Error<E>> {
        log_debug!(self.logger, "reading alert limit {:?}", limit);
        self.send_command(Command::ReadAlertLimit(limit))?;
        let word = self.read_single_word()?;
        Ok(AlertLimitValue::from_word(word))
    }

    /// Writes one alert limit. Only the top 7 bits of humidity and 9 bits of
    /// temperature are kept by the sensor.
    pub fn write_alert_limit(&mut self, limit: AlertLimit, temp: f32, rel_hum_percent: f32)
        -> Result<(), Error<E>> {
        log_debug!(self.logger, "writing alert limit {:?}: {} C, {} %RH", limit, temp, rel_hum_percent);
        let cmd = Command::WriteAlertLimit(limit);
        let opcode = cmd.opcode().to_be_bytes();
        let payload = crate::crc::word_with_crc(AlertLimitValue { temp, rel_hum_percent }.to_word());
        let frame = [opcode[0], opcode[1], payload[0], payload[1], payload[2]];
        self.i2c.write(self.address, &frame).map_err(Error::from_bus)?;
        self.record(cmd);
        self.delay.delay_ms(ALERT_WRITE_TIME_MS);
        self.status.invalidate();
        Ok(())
    }
}

/// Word `index` of a received buffer made of `[msb, lsb, crc]` blocks.
fn word_at(rx_bytes: &[u8], index: usize) -> u16 {
    u16::from_be_bytes([rx_bytes[3 * index], rx_bytes[3 * index + 1]])
}
