// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-humidity-sht3x crate, and is dually
// licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Logging goes to the `log::Log` implementation handed to the driver, never
//! to the global `log` facade, so that two drivers can report to different
//! sinks and nothing is printed unless asked for.

use log::{Log, Metadata, Record};

/// Target of every record emitted by the driver
pub const LOG_TARGET: &str = "sht3x";

/// Discards everything. Default logger of a new driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Log for Silent {
    fn enabled(&self, _: &Metadata) -> bool {
        false
    }

    fn log(&self, _: &Record) {}

    fn flush(&self) {}
}

pub(crate) static SILENT: Silent = Silent;

macro_rules! emit {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger: &dyn ::log::Log = $logger;
        let metadata = ::log::Metadata::builder()
            .level($level)
            .target($crate::logging::LOG_TARGET)
            .build();
        if logger.enabled(&metadata) {
            logger.log(
                &::log::Record::builder()
                    .metadata(metadata)
                    .args(format_args!($($arg)+))
                    .module_path_static(Some(module_path!()))
                    .file_static(Some(file!()))
                    .line(Some(line!()))
                    .build(),
            );
        }
    }};
}

macro_rules! log_trace {
    ($logger:expr, $($arg:tt)+) => { emit!($logger, ::log::Level::Trace, $($arg)+) };
}

macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => { emit!($logger, ::log::Level::Debug, $($arg)+) };
}

macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => { emit!($logger, ::log::Level::Warn, $($arg)+) };
}
