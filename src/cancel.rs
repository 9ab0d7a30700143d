// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-humidity-sht3x crate, and is dually
// licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Cancellation sources for the waits of a periodic fetch.
//!
//! A fetch may spend up to a few seconds polling a sensor that is not ready
//! yet. Between the delay slices of that wait the driver polls a
//! [`Cancellation`]; as soon as it reports an [`Abort`] the fetch returns.
//! What fires the cancellation (a button, a signal handler, another thread)
//! is up to the application.

use core::sync::atomic::{AtomicBool, Ordering};

use fugit::{MillisDurationU64, TimerInstantU64};

/// Millisecond timestamps used by [`Clock`] and [`Deadline`]
pub type Instant = TimerInstantU64<1000>;

/// Why a wait was aborted
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Abort {
    Cancelled,
    DeadlineExceeded,
}

pub trait Cancellation {
    /// Returns `Some` once the wait should stop. Polled at least once per
    /// millisecond of waiting.
    fn poll(&mut self) -> Option<Abort>;
}

/// Never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCancel;

impl Cancellation for NoCancel {
    fn poll(&mut self) -> Option<Abort> {
        None
    }
}

/// A flag that can be raised from anywhere holding a shared reference, e.g.
/// an interrupt handler or another thread.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub const fn new() -> Self {
        CancelToken { cancelled: AtomicBool::new(false) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Re-arms the token for another fetch.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}

impl Cancellation for &CancelToken {
    fn poll(&mut self) -> Option<Abort> {
        if self.is_cancelled() {
            Some(Abort::Cancelled)
        } else {
            None
        }
    }
}

/// Monotonic millisecond time source.
pub trait Clock {
    fn now(&mut self) -> Instant;
}

/// Fires once its clock reaches a fixed instant.
#[derive(Debug)]
pub struct Deadline<C> {
    clock: C,
    at: Instant,
}

impl<C: Clock> Deadline<C> {
    pub fn at(clock: C, at: Instant) -> Self {
        Deadline { clock, at }
    }

    pub fn after(mut clock: C, timeout: MillisDurationU64) -> Self {
        let at = clock.now() + timeout;
        Deadline { clock, at }
    }

    pub fn expires_at(&self) -> Instant {
        self.at
    }
}

impl<C: Clock> Cancellation for Deadline<C> {
    fn poll(&mut self) -> Option<Abort> {
        if self.clock.now() >= self.at {
            Some(Abort::DeadlineExceeded)
        } else {
            None
        }
    }
}

/// Both sources are polled, the first one wins.
impl<A: Cancellation, B: Cancellation> Cancellation for (A, B) {
    fn poll(&mut self) -> Option<Abort> {
        self.0.poll().or_else(|| self.1.poll())
    }
}

impl<T: Cancellation + ?Sized> Cancellation for &mut T {
    fn poll(&mut self) -> Option<Abort> {
        (**self).poll()
    }
}

/// [`Clock`] backed by `std::time::Instant`, counting from its creation.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    pub fn new() -> Self {
        SystemClock { origin: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&mut self) -> Instant {
        Instant::from_ticks(self.origin.elapsed().as_millis() as u64)
    }
}
