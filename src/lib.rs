//! Motor speed estimation from encoder pulse counts.
//!
//! The control loop samples a cumulative pulse count once per tick and hands it to a
//! [`SpeedEstimator`], which returns the low pass filtered speed of the output shaft in
//! RPM. Reading the encoder itself is left to the caller, see [`SharedPulseCounter`] for
//! a counter that can be fed from an interrupt.
//!
//! This crate does not depend on any HAL so the unit tests run on the host machine.
#![cfg_attr(not(test), no_std)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
use embassy_time::Instant;

mod calibration;
mod counter;
mod estimator;
mod filter;
mod pulses;
mod timestamp;

pub use calibration::Calibration;
pub use counter::SharedPulseCounter;
pub use estimator::SpeedEstimator;
pub use filter::LowPassFilter;
pub use pulses::PulseCount;
pub use timestamp::Timestamp;

/// Direction the encoder shaft turned.
///
/// Clockwise counts up, counterclockwise counts down.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// A monotonic microsecond clock.
///
/// This trait exists as a seam so that a fake clock can be injected when unit testing.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// The embassy time driver, truncated to a 32 bit microsecond clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[mutants::skip]
    fn now(&self) -> Timestamp {
        Timestamp::from(Instant::now())
    }
}
