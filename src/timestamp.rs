use core::num::Wrapping;

use embassy_time::{Duration, Instant};

/// A reading of the monotonic microsecond clock.
///
/// Stored as 32 bits so it rolls over every 2^32 microseconds (about 71.6 minutes).
/// Elapsed time is always taken with wrapping subtraction, so a reading taken just
/// after the roll over still yields the small forward gap.
///```rust
/// use speed_estimator::Timestamp;
///
/// let before = Timestamp::from_micros(u32::MAX - 5);
/// let after = Timestamp::from_micros(2);
/// assert_eq!(after.elapsed_since(before).as_micros(), 8);
///```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Timestamp(Wrapping<u32>);

#[cfg(feature = "defmt")]
/// `Wrapping` has no `defmt::Format` impl, so forward to the raw value.
mod defmt_impl {
    use super::Timestamp;
    #[mutants::skip]
    impl defmt::Format for Timestamp {
        fn format(&self, fmt: defmt::Formatter) {
            defmt::write!(fmt, "{}us", self.0.0);
        }
    }
}

impl Timestamp {
    /// The reading every estimator starts from.
    pub const ZERO: Self = Self(Wrapping(0));

    pub const fn from_micros(micros: u32) -> Self {
        Self(Wrapping(micros))
    }

    pub fn as_micros(self) -> u32 {
        self.0.0
    }

    /// Time elapsed between `earlier` and `self`.
    ///
    /// Computed in `u32` so a clock that wrapped once between the two readings still
    /// produces the true gap. Two wraps between readings cannot be detected.
    pub fn elapsed_since(self, earlier: Self) -> Duration {
        Duration::from_micros(u64::from((self.0 - earlier.0).0))
    }
}

impl From<Instant> for Timestamp {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Keeping only the low 32 bits is what makes this clock wrap"
    )]
    fn from(instant: Instant) -> Self {
        Self::from_micros(instant.as_micros() as u32)
    }
}
