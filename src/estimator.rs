use crate::{Calibration, Clock, LowPassFilter, PulseCount, Timestamp};

/// Everything that changes from one sample to the next.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
struct SampleState<P: PulseCount> {
    previous_timestamp: Timestamp,
    previous_pulse_count: P,
    /// Holds the filtered speed and the unfiltered speed of the previous sample.
    filter: LowPassFilter,
    primed: bool,
}

/// Estimates the output shaft speed (RPM) of a motor from its encoder pulse count.
///
/// Call [`estimate_speed`](Self::estimate_speed) from the control loop at a steady cadence,
/// nominally every 10ms. Each call compares the pulse count against the previous sample,
/// converts the pulse rate to RPM and runs it through a [`LowPassFilter`].
///
/// Two readings of `C` must never be more than one clock wrap apart, and fewer than half
/// the range of `P` pulses may go by between two samples, otherwise the speed aliases.
///```rust
/// use core::cell::Cell;
/// use speed_estimator::{Clock, SpeedEstimator, Timestamp};
///
/// struct FakeClock(Cell<u32>);
/// impl Clock for FakeClock {
///     fn now(&self) -> Timestamp {
///         Timestamp::from_micros(self.0.get())
///     }
/// }
///
/// let clock = FakeClock(Cell::new(0));
/// let mut estimator: SpeedEstimator<_> = SpeedEstimator::new(&clock, 22.0, 9.3);
/// // No time has passed since the zero baseline, so nothing happens.
/// assert_eq!(estimator.estimate_speed(0), 0.0);
///
/// clock.0.set(1_000_000);
/// let rpm = estimator.estimate_speed(22);
/// assert!((estimator.previous_velocity() - 6.4516).abs() < 1e-3);
/// assert!((rpm - 0.1367 * 6.4516).abs() < 1e-3);
///```
#[derive(Debug)]
pub struct SpeedEstimator<C: Clock, P: PulseCount = i32> {
    clock: C,
    calibration: Calibration,
    state: SampleState<P>,
}

impl<C: Clock, P: PulseCount> SpeedEstimator<C, P> {
    /// Create an estimator at rest with a zero time and pulse baseline.
    ///
    /// `pulses_per_revolution` and `gear_ratio` must be nonzero; they are not checked.
    pub fn new(clock: C, pulses_per_revolution: f32, gear_ratio: f32) -> Self {
        Self::with_calibration(
            clock,
            Calibration::new(pulses_per_revolution, gear_ratio),
        )
    }

    pub fn with_calibration(clock: C, calibration: Calibration) -> Self {
        Self {
            clock,
            calibration,
            state: SampleState::default(),
        }
    }

    /// Sample the clock and update the estimate with the current pulse count.
    ///
    /// Returns the filtered speed in RPM. Negative means counterclockwise.
    pub fn estimate_speed(&mut self, pulses: P) -> f32 {
        let now = self.clock.now();
        self.estimate_speed_at(now, pulses)
    }

    /// Update the estimate with a pulse count sampled at `now`.
    ///
    /// If no time has elapsed since the previous sample nothing is updated and the
    /// previous filtered speed is returned.
    pub fn estimate_speed_at(&mut self, now: Timestamp, pulses: P) -> f32 {
        let elapsed = secs(now.elapsed_since(self.state.previous_timestamp));
        if elapsed <= 0.0 {
            return self.filtered_speed();
        }

        let delta = pulses.wrapping_delta(self.state.previous_pulse_count);
        let rpm = self.calibration.rpm(delta.to_f32() / elapsed);

        let mut filter = self.state.filter;
        let filtered = filter.update(rpm);
        self.state = SampleState {
            previous_timestamp: now,
            previous_pulse_count: pulses,
            filter,
            primed: true,
        };
        filtered
    }

    /// Forget all samples. Calibration is kept.
    pub fn reset(&mut self) {
        self.state = SampleState::default();
    }

    /// Latest filtered speed in RPM.
    pub fn filtered_speed(&self) -> f32 {
        self.state.filter.output()
    }
    /// Unfiltered speed in RPM computed by the latest update.
    pub fn previous_velocity(&self) -> f32 {
        self.state.filter.previous_input()
    }
    pub fn previous_timestamp(&self) -> Timestamp {
        self.state.previous_timestamp
    }
    pub fn previous_pulse_count(&self) -> P {
        self.state.previous_pulse_count
    }
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }
    /// True once an update has been accepted since construction or the last reset.
    pub fn is_primed(&self) -> bool {
        self.state.primed
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Durations come from a u32 microsecond clock"
)]
fn secs(duration: embassy_time::Duration) -> f32 {
    duration.as_micros() as f32 / 1.0e6
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::SpeedEstimator;
    use crate::{Calibration, Clock, Timestamp};

    /// Clock that only moves when told to.
    struct ManualClock(Cell<u32>);
    impl ManualClock {
        fn at_micros(micros: u32) -> Self {
            Self(Cell::new(micros))
        }
        fn set_micros(&self, micros: u32) {
            self.0.set(micros);
        }
        fn advance_millis(&self, millis: u32) {
            self.0.set(self.0.get().wrapping_add(millis * 1000));
        }
    }
    impl Clock for ManualClock {
        fn now(&self) -> Timestamp {
            Timestamp::from_micros(self.0.get())
        }
    }

    fn assert_close(actual: f32, expected: f32) {
        let tolerance = 1e-4 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    fn unit_ratio(clock: &ManualClock) -> SpeedEstimator<&ManualClock> {
        SpeedEstimator::new(clock, 1.0, 1.0)
    }

    #[test]
    fn starts_at_rest() {
        let clock = ManualClock::at_micros(0);
        let estimator = SpeedEstimator::<_, i32>::new(&clock, 22.0, 9.3);
        assert_eq!(estimator.filtered_speed(), 0.0);
        assert_eq!(estimator.previous_velocity(), 0.0);
        assert_eq!(estimator.previous_timestamp(), Timestamp::ZERO);
        assert_eq!(estimator.previous_pulse_count(), 0);
        assert_eq!(estimator.calibration(), Calibration::new(22.0, 9.3));
        assert!(!estimator.is_primed());
    }

    #[test]
    fn twenty_two_ppr_motor_end_to_end() {
        let clock = ManualClock::at_micros(0);
        let mut estimator: SpeedEstimator<_> = SpeedEstimator::new(&clock, 22.0, 9.3);
        estimator.reset();

        // Same instant as the zero baseline.
        assert_eq!(estimator.estimate_speed(0), 0.0);
        assert!(!estimator.is_primed());

        clock.set_micros(1_000_000);
        let filtered = estimator.estimate_speed(22);
        let rpm = 60.0 / 9.3;
        assert_close(estimator.previous_velocity(), rpm);
        assert_close(filtered, 0.1367 * rpm);
        assert_eq!(estimator.filtered_speed(), filtered);
        assert!(estimator.is_primed());
    }

    #[test]
    fn pre_filter_velocity_matches_conversion() {
        let clock = ManualClock::at_micros(500_000);
        let mut estimator: SpeedEstimator<_> = SpeedEstimator::new(&clock, 374.0, 30.0);
        estimator.estimate_speed(10_000);

        clock.advance_millis(250);
        estimator.estimate_speed(10_037);
        assert_close(
            estimator.previous_velocity(),
            (37.0 / 0.25 / 374.0) * (1.0 / 30.0) * 60.0,
        );
    }

    #[test]
    fn repeated_timestamp_changes_nothing() {
        let clock = ManualClock::at_micros(10_000);
        let mut estimator = unit_ratio(&clock);
        let first = estimator.estimate_speed(5);

        let timestamp = estimator.previous_timestamp();
        let velocity = estimator.previous_velocity();
        assert_eq!(estimator.estimate_speed(500), first);
        assert_eq!(estimator.filtered_speed(), first);
        assert_eq!(estimator.previous_timestamp(), timestamp);
        assert_eq!(estimator.previous_pulse_count(), 5);
        assert_eq!(estimator.previous_velocity(), velocity);
    }

    #[test]
    fn reset_restores_initial_state() {
        let clock = ManualClock::at_micros(0);
        let mut estimator: SpeedEstimator<_> = SpeedEstimator::new(&clock, 22.0, 9.3);
        for pulses in [3, 40, 90, 71] {
            clock.advance_millis(10);
            estimator.estimate_speed(pulses);
        }
        assert!(estimator.filtered_speed() != 0.0);

        estimator.reset();
        assert_eq!(estimator.filtered_speed(), 0.0);
        assert_eq!(estimator.previous_velocity(), 0.0);
        assert_eq!(estimator.previous_timestamp(), Timestamp::ZERO);
        assert_eq!(estimator.previous_pulse_count(), 0);
        assert!(!estimator.is_primed());
        assert_eq!(estimator.calibration(), Calibration::new(22.0, 9.3));
    }

    #[test]
    fn first_update_after_reset_measures_from_time_zero() {
        let clock = ManualClock::at_micros(500_000);
        let mut estimator = unit_ratio(&clock);
        estimator.estimate_speed(10);
        // 10 pulses over half a second, 20 pulses/s, 1200 RPM
        assert_close(estimator.previous_velocity(), 1200.0);
    }

    #[test]
    fn clock_roll_over() {
        let clock = ManualClock::at_micros(u32::MAX - 5);
        let mut estimator = unit_ratio(&clock);
        estimator.estimate_speed(0);

        clock.set_micros(2);
        estimator.estimate_speed(1);
        // One pulse in 8us
        assert_close(estimator.previous_velocity(), 60.0 / 8.0e-6);
        assert_eq!(estimator.previous_timestamp(), Timestamp::from_micros(2));
    }

    #[test]
    fn pulse_counter_roll_over() {
        let clock = ManualClock::at_micros(10_000);
        let mut estimator = SpeedEstimator::<_, i16>::new(&clock, 1.0, 1.0);
        estimator.estimate_speed(i16::MAX);

        clock.advance_millis(10);
        estimator.estimate_speed(i16::MIN);
        // One pulse forward in 10ms
        assert_close(estimator.previous_velocity(), 6000.0);
    }

    #[test]
    fn pulse_counter_roll_over_backwards() {
        let clock = ManualClock::at_micros(100_000);
        let mut estimator = SpeedEstimator::<_, i16>::new(&clock, 1.0, 1.0);
        estimator.estimate_speed(-32668);

        clock.advance_millis(100);
        estimator.estimate_speed(32700);
        assert_close(estimator.previous_velocity(), -168.0 / 0.1 * 60.0);
    }

    #[test]
    fn reverse_rotation_is_negative() {
        let clock = ManualClock::at_micros(0);
        let mut estimator: SpeedEstimator<_> = SpeedEstimator::new(&clock, 22.0, 9.3);
        let mut pulses = 0;
        for _ in 0..50 {
            clock.advance_millis(10);
            pulses -= 3;
            assert!(estimator.estimate_speed(pulses) < 0.0);
            assert!(estimator.previous_velocity() < 0.0);
        }
    }

    #[test]
    fn converges_at_nominal_cadence() {
        let clock = ManualClock::at_micros(0);
        let mut estimator: SpeedEstimator<_> = SpeedEstimator::new(&clock, 22.0, 1.0);
        let mut pulses = 0;
        for _ in 0..300 {
            clock.advance_millis(10);
            pulses += 22;
            estimator.estimate_speed(pulses);
        }
        // 22 pulses every 10ms is 100 rev/s.
        assert_close(estimator.previous_velocity(), 6000.0);
        assert!((estimator.filtered_speed() - 6000.0).abs() < 6.0);
    }

    #[test]
    fn explicit_timestamp_ignores_clock() {
        let clock = ManualClock::at_micros(0);
        let mut estimator = unit_ratio(&clock);
        estimator.estimate_speed_at(Timestamp::from_micros(1_000_000), 1);
        assert_close(estimator.previous_velocity(), 60.0);
        assert_eq!(
            estimator.previous_timestamp(),
            Timestamp::from_micros(1_000_000)
        );
    }

    #[test]
    fn owned_calibration() {
        let calibration = Calibration::new(374.0, 30.0);
        let estimator: SpeedEstimator<_> =
            SpeedEstimator::with_calibration(ManualClock::at_micros(0), calibration);
        assert_eq!(estimator.calibration(), calibration);
    }
}
