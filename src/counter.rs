use core::cell::Cell;

use critical_section::Mutex;

use crate::{Direction, PulseCount};

/// Pulse counter written by an encoder interrupt (or task) and sampled by the control loop.
///
/// Every access happens inside a critical section, so [`snapshot`](Self::snapshot) never
/// observes a half written count. Pass the snapshot to the estimator by value.
///```rust
/// use speed_estimator::{Direction, SharedPulseCounter};
///
/// static PULSES: SharedPulseCounter = SharedPulseCounter::new(0);
///
/// PULSES.record(Direction::Clockwise);
/// PULSES.record(Direction::Clockwise);
/// PULSES.record(Direction::CounterClockwise);
/// assert_eq!(PULSES.snapshot(), 1);
///```
pub struct SharedPulseCounter<P: PulseCount = i32> {
    count: Mutex<Cell<P>>,
}

impl<P: PulseCount> SharedPulseCounter<P> {
    pub const fn new(initial: P) -> Self {
        Self {
            count: Mutex::new(Cell::new(initial)),
        }
    }

    /// Count one encoder edge. Wraps at the width of `P`.
    pub fn record(&self, direction: Direction) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(match direction {
                Direction::Clockwise => count.get().wrapping_increment(),
                Direction::CounterClockwise => count.get().wrapping_decrement(),
            });
        });
    }

    /// Read the current count.
    pub fn snapshot(&self) -> P {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }

    pub fn reset(&self) {
        critical_section::with(|cs| self.count.borrow(cs).set(P::default()));
    }
}
