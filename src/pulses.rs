use core::fmt::Debug;

/// A cumulative encoder pulse count of a fixed signed width.
///
/// Counters are allowed to overflow in either direction. Subtracting two readings in
/// the counter's own width recovers the signed number of pulses between them, as long
/// as fewer than half the counter's range went by between the two readings.
pub trait PulseCount: Copy + Default + PartialEq + Debug {
    /// `self - previous` with two's complement wrapping.
    fn wrapping_delta(self, previous: Self) -> Self;
    fn wrapping_increment(self) -> Self;
    fn wrapping_decrement(self) -> Self;
    fn to_f32(self) -> f32;
}

macro_rules! impl_pulse_count {
    ($($t:ty),*) => {
        $(
            impl PulseCount for $t {
                fn wrapping_delta(self, previous: Self) -> Self {
                    self.wrapping_sub(previous)
                }
                fn wrapping_increment(self) -> Self {
                    self.wrapping_add(1)
                }
                fn wrapping_decrement(self) -> Self {
                    self.wrapping_sub(1)
                }
                #[allow(
                    clippy::cast_precision_loss,
                    clippy::cast_lossless,
                    reason = "Deltas are small compared to the f32 mantissa"
                )]
                fn to_f32(self) -> f32 {
                    self as f32
                }
            }
        )*
    };
}

impl_pulse_count!(i8, i16, i32, i64);
