/// Encoder and gearbox constants used to turn pulse rates into output shaft RPM.
///
/// Neither value is validated. Both must be nonzero: each update divides by them, and a
/// zero turns the estimate into `inf`/`NaN` with no other sign of trouble.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Encoder pulses per revolution of the measured shaft.
    pub pulses_per_revolution: f32,
    /// Reduction between the measured shaft and the output shaft.
    pub gear_ratio: f32,
}

impl Calibration {
    pub const fn new(pulses_per_revolution: f32, gear_ratio: f32) -> Self {
        Self {
            pulses_per_revolution,
            gear_ratio,
        }
    }

    /// Convert an encoder pulse rate into revolutions per minute of the output shaft.
    pub fn rpm(&self, pulses_per_second: f32) -> f32 {
        (pulses_per_second / self.pulses_per_revolution) * (1.0 / self.gear_ratio) * 60.0
    }
}
