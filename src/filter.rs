/// First order low pass (Butterworth style IIR) filter with fixed coefficients.
///
/// ```text
/// y[n] = 0.7265 * y[n-1] + 0.1367 * x[n] + 0.1367 * x[n-1]
/// ```
///
/// The coefficients were derived for a 10ms sample interval and are not adjusted for
/// the actual time between samples. Feeding it at a very different or irregular rate
/// shifts its cutoff frequency.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LowPassFilter {
    output: f32,
    previous_input: f32,
}

impl LowPassFilter {
    /// Weight of the previous output.
    pub const FEEDBACK: f32 = 0.7265;
    /// Weight of the current and of the previous input.
    pub const FEEDFORWARD: f32 = 0.1367;
    /// The sample interval the coefficients were tuned for.
    pub const NOMINAL_INTERVAL_MS: u64 = 10;

    pub const fn new() -> Self {
        Self {
            output: 0.0,
            previous_input: 0.0,
        }
    }

    /// Push the next input sample and return the new output.
    pub fn update(&mut self, input: f32) -> f32 {
        let output = Self::FEEDBACK * self.output
            + Self::FEEDFORWARD * input
            + Self::FEEDFORWARD * self.previous_input;
        *self = LowPassFilter {
            output,
            previous_input: input,
        };
        output
    }

    /// Latest filter output.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Unfiltered input from the latest update.
    pub fn previous_input(&self) -> f32 {
        self.previous_input
    }
}
