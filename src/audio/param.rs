/// A control value that glides toward its target one sample at a time.
///
/// Targets are approached exponentially with a fixed time constant, the
/// way a one-pole smoother does, so a change of target never produces a
/// discontinuity in the rendered signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    value: f32,
    target: f32,
    /// Fraction of the remaining distance covered per sample
    coeff: f32,
}

impl Param {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            target: value,
            coeff: 1.0,
        }
    }

    /// Start gliding toward `target`; after `time_constant` seconds about
    /// 63% of the distance has been covered.
    pub fn set_target(&mut self, target: f32, time_constant: f32, sample_rate: u32) {
        self.target = target;
        self.coeff = if time_constant <= 0.0 || sample_rate == 0 {
            1.0
        } else {
            1.0 - (-1.0 / (time_constant * sample_rate as f32)).exp()
        };
    }

    /// Current value
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Advance by one sample and return the new value
    pub fn next_value(&mut self) -> f32 {
        let remaining = self.target - self.value;
        if remaining.abs() < 1e-6 {
            self.value = self.target;
        } else {
            self.value += remaining * self.coeff;
        }
        self.value
    }
}
