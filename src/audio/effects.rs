//! Shared bus processors: the master lowpass and the feedback delay.

use std::f32::consts::PI;

/// Resonant lowpass (RBJ biquad, transposed direct form II)
#[derive(Debug, Clone)]
pub struct Lowpass {
    sample_rate: f32,
    q: f32,
    cutoff: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Lowpass {
    pub fn new(sample_rate: u32, cutoff: f32, q: f32) -> Self {
        let mut filter = Self {
            sample_rate: sample_rate as f32,
            q,
            cutoff: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        filter.set_cutoff(cutoff);
        filter
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Recompute coefficients; tiny changes are skipped
    pub fn set_cutoff(&mut self, cutoff: f32) {
        let cutoff = cutoff.clamp(10.0, self.sample_rate * 0.45);
        if (cutoff - self.cutoff).abs() < 0.5 {
            return;
        }
        self.cutoff = cutoff;

        let w0 = 2.0 * PI * cutoff / self.sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * self.q);
        let a0 = 1.0 + alpha;

        self.b0 = (1.0 - cos) / 2.0 / a0;
        self.b1 = (1.0 - cos) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }
}

/// Delay line whose output is scaled and fed back into its own input
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    buffer: Vec<f32>,
    position: usize,
    feedback: f32,
}

impl FeedbackDelay {
    pub fn new(sample_rate: u32, delay_secs: f32, feedback: f32) -> Self {
        let len = ((sample_rate as f32 * delay_secs) as usize).max(1);
        Self {
            buffer: vec![0.0; len],
            position: 0,
            feedback,
        }
    }

    /// Delay length in samples
    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Push one input sample; returns the scaled echo leaving the line
    pub fn process(&mut self, input: f32) -> f32 {
        let echo = self.buffer[self.position] * self.feedback;
        self.buffer[self.position] = input + echo;
        self.position = (self.position + 1) % self.buffer.len();
        echo
    }
}
