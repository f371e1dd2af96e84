//! One-shot synthesized sounds.
//!
//! Every sound is built as its own small fundsp graph, rendered to a
//! bounded buffer and then handed to the mixer, which drops it once it has
//! played out. Nothing here is wired persistently.

use fundsp::hacker32 as dsp;

/// Where a voice enters the shared bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Through the shared lowpass
    Filtered,
    /// Through the lowpass and into the feedback delay
    FilteredWithDelay,
    /// Straight into the master gain
    Master,
}

/// Everything the game can play
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sound {
    /// Low sine pulse sweeping down
    Kick,
    /// Short highpassed noise burst
    Hat,
    /// FM lead note at `freq` Hz lasting `duration` seconds
    Lead { freq: f32, duration: f32 },
    Eat,
    Crash,
    Start,
}

const KICK_DURATION: f32 = 0.4;
const HAT_DURATION: f32 = 0.05;
const EAT_DURATION: f32 = 0.1;
const CRASH_DURATION: f32 = 0.8;
const START_DURATION: f32 = 0.5;

const LEAD_PEAK: f32 = 0.12;
const LEAD_ATTACK: f32 = 0.02;
const MOD_RATIO: f32 = 2.0;
const MOD_DEPTH: f32 = 500.0;
const VIBRATO_HZ: f32 = 6.0;
const VIBRATO_DEPTH: f32 = 5.0;

impl Sound {
    pub fn route(&self) -> Route {
        match self {
            Sound::Kick | Sound::Hat => Route::Filtered,
            Sound::Lead { .. } => Route::FilteredWithDelay,
            Sound::Eat | Sound::Crash | Sound::Start => Route::Master,
        }
    }

    /// Length of the rendered buffer in seconds
    pub fn duration(&self) -> f32 {
        match self {
            Sound::Kick => KICK_DURATION,
            Sound::Hat => HAT_DURATION,
            Sound::Lead { duration, .. } => *duration,
            Sound::Eat => EAT_DURATION,
            Sound::Crash => CRASH_DURATION,
            Sound::Start => START_DURATION,
        }
    }

    /// Synthesize the sound into a mono buffer
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        match *self {
            Sound::Kick => generate_kick_samples(sample_rate),
            Sound::Hat => generate_hat_samples(sample_rate),
            Sound::Lead { freq, duration } => generate_lead_samples(sample_rate, freq, duration),
            Sound::Eat => generate_eat_samples(sample_rate),
            Sound::Crash => generate_crash_samples(sample_rate),
            Sound::Start => generate_start_samples(sample_rate),
        }
    }
}

fn generate_kick_samples(sample_rate: u32) -> Vec<f32> {
    let d = KICK_DURATION;
    let mut node = (dsp::lfo(move |t: f32| dsp::xerp(150.0, 0.01, (t / d).min(1.0))) >> dsp::sine())
        * dsp::lfo(move |t: f32| dsp::xerp(0.5, 0.001, (t / d).min(1.0)));
    render_mono(&mut node, sample_rate, d)
}

fn generate_hat_samples(sample_rate: u32) -> Vec<f32> {
    let d = HAT_DURATION;
    let mut node = (dsp::noise() >> dsp::highpass_hz(7_000.0, 0.7))
        * dsp::lfo(move |t: f32| dsp::xerp(0.1, 0.001, (t / d).min(1.0)));
    render_mono(&mut node, sample_rate, d)
}

/// Square carrier whose frequency is pushed around by a modulator at twice
/// the note and a slow vibrato
fn generate_lead_samples(sample_rate: u32, freq: f32, duration: f32) -> Vec<f32> {
    let release = (duration - LEAD_ATTACK).max(f32::EPSILON);
    let frequency = (dsp::sine_hz(freq * MOD_RATIO) >> dsp::mul(MOD_DEPTH))
        + (dsp::sine_hz(VIBRATO_HZ) >> dsp::mul(VIBRATO_DEPTH))
        + dsp::dc(freq);
    // A deep modulator swings the frequency below zero; fold it back
    let mut node = (frequency >> dsp::shape_fn(|f: f32| f.abs()) >> dsp::square())
        * dsp::lfo(move |t: f32| {
            if t < LEAD_ATTACK {
                dsp::lerp(0.0, LEAD_PEAK, t / LEAD_ATTACK)
            } else {
                dsp::xerp(LEAD_PEAK, 0.001, ((t - LEAD_ATTACK) / release).min(1.0))
            }
        });
    render_mono(&mut node, sample_rate, duration)
}

fn generate_eat_samples(sample_rate: u32) -> Vec<f32> {
    let d = EAT_DURATION;
    let mut node = (dsp::lfo(move |t: f32| dsp::xerp(1_000.0, 2_000.0, (t / d).min(1.0))) >> dsp::sine())
        * dsp::lfo(move |t: f32| dsp::xerp(0.1, 0.001, (t / d).min(1.0)));
    render_mono(&mut node, sample_rate, d)
}

fn generate_crash_samples(sample_rate: u32) -> Vec<f32> {
    let d = CRASH_DURATION;
    let mut node = (dsp::lfo(move |t: f32| dsp::lerp(200.0, 40.0, (t / d).min(1.0))) >> dsp::saw())
        * dsp::lfo(move |t: f32| dsp::lerp(0.2, 0.001, (t / d).min(1.0)));
    render_mono(&mut node, sample_rate, d)
}

fn generate_start_samples(sample_rate: u32) -> Vec<f32> {
    let d = START_DURATION;
    let mut node = (dsp::lfo(move |t: f32| dsp::xerp(220.0, 880.0, (t / d).min(1.0))) >> dsp::triangle())
        * dsp::lfo(move |t: f32| dsp::xerp(0.15, 0.01, (t / d).min(1.0)));
    render_mono(&mut node, sample_rate, d)
}

fn render_mono(node: &mut dyn dsp::AudioUnit, sample_rate: u32, duration: f32) -> Vec<f32> {
    node.set_sample_rate(sample_rate as f64);
    node.reset();

    let sample_count = (sample_rate as f32 * duration) as usize;
    let mut samples = Vec::with_capacity(sample_count);
    for _ in 0..sample_count {
        samples.push(node.get_mono());
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44_100;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_routes() {
        assert_eq!(Sound::Kick.route(), Route::Filtered);
        assert_eq!(Sound::Hat.route(), Route::Filtered);
        assert_eq!(
            Sound::Lead {
                freq: 440.0,
                duration: 0.4
            }
            .route(),
            Route::FilteredWithDelay
        );
        assert_eq!(Sound::Eat.route(), Route::Master);
        assert_eq!(Sound::Crash.route(), Route::Master);
        assert_eq!(Sound::Start.route(), Route::Master);
    }

    #[test]
    fn test_buffers_are_time_bounded() {
        let sounds = [
            Sound::Kick,
            Sound::Hat,
            Sound::Lead {
                freq: 329.63,
                duration: 0.4,
            },
            Sound::Eat,
            Sound::Crash,
            Sound::Start,
        ];

        for sound in sounds {
            let samples = sound.render(RATE);
            let expected = (RATE as f32 * sound.duration()) as usize;
            assert_eq!(samples.len(), expected, "{:?}", sound);
            assert!(samples.iter().all(|s| s.is_finite()), "{:?}", sound);
            assert!(peak(&samples) > 0.0, "{:?} is silent", sound);
            assert!(peak(&samples) <= 1.0, "{:?} clips", sound);
        }
    }

    #[test]
    fn test_envelopes_decay() {
        for sound in [Sound::Kick, Sound::Eat, Sound::Crash] {
            let samples = sound.render(RATE);
            let head = peak(&samples[..samples.len() / 8]);
            let tail = peak(&samples[samples.len() * 7 / 8..]);
            assert!(tail < head, "{:?} does not decay", sound);
        }
    }

    #[test]
    fn test_lead_attack_starts_quiet() {
        let samples = Sound::Lead {
            freq: 440.0,
            duration: 0.4,
        }
        .render(RATE);

        // First millisecond is still near the bottom of the 20 ms attack
        assert!(peak(&samples[..44]) < 0.02);
        assert!(peak(&samples) <= LEAD_PEAK * 1.25);
    }
}
