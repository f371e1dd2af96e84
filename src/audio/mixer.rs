//! The persistent bus every voice is mixed into.
//!
//! Signal flow per sample:
//!
//! ```text
//! Filtered ----------+
//! FilteredWithDelay -+--> lowpass --+--> master gain --> out
//!        |                  ^       |
//!        +--> delay <-------+       |
//! Master ---------------------------+
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::effects::{FeedbackDelay, Lowpass};
use super::param::Param;
use super::voice::Route;

pub const SAMPLE_RATE: u32 = 44_100;

/// Open lowpass cutoff while playing
pub const CUTOFF_OPEN_HZ: f32 = 3_000.0;
/// Muffled cutoff while the game is paused
pub const CUTOFF_PAUSED_HZ: f32 = 400.0;
const FILTER_Q: f32 = 1.0;
const DELAY_SECS: f32 = 0.375;
const DELAY_FEEDBACK: f32 = 0.3;

/// Oldest voices are dropped beyond this many
pub const MAX_VOICES: usize = 64;

/// Mixer shared between the scheduler and the output callback
pub type SharedMixer = Arc<Mutex<Mixer>>;

/// Lock the mixer, recovering from a panicked holder; audio is best-effort
pub fn lock(mixer: &SharedMixer) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct ScheduledVoice {
    start: u64,
    samples: Vec<f32>,
    cursor: usize,
    route: Route,
}

impl ScheduledVoice {
    fn is_done(&self) -> bool {
        self.cursor >= self.samples.len()
    }
}

#[derive(Debug)]
pub struct Mixer {
    sample_rate: u32,
    /// Samples rendered so far; the bus clock
    frame: u64,
    voices: VecDeque<ScheduledVoice>,
    master_gain: Param,
    cutoff: Param,
    lowpass: Lowpass,
    delay: FeedbackDelay,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frame: 0,
            voices: VecDeque::new(),
            master_gain: Param::new(1.0),
            cutoff: Param::new(CUTOFF_OPEN_HZ),
            lowpass: Lowpass::new(sample_rate, CUTOFF_OPEN_HZ, FILTER_Q),
            delay: FeedbackDelay::new(sample_rate, DELAY_SECS, DELAY_FEEDBACK),
        }
    }

    pub fn shared(sample_rate: u32) -> SharedMixer {
        Arc::new(Mutex::new(Self::new(sample_rate)))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current position of the bus clock in samples
    pub fn now(&self) -> u64 {
        self.frame
    }

    /// Number of samples covering `duration`
    pub fn frames(&self, duration: Duration) -> u64 {
        (duration.as_secs_f64() * self.sample_rate as f64).round() as u64
    }

    /// Queue a rendered voice to start at bus frame `start`.
    ///
    /// A start in the past plays immediately.
    pub fn schedule(&mut self, samples: Vec<f32>, route: Route, start: u64) {
        if samples.is_empty() {
            return;
        }
        if self.voices.len() >= MAX_VOICES {
            self.voices.pop_front();
        }
        self.voices.push_back(ScheduledVoice {
            start,
            samples,
            cursor: 0,
            route,
        });
    }

    /// Voices waiting or playing
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain.value()
    }

    pub fn set_master_gain(&mut self, target: f32, time_constant: f32) {
        self.master_gain
            .set_target(target, time_constant, self.sample_rate);
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff.value()
    }

    pub fn set_cutoff(&mut self, target: f32, time_constant: f32) {
        self.cutoff.set_target(target, time_constant, self.sample_rate);
    }

    /// Fill `out` with the next block of mono samples
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
        self.voices.retain(|voice| !voice.is_done());
    }

    fn next_sample(&mut self) -> f32 {
        let now = self.frame;
        let mut filtered = 0.0;
        let mut delay_send = 0.0;
        let mut direct = 0.0;

        for voice in self.voices.iter_mut() {
            if voice.start > now || voice.is_done() {
                continue;
            }
            let sample = voice.samples[voice.cursor];
            voice.cursor += 1;

            match voice.route {
                Route::Filtered => filtered += sample,
                Route::FilteredWithDelay => {
                    filtered += sample;
                    delay_send += sample;
                }
                Route::Master => direct += sample,
            }
        }

        let echo = self.delay.process(delay_send);
        self.lowpass.set_cutoff(self.cutoff.next_value());
        let bus = self.lowpass.process(filtered + echo);

        self.frame += 1;
        ((bus + direct) * self.master_gain.next_value()).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 1_000;

    fn render(mixer: &mut Mixer, count: usize) -> Vec<f32> {
        let mut out = vec![0.0; count];
        mixer.render(&mut out);
        out
    }

    #[test]
    fn test_silent_when_idle() {
        let mut mixer = Mixer::new(RATE);
        assert!(render(&mut mixer, 100).iter().all(|s| *s == 0.0));
        assert_eq!(mixer.now(), 100);
    }

    #[test]
    fn test_master_route_bypasses_filter() {
        let mut mixer = Mixer::new(RATE);
        mixer.schedule(vec![0.5; 10], Route::Master, 0);

        let out = render(&mut mixer, 12);
        assert_eq!(&out[..10], &[0.5; 10]);
        assert_eq!(&out[10..], &[0.0, 0.0]);
    }

    #[test]
    fn test_voice_waits_for_start_frame() {
        let mut mixer = Mixer::new(RATE);
        mixer.schedule(vec![0.25; 5], Route::Master, 20);

        let out = render(&mut mixer, 30);
        assert!(out[..20].iter().all(|s| *s == 0.0));
        assert_eq!(&out[20..25], &[0.25; 5]);
    }

    #[test]
    fn test_finished_voices_are_freed() {
        let mut mixer = Mixer::new(RATE);
        mixer.schedule(vec![0.1; 5], Route::Filtered, 0);
        mixer.schedule(vec![0.1; 50], Route::Filtered, 0);
        assert_eq!(mixer.active_voices(), 2);

        render(&mut mixer, 10);
        assert_eq!(mixer.active_voices(), 1);
        render(&mut mixer, 50);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_voice_cap_drops_oldest() {
        let mut mixer = Mixer::new(RATE);
        for i in 0..MAX_VOICES + 3 {
            mixer.schedule(vec![0.0; 10], Route::Master, i as u64);
        }
        assert_eq!(mixer.active_voices(), MAX_VOICES);
        mixer.schedule(Vec::new(), Route::Master, 0);
        assert_eq!(mixer.active_voices(), MAX_VOICES);
    }

    #[test]
    fn test_only_delay_route_echoes() {
        let delay_frames = (RATE as f32 * DELAY_SECS) as usize;
        let window = delay_frames..delay_frames + 50;

        let mut dry = Mixer::new(RATE);
        dry.schedule(vec![1.0; 5], Route::Filtered, 0);
        let dry_out = render(&mut dry, delay_frames + 100);

        let mut wet = Mixer::new(RATE);
        wet.schedule(vec![1.0; 5], Route::FilteredWithDelay, 0);
        let wet_out = render(&mut wet, delay_frames + 100);

        let energy = |s: &[f32]| s.iter().map(|x| x * x).sum::<f32>();
        assert!(energy(&wet_out[window.clone()]) > 100.0 * energy(&dry_out[window]).max(1e-9));
    }

    #[test]
    fn test_gain_and_cutoff_glide() {
        let mut mixer = Mixer::new(SAMPLE_RATE);
        mixer.set_master_gain(0.0, 0.1);
        mixer.set_cutoff(CUTOFF_PAUSED_HZ, 0.3);

        render(&mut mixer, 441);
        let gain = mixer.master_gain();
        let cutoff = mixer.cutoff();
        assert!(gain < 1.0 && gain > 0.8);
        assert!(cutoff < CUTOFF_OPEN_HZ && cutoff > CUTOFF_PAUSED_HZ);
    }

    #[test]
    fn test_frames() {
        let mixer = Mixer::new(SAMPLE_RATE);
        assert_eq!(mixer.frames(Duration::from_millis(100)), 4_410);
        assert_eq!(mixer.frames(Duration::ZERO), 0);
    }
}
