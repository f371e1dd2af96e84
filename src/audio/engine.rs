use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::mixer::{self, CUTOFF_OPEN_HZ, CUTOFF_PAUSED_HZ, Mixer, SAMPLE_RATE, SharedMixer};
use super::output::AudioOutput;
use super::sequencer::{LOOKAHEAD, STEP_DURATION, Sequencer};
use super::voice::Sound;

/// Master gain glide when muting or unmuting, in seconds
const MUTE_TIME_CONSTANT: f32 = 0.1;
/// Filter glide for the paused "underwater" effect, in seconds
const PAUSE_TIME_CONSTANT: f32 = 0.3;

/// Fire-and-forget sound collaborator for the game loop.
///
/// Owns the persistent bus and the step sequencer task. The output device
/// is opened lazily on first use; if that fails the engine keeps accepting
/// calls and simply stays silent.
pub struct AudioEngine {
    mixer: SharedMixer,
    output: Option<AudioOutput>,
    device_enabled: bool,
    device_attempted: bool,
    sequencer: Option<JoinHandle<()>>,
    muted: bool,
    paused: bool,
}

impl AudioEngine {
    /// Engine that plays through the default output device
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Engine that schedules into its bus but never opens a device
    pub fn detached() -> Self {
        Self::build(false)
    }

    fn build(device_enabled: bool) -> Self {
        Self {
            mixer: Mixer::shared(SAMPLE_RATE),
            output: None,
            device_enabled,
            device_attempted: false,
            sequencer: None,
            muted: false,
            paused: false,
        }
    }

    pub fn mixer(&self) -> &SharedMixer {
        &self.mixer
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the step sequencer is running
    pub fn is_playing(&self) -> bool {
        self.sequencer
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start the background beat. Calling it while already playing does
    /// nothing. Must be called from within a tokio runtime.
    pub fn start_music(&mut self) {
        if self.is_playing() {
            return;
        }

        self.ensure_output();
        if let Some(output) = &self.output {
            output.resume();
        }

        debug!("sequencer started");
        self.sequencer = Some(tokio::spawn(run_sequencer(self.mixer.clone())));
    }

    /// Stop scheduling new steps; notes already queued ring out
    pub fn stop_music(&mut self) {
        if let Some(handle) = self.sequencer.take() {
            handle.abort();
            debug!("sequencer stopped");
        }
    }

    /// Glide the master gain to silence or back to full
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        let target = if muted { 0.0 } else { 1.0 };
        mixer::lock(&self.mixer).set_master_gain(target, MUTE_TIME_CONSTANT);
    }

    /// Muffle the bus while paused; the beat keeps running
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        let target = if paused {
            CUTOFF_PAUSED_HZ
        } else {
            CUTOFF_OPEN_HZ
        };
        mixer::lock(&self.mixer).set_cutoff(target, PAUSE_TIME_CONSTANT);
    }

    pub fn play_eat(&mut self) {
        self.play_effect(Sound::Eat);
    }

    pub fn play_crash(&mut self) {
        self.play_effect(Sound::Crash);
    }

    pub fn play_start(&mut self) {
        self.play_effect(Sound::Start);
    }

    fn play_effect(&mut self, sound: Sound) {
        self.ensure_output();

        let samples = sound.render(SAMPLE_RATE);
        let mut bus = mixer::lock(&self.mixer);
        let now = bus.now();
        bus.schedule(samples, sound.route(), now);
    }

    fn ensure_output(&mut self) {
        if !self.device_enabled || self.device_attempted {
            return;
        }
        self.device_attempted = true;

        match AudioOutput::open(self.mixer.clone()) {
            Ok(output) => {
                info!("audio output opened at {} Hz", SAMPLE_RATE);
                self.output = Some(output);
            }
            Err(e) => warn!("audio disabled: {e}"),
        }
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.stop_music();
    }
}

/// Step loop: render each step's sounds and queue them slightly ahead of
/// the bus clock
async fn run_sequencer(mixer: SharedMixer) {
    let mut ticker = interval(STEP_DURATION);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sequencer = Sequencer::new();

    loop {
        ticker.tick().await;

        let sample_rate = mixer::lock(&mixer).sample_rate();
        let voices: Vec<_> = sequencer
            .advance()
            .into_iter()
            .map(|sound| (sound.render(sample_rate), sound.route()))
            .collect();

        let mut bus = mixer::lock(&mixer);
        let at = bus.now() + bus.frames(LOOKAHEAD);
        for (samples, route) in voices {
            bus.schedule(samples, route, at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    fn render(engine: &AudioEngine, count: usize) -> Vec<f32> {
        let mut out = vec![0.0; count];
        mixer::lock(engine.mixer()).render(&mut out);
        out
    }

    fn gain(engine: &AudioEngine) -> f32 {
        mixer::lock(engine.mixer()).master_gain()
    }

    #[test]
    fn test_mute_toggle_never_steps() {
        let mut engine = AudioEngine::detached();
        let mut previous = gain(&engine);
        let mut max_jump: f32 = 0.0;

        engine.set_muted(true);
        for _ in 0..200 {
            render(&engine, 10);
            let g = gain(&engine);
            max_jump = max_jump.max((g - previous).abs());
            previous = g;
        }
        assert!(previous < 1.0 && previous > 0.0, "still ramping down");

        engine.set_muted(false);
        for _ in 0..200 {
            render(&engine, 10);
            let g = gain(&engine);
            max_jump = max_jump.max((g - previous).abs());
            previous = g;
        }

        // Ten samples at a 0.1 s time constant move the gain by < 0.3%
        assert!(max_jump < 0.003, "gain stepped by {max_jump}");
        assert!(!engine.is_muted());
    }

    #[test]
    fn test_mute_reaches_silence() {
        let mut engine = AudioEngine::detached();
        engine.set_muted(true);
        render(&engine, SAMPLE_RATE as usize);
        assert!(gain(&engine) < 0.001);
        assert!(engine.is_muted());
    }

    #[test]
    fn test_pause_muffles_instead_of_stopping() {
        let mut engine = AudioEngine::detached();
        engine.set_paused(true);
        render(&engine, SAMPLE_RATE as usize * 2);

        let cutoff = mixer::lock(engine.mixer()).cutoff();
        assert!((cutoff - CUTOFF_PAUSED_HZ).abs() < 10.0);
        assert!(engine.is_paused());

        engine.set_paused(false);
        render(&engine, SAMPLE_RATE as usize * 3);
        let cutoff = mixer::lock(engine.mixer()).cutoff();
        assert!((cutoff - CUTOFF_OPEN_HZ).abs() < 10.0);
    }

    #[test]
    fn test_effects_are_scheduled_immediately() {
        let mut engine = AudioEngine::detached();
        engine.play_eat();
        engine.play_start();
        assert_eq!(mixer::lock(engine.mixer()).active_voices(), 2);

        let out = render(&engine, 100);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let mut engine = AudioEngine::detached();
        engine.start_music();
        engine.start_music();
        assert!(engine.is_playing());

        // Steps fire at 0, 150 and 300 ms: kick+lead, hat+lead, lead
        sleep(Duration::from_millis(320)).await;
        assert_eq!(mixer::lock(engine.mixer()).active_voices(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_scheduling() {
        let mut engine = AudioEngine::detached();
        engine.start_music();
        sleep(Duration::from_millis(10)).await;
        engine.stop_music();
        assert!(!engine.is_playing());

        let queued = mixer::lock(engine.mixer()).active_voices();
        assert_eq!(queued, 2);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(mixer::lock(engine.mixer()).active_voices(), queued);

        // Already queued notes still play out
        let out = render(&engine, SAMPLE_RATE as usize / 2);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_sequencer() {
        let mut engine = AudioEngine::detached();
        engine.start_music();
        sleep(Duration::from_millis(10)).await;

        let bus = engine.mixer().clone();
        let queued = mixer::lock(&bus).active_voices();
        assert!(queued > 0);
        drop(engine);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(mixer::lock(&bus).active_voices(), queued);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let mut engine = AudioEngine::detached();
        engine.start_music();
        engine.stop_music();
        engine.start_music();
        assert!(engine.is_playing());
    }
}
