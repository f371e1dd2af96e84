use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::Duration;
use thiserror::Error;

use super::mixer::{SharedMixer, lock};

const BLOCK_SIZE: usize = 512;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("cannot open playback sink: {0}")]
    Play(#[from] rodio::PlayError),
}

/// Binding of the shared mixer to the default output device
pub struct AudioOutput {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl AudioOutput {
    pub fn open(mixer: SharedMixer) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.append(MixerSource::new(mixer));

        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }

    /// Resume a suspended sink; no-op while already playing
    pub fn resume(&self) {
        if self.sink.is_paused() {
            self.sink.play();
        }
    }
}

/// Endless source pulling blocks from the mixer
pub struct MixerSource {
    mixer: SharedMixer,
    sample_rate: u32,
    block: Vec<f32>,
    position: usize,
}

impl MixerSource {
    pub fn new(mixer: SharedMixer) -> Self {
        let sample_rate = lock(&mixer).sample_rate();
        Self {
            mixer,
            sample_rate,
            block: vec![0.0; BLOCK_SIZE],
            position: BLOCK_SIZE,
        }
    }
}

impl Iterator for MixerSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.position >= self.block.len() {
            lock(&self.mixer).render(&mut self.block);
            self.position = 0;
        }
        let sample = self.block[self.position];
        self.position += 1;
        Some(sample)
    }
}

impl Source for MixerSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mixer::Mixer;
    use crate::audio::voice::Route;

    #[test]
    fn test_source_pulls_blocks_from_mixer() {
        let mixer = Mixer::shared(8_000);
        lock(&mixer).schedule(vec![0.5; 3], Route::Master, 0);

        let mut source = MixerSource::new(mixer.clone());
        assert_eq!(source.sample_rate(), 8_000);
        assert_eq!(source.channels(), 1);

        let first: Vec<f32> = source.by_ref().take(4).collect();
        assert_eq!(first, vec![0.5, 0.5, 0.5, 0.0]);
        assert_eq!(lock(&mixer).now(), BLOCK_SIZE as u64);

        // Keeps producing past the first block
        assert_eq!(source.by_ref().take(BLOCK_SIZE).count(), BLOCK_SIZE);
        assert_eq!(lock(&mixer).now(), 2 * BLOCK_SIZE as u64);
    }
}
