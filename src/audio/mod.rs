//! Procedural audio: a persistent bus (master gain, lowpass, feedback
//! delay), one-shot voices rendered per sound event and a 16-step sequencer
//! that runs on its own timer, independent of the game clock.

pub mod effects;
pub mod engine;
pub mod mixer;
pub mod output;
pub mod param;
pub mod sequencer;
pub mod voice;

pub use engine::AudioEngine;
pub use mixer::{Mixer, SharedMixer};
pub use output::AudioError;
pub use sequencer::Sequencer;
pub use voice::{Route, Sound};
