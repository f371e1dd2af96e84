//! The 16-step background beat.

use std::time::Duration;

use super::voice::Sound;

/// Slots in one loop of the pattern
pub const STEPS: usize = 16;
/// Wall-clock length of one step
pub const STEP_DURATION: Duration = Duration::from_millis(150);
/// How far ahead of the bus clock each step is scheduled
pub const LOOKAHEAD: Duration = Duration::from_millis(100);
/// Length of every lead note in seconds
pub const NOTE_DURATION: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    E4,
    F4,
    Gs4,
    A4,
    B4,
    C5,
    Ds5,
    E5,
}

impl Note {
    pub fn frequency(self) -> f32 {
        match self {
            Note::E4 => 329.63,
            Note::F4 => 349.23,
            Note::Gs4 => 415.30,
            Note::A4 => 440.00,
            Note::B4 => 493.88,
            Note::C5 => 523.25,
            Note::Ds5 => 622.25,
            Note::E5 => 659.25,
        }
    }
}

/// Lead line, one slot per step; `None` rests
pub const MELODY: [Option<Note>; STEPS] = [
    Some(Note::E4),
    Some(Note::F4),
    Some(Note::Gs4),
    Some(Note::A4),
    Some(Note::B4),
    Some(Note::C5),
    Some(Note::B4),
    Some(Note::A4),
    Some(Note::Gs4),
    Some(Note::F4),
    Some(Note::E4),
    None,
    Some(Note::E4),
    Some(Note::F4),
    Some(Note::Gs4),
    None,
];

/// Position in the loop
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    step: usize,
}

impl Sequencer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Step that the next `advance` will play
    pub fn step(&self) -> usize {
        self.step
    }

    /// Sounds for the current step, then move to the next one
    pub fn advance(&mut self) -> Vec<Sound> {
        let sounds = sounds_for_step(self.step);
        self.step = (self.step + 1) % STEPS;
        sounds
    }
}

/// Kick on every beat, hat on the off-steps, plus the melody note
pub fn sounds_for_step(step: usize) -> Vec<Sound> {
    let step = step % STEPS;
    let mut sounds = Vec::with_capacity(3);

    if step % 4 == 0 {
        sounds.push(Sound::Kick);
    }
    if step % 2 == 1 {
        sounds.push(Sound::Hat);
    }
    if let Some(note) = MELODY[step] {
        sounds.push(Sound::Lead {
            freq: note.frequency(),
            duration: NOTE_DURATION,
        });
    }

    sounds
}
