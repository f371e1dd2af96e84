//! Synth Snake - terminal Snake with a generated soundtrack
//!
//! This library provides:
//! - Core game logic, input buffering and the tick clock (game module)
//! - Procedural music and sound effects (audio module)
//! - Strategy tips from a language model (coach module)
//! - High score storage (persistence module)
//! - TUI rendering, key mapping and session timing (render, input, metrics)
//! - The interactive play loop (modes module)

pub mod audio;
pub mod coach;
pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod persistence;
pub mod render;
