//! The AI coach: short tips fetched in the background while playing.

pub mod gemini;
pub mod tip;

pub use gemini::GeminiCoach;
pub use tip::{AiTip, TipKind, TipRequest, TipSource};
