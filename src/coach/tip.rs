use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub const FALLBACK_TEXT: &str = "Focus and don't hit the walls!";
pub const DEFAULT_TEXT: &str = "Keep your head on straight!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Strategy,
    #[default]
    Commentary,
    Congrats,
}

/// A short line from the coach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiTip {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: TipKind,
}

impl AiTip {
    pub fn new(text: impl Into<String>, kind: TipKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// Shown whenever the coach cannot be reached
    pub fn fallback() -> Self {
        Self::new(FALLBACK_TEXT, TipKind::Strategy)
    }
}

/// What the coach gets to see about the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipRequest {
    pub score: u32,
    pub high_score: u32,
    pub snake_length: usize,
}

/// Asynchronous tip provider.
///
/// Implementations never fail: any error is logged and turned into
/// `AiTip::fallback()`.
pub trait TipSource: Send + Sync {
    fn get_tip(&self, request: TipRequest) -> BoxFuture<'static, AiTip>;
}
