//! Coach backed by the Gemini `generateContent` REST endpoint.

use anyhow::{Context, Result, anyhow};
use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, error};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

use super::tip::{AiTip, DEFAULT_TEXT, TipKind, TipRequest, TipSource};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GeminiCoach {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiCoach {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key,
        }
    }

    /// Read the key from `GEMINI_API_KEY`, falling back to `API_KEY`
    pub fn from_env(model: impl Into<String>) -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.is_empty());
        Self::new(api_key, model)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(self, request: TipRequest) -> Result<AiTip> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("no Gemini API key configured"))?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .json(&request_body(&request))
            .send()
            .await
            .context("Gemini request failed")?
            .error_for_status()
            .context("Gemini returned an error status")?;

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to decode Gemini response")?;

        let text = body
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .find_map(|part| part.text)
            .ok_or_else(|| anyhow!("Gemini response had no text"))?;

        parse_tip(&text)
    }
}

impl TipSource for GeminiCoach {
    fn get_tip(&self, request: TipRequest) -> BoxFuture<'static, AiTip> {
        let coach = self.clone();
        async move {
            match coach.fetch(request).await {
                Ok(tip) => {
                    debug!("coach tip: {:?}", tip);
                    tip
                }
                Err(e) => {
                    error!("AI tip error: {e:#}");
                    AiTip::fallback()
                }
            }
        }
        .boxed()
    }
}

fn prompt(request: &TipRequest) -> String {
    format!(
        "The player is playing Snake. Current Score: {}, High Score: {}, Snake Length: {}. \
         Give a short (max 15 words) pro tip or funny commentary on their progress.",
        request.score, request.high_score, request.snake_length
    )
}

fn request_body(request: &TipRequest) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt(request) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "text": {
                        "type": "STRING",
                        "description": "A short pro tip or funny commentary."
                    },
                    "type": {
                        "type": "STRING",
                        "enum": ["strategy", "commentary", "congrats"],
                        "description": "The type of message provided."
                    }
                },
                "required": ["text", "type"],
                "propertyOrdering": ["text", "type"]
            }
        }
    })
}

/// Model output is JSON shaped like `AiTip`, but either field may be
/// missing or empty
fn parse_tip(text: &str) -> Result<AiTip> {
    #[derive(Deserialize)]
    struct RawTip {
        text: Option<String>,
        #[serde(rename = "type")]
        kind: Option<TipKind>,
    }

    let raw: RawTip = serde_json::from_str(text).context("Tip is not valid JSON")?;
    Ok(AiTip {
        text: raw
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TEXT.to_string()),
        kind: raw.kind.unwrap_or_default(),
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}
