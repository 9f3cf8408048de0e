use crate::models::{PlaylistCriteria, TrackRecommendation};
use crate::prompt;
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
// Favor consistency over creativity; the output is parsed, not read.
const TEMPERATURE: f32 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("model response did not contain a JSON object")]
    NoJson,
    #[error("model response did not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Text-completion seam for the generative model. Production uses
/// [`AnthropicModel`]; tests substitute canned responses.
#[async_trait]
pub trait RecommendationModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

/// Client for the Anthropic messages API.
pub struct AnthropicModel {
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicModel {
    pub fn new(api_key: String) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { api_key, client })
    }
}

#[async_trait]
impl RecommendationModel for AnthropicModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let request = MessageRequest {
            model: ANTHROPIC_MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, body });
        }

        let message: MessageResponse = response.json().await?;
        Ok(message
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[derive(Debug, Deserialize)]
struct TrackListResponse {
    tracks: Vec<TrackRecommendation>,
}

/// Obtains track candidates for a set of criteria from the model.
pub struct RecommendationRequester {
    model: Arc<dyn RecommendationModel>,
}

impl RecommendationRequester {
    pub fn new(model: Arc<dyn RecommendationModel>) -> Self {
        Self { model }
    }

    /// Builds the instruction, calls the model, and parses the candidate
    /// list. Any transport or parse failure is a hard error; an empty list
    /// is only returned when the model legitimately proposes zero tracks.
    pub async fn generate(
        &self,
        criteria: &PlaylistCriteria,
    ) -> Result<Vec<TrackRecommendation>, GenerationError> {
        let instruction = prompt::build_instruction(criteria);
        debug!("model instruction: {}", instruction);

        let text = self.model.complete(prompt::SYSTEM_PROMPT, &instruction).await?;
        let tracks = parse_track_list(&text)?;
        info!("model proposed {} candidate tracks", tracks.len());
        Ok(tracks)
    }
}

/// Parses the model output into a candidate list.
///
/// Tries the whole response as JSON first, then falls back to the first
/// balanced object substring so code fences and surrounding prose do not
/// break parsing.
pub(crate) fn parse_track_list(text: &str) -> Result<Vec<TrackRecommendation>, GenerationError> {
    let response = match serde_json::from_str::<TrackListResponse>(text.trim()) {
        Ok(response) => response,
        Err(_) => {
            let object = extract_json_object(text).ok_or(GenerationError::NoJson)?;
            serde_json::from_str::<TrackListResponse>(object)?
        }
    };
    Ok(response.tracks)
}

/// Returns the first balanced `{...}` substring, tracking string literals
/// and escapes so braces inside titles do not unbalance the scan.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes().iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=offset]);
                }
            }
            _ => {}
        }
    }
    None
}
