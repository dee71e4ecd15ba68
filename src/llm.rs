use crate::config::{Config, ModelProfile};
use crate::conversation::{ChatMessage, Role};
use crate::error::GenerationError;
use crate::events::GenerationMode;
use crate::streaming::SseDecoder;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::Duration;
use uuid::Uuid;

/// Fragment delivered in place of a reply when generation fails
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Sink receiving reply fragments in arrival order
pub type FragmentSender = mpsc::UnboundedSender<String>;

/// One send from the chat widget
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Full conversation up to and including the latest user turn
    pub messages: Vec<ChatMessage>,
    /// Thinking-mode flag as read at send time
    pub thinking: bool,
    /// Correlates log lines for one send
    pub id: Uuid,
}

impl GenerationRequest {
    pub fn new(messages: Vec<ChatMessage>, thinking: bool) -> Self {
        Self {
            messages,
            thinking,
            id: Uuid::new_v4(),
        }
    }

    pub fn mode(&self) -> GenerationMode {
        GenerationMode::from_thinking_flag(self.thinking)
    }

    /// The trailing user turn, if the conversation ends with one
    pub fn latest_user_message(&self) -> Option<&ChatMessage> {
        self.messages.last().filter(|message| message.role == Role::User)
    }
}

/// Streams a reply for a conversation.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Produce fragments for `request`. Errors are reported, not swallowed.
    async fn try_stream(
        &self,
        request: &GenerationRequest,
        fragments: &FragmentSender,
    ) -> Result<(), GenerationError>;

    /// Stream a reply, never failing.
    ///
    /// A request whose last turn is not from the user is rejected before any
    /// backend work. Any failure is logged and replaced by one [`APOLOGY`]
    /// fragment. `fragments` is dropped on return, which closes the stream.
    async fn stream_reply(&self, request: GenerationRequest, fragments: FragmentSender) {
        let result = if request.latest_user_message().is_none() {
            Err(GenerationError::LastMessageNotFromUser)
        } else {
            self.try_stream(&request, &fragments).await
        };

        match result {
            Ok(()) => {
                tracing::debug!(request_id = %request.id, "reply stream finished");
            }
            Err(error) => {
                tracing::error!(request_id = %request.id, %error, "error streaming reply");
                let _ = fragments.send(APOLOGY.to_string());
            }
        }
    }
}

/// Gateway backed by the Gemini `streamGenerateContent` endpoint
#[derive(Clone)]
pub struct GeminiGateway {
    config: Config,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(config: Config) -> Result<Self, GenerationError> {
        let api_key = config.api_key();
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: Config, api_key: Option<String>) -> Result<Self, GenerationError> {
        // No total timeout: thinking replies may stream for minutes
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        if api_key.is_none() {
            tracing::warn!("no Gemini API key configured; replies will fail");
        }

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Request body for the given prompt and profile
    fn build_payload(prompt: &str, profile: &ModelProfile) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }]
        });

        if let Some(budget) = profile.thinking_budget {
            payload["generationConfig"] = serde_json::json!({
                "thinkingConfig": {"thinkingBudget": budget}
            });
        }

        payload
    }

    /// Await `future`, failing if it stays silent longer than the idle bound
    async fn within_idle<F>(&self, future: F) -> Result<F::Output, GenerationError>
    where
        F: std::future::Future,
    {
        let idle = self.config.idle_timeout_secs;
        tokio::time::timeout(Duration::from_secs(idle), future)
            .await
            .map_err(|_| GenerationError::Stalled(idle))
    }

    /// Forward decoded payloads; `Ok(false)` means the receiver hung up.
    fn forward_payloads(
        payloads: Vec<String>,
        fragments: &FragmentSender,
    ) -> Result<bool, GenerationError> {
        for payload in payloads {
            if let Some(text) = parse_fragment(&payload)? {
                if fragments.send(text).is_err() {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl Gateway for GeminiGateway {
    async fn try_stream(
        &self,
        request: &GenerationRequest,
        fragments: &FragmentSender,
    ) -> Result<(), GenerationError> {
        let prompt = request
            .latest_user_message()
            .ok_or(GenerationError::LastMessageNotFromUser)?;
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        let profile = self.config.profile_for(request.mode());
        let url = format!(
            "{}/models/{}:streamGenerateContent",
            self.config.api_base.trim_end_matches('/'),
            profile.model
        );

        tracing::info!(
            request_id = %request.id,
            model = %profile.model,
            thinking_budget = ?profile.thinking_budget,
            history_len = request.messages.len(),
            "opening reply stream"
        );

        let pending = self
            .client
            .post(&url)
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&Self::build_payload(&prompt.content, &profile))
            .send();
        let response = self.within_idle(pending).await??;

        let status = response.status();
        if !status.is_success() {
            let body = self.within_idle(response.text()).await?.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = self.within_idle(stream.next()).await? {
            decoder.push_bytes(&chunk?);
            if !Self::forward_payloads(decoder.drain_payloads(), fragments)? {
                tracing::debug!(request_id = %request.id, "fragment receiver dropped");
                return Ok(());
            }
            if decoder.is_done() {
                break;
            }
        }

        Self::forward_payloads(decoder.finish(), fragments)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Extract the visible text of one streamed response chunk.
///
/// Reasoning parts are skipped; chunks without visible text yield `None`.
pub fn parse_fragment(payload: &str) -> Result<Option<String>, GenerationError> {
    let chunk: StreamChunk = serde_json::from_str(payload)?;

    if let Some(error) = chunk.error {
        return Err(GenerationError::Upstream(error.message));
    }

    let text: String = chunk
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    Ok((!text.is_empty()).then_some(text))
}
