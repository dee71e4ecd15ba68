use thiserror::Error;

/// Anything that goes wrong while producing a reply.
///
/// Callers of [`crate::llm::Gateway::stream_reply`] never see this type; it is
/// logged and replaced by the apology fragment at the gateway boundary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No API key configured (set GEMINI_API_KEY or run `ifluxone config --set-key`)")]
    MissingApiKey,

    #[error("Last message must be from the user")]
    LastMessageNotFromUser,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Reply stalled: nothing received for {0} s")]
    Stalled(u64),

    #[error("Upstream error: {0}")]
    Upstream(String),
}
