use crate::config::{Config, mask_key};
use crate::conversation::ChatMessage;
use crate::events::GenerationMode;
use crate::llm::{GeminiGateway, Gateway, GenerationRequest};
use crate::ui::App;
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Open the landing page
pub async fn launch(config: Config) -> Result<()> {
    let gateway = GeminiGateway::new(config.clone()).context("Failed to create Gemini client")?;
    App::new(&config, Arc::new(gateway)).run().await
}

/// Stream a single answer to stdout
pub async fn ask(config: Config, prompt: &str, thinking: bool) -> Result<()> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        println!("Nothing to ask. Try: ifluxone ask \"What is a nebula?\"");
        return Ok(());
    }

    let gateway = GeminiGateway::new(config).context("Failed to create Gemini client")?;
    let request = GenerationRequest::new(vec![ChatMessage::user(prompt)], thinking);

    let mut stdout = io::stdout();
    stream_to(&gateway, request, &mut stdout).await?;
    writeln!(stdout)?;
    Ok(())
}

/// Write fragments to `out` as they arrive; returns the full reply
pub async fn stream_to<G, W>(gateway: &G, request: GenerationRequest, out: &mut W) -> Result<String>
where
    G: Gateway + ?Sized,
    W: Write,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let produce = gateway.stream_reply(request, tx);
    let consume = async {
        let mut reply = String::new();
        while let Some(fragment) = rx.recv().await {
            out.write_all(fragment.as_bytes())?;
            out.flush()?;
            reply.push_str(&fragment);
        }
        Ok::<_, io::Error>(reply)
    };

    let ((), reply) = tokio::join!(produce, consume);
    reply.context("Failed to write reply")
}

/// Print the resolved configuration
pub fn show_config(config: &Config) {
    println!("⚙️  ifluxone configuration");
    println!("{}", "=".repeat(40));
    println!("   📍 Config file: {}", config.config_path().display());
    println!("   📝 Log file:    {}", config.log_path().display());
    println!("   🌐 API base:    {}", config.api_base);
    match config.api_key() {
        Some(key) => println!("   🔑 API key:     {}", mask_key(&key)),
        None => println!("   🔑 API key:     (not set, export GEMINI_API_KEY or use --set-key)"),
    }
    for mode in [GenerationMode::Fast, GenerationMode::Thinking] {
        let profile = config.profile_for(mode);
        let budget = profile
            .thinking_budget
            .map(|b| format!("thinking budget {}", b))
            .unwrap_or_else(|| "no thinking budget".to_string());
        println!("   🤖 {:<9} {} ({})", mode.display_name(), profile.model, budget);
    }
}

/// Persist an API key to the config file
pub fn set_key(mut config: Config, key: String) -> Result<()> {
    let key = key.trim().to_string();
    if key.is_empty() {
        anyhow::bail!("API key cannot be empty");
    }

    config.set_api_key(key);
    config.save()?;
    println!("✅ API key saved to {}", config.config_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::llm::{APOLOGY, FragmentSender};
    use async_trait::async_trait;

    struct Canned(Result<Vec<&'static str>, ()>);

    #[async_trait]
    impl Gateway for Canned {
        async fn try_stream(
            &self,
            _request: &GenerationRequest,
            fragments: &FragmentSender,
        ) -> Result<(), GenerationError> {
            match &self.0 {
                Ok(pieces) => {
                    for piece in pieces {
                        let _ = fragments.send(piece.to_string());
                    }
                    Ok(())
                }
                Err(()) => Err(GenerationError::MissingApiKey),
            }
        }
    }

    #[tokio::test]
    async fn stream_to_writes_fragments_in_order() {
        let gateway = Canned(Ok(vec!["Stars ", "are ", "suns."]));
        let mut out = Vec::new();

        let reply = stream_to(&gateway, GenerationRequest::new(vec![ChatMessage::user("?")], false), &mut out)
            .await
            .unwrap();

        assert_eq!(reply, "Stars are suns.");
        assert_eq!(String::from_utf8(out).unwrap(), "Stars are suns.");
    }

    #[tokio::test]
    async fn stream_to_prints_apology_on_failure() {
        let gateway = Canned(Err(()));
        let mut out = Vec::new();

        let reply = stream_to(&gateway, GenerationRequest::new(vec![ChatMessage::user("?")], true), &mut out)
            .await
            .unwrap();

        assert_eq!(reply, APOLOGY);
    }

    #[test]
    fn set_key_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();

        set_key(config, "  abc123  ".to_string()).unwrap();

        let reloaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn set_key_rejects_blank() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert!(set_key(config, "   ".to_string()).is_err());
    }
}
