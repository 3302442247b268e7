use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;
use serde_json::{Value, json};

use crate::client::api_key_from_env;
use crate::config::ProfileConfig;
use crate::types::{ChatMessage, ChatRequest, ContentPart};

#[derive(Debug, Args, Clone)]
pub struct ChatArgs {
    /// Prompt text; read from stdin when omitted.
    prompt: Option<String>,
    #[arg(long, short)]
    model: Option<String>,
    #[arg(long)]
    system: Option<String>,
    #[arg(long)]
    temperature: Option<f32>,
    #[arg(long)]
    max_tokens: Option<u32>,
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    base_url: Option<String>,
    /// Attach an image (requires the `codecs` extra).
    #[arg(long)]
    image: Vec<PathBuf>,
    /// Print the reply as it is generated (requires the `streaming` extra).
    #[arg(long)]
    stream: bool,
    /// Print the request that would be sent and exit.
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let profile = super::load_profile(args.profile.as_deref())?;
    let request = build_request(&args, &profile)?;

    if args.dry_run {
        let base_url = super::resolve_base_url(args.base_url.as_deref(), &profile);
        tracing::debug!(
            api_key_present = api_key_from_env().is_some(),
            model = %request.model,
            "dry run"
        );
        println!("{}", dry_run_body(&request, &base_url)?);
        return Ok(());
    }

    let client = super::client_builder(args.base_url.as_deref(), &profile).build()?;
    tracing::debug!(base_url = client.base_url(), model = %request.model, "sending chat request");

    if args.stream {
        let streaming = client.streaming()?;
        return stream_reply(streaming, &request).await;
    }

    let completion = client.chat_with(&request).await?;
    if args.json {
        let usage = completion.usage.map(|usage| {
            json!({
                "prompt_tokens": usage.prompt_tokens,
                "completion_tokens": usage.completion_tokens,
                "total_tokens": usage.total_tokens,
            })
        });
        println!(
            "{}",
            json!({
                "id": completion.id,
                "model": completion.model,
                "content": completion.content,
                "finish_reason": completion.finish_reason,
                "usage": usage,
            })
        );
    } else {
        println!("{}", completion.content);
    }
    Ok(())
}

fn build_request(args: &ChatArgs, profile: &ProfileConfig) -> anyhow::Result<ChatRequest> {
    let model = args
        .model
        .clone()
        .or_else(|| super::env_value(super::MODEL_ENV))
        .or_else(|| profile.model.clone());
    let Some(model) = model else {
        bail!("No model provided. Use --model or set {}.", super::MODEL_ENV);
    };

    let prompt = match &args.prompt {
        Some(prompt) => prompt.clone(),
        None => read_stdin_prompt()?,
    };
    if prompt.trim().is_empty() {
        bail!("No prompt provided. Pass it as an argument or on stdin.");
    }

    let mut messages = Vec::new();
    if let Some(system) = args.system.as_ref().or(profile.system.as_ref()) {
        messages.push(ChatMessage::system(system.clone()));
    }
    messages.push(user_message(prompt, &args.image)?);

    let mut request = ChatRequest::new(model, messages);
    request.temperature = args.temperature.or(profile.temperature);
    request.max_tokens = args.max_tokens.or(profile.max_tokens);
    Ok(request)
}

fn user_message(prompt: String, images: &[PathBuf]) -> anyhow::Result<ChatMessage> {
    if images.is_empty() {
        return Ok(ChatMessage::user(prompt));
    }

    let codecs = crate::codecs()?;
    let mut parts = vec![ContentPart::Text { text: prompt }];
    for path in images {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read image '{}'", path.display()))?;
        parts.push(image_part(codecs, &bytes)?);
    }
    Ok(ChatMessage::user_parts(parts))
}

#[cfg(feature = "codecs")]
fn image_part(codecs: &crate::codecs::Codecs, bytes: &[u8]) -> anyhow::Result<ContentPart> {
    Ok(codecs.image_part(bytes)?)
}

#[cfg(not(feature = "codecs"))]
fn image_part(_codecs: &crate::codecs::Codecs, _bytes: &[u8]) -> anyhow::Result<ContentPart> {
    bail!("image attachments are not available in this build")
}

fn read_stdin_prompt() -> anyhow::Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }

    let mut prompt = String::new();
    stdin
        .read_to_string(&mut prompt)
        .context("Failed to read prompt from stdin")?;
    Ok(prompt)
}

fn dry_run_body(request: &ChatRequest, base_url: &str) -> anyhow::Result<Value> {
    let mut body = serde_json::to_value(request)?;
    if let Value::Object(map) = &mut body {
        map.insert("dry_run".to_string(), Value::Bool(true));
        map.insert("base_url".to_string(), Value::String(base_url.to_string()));
    }
    Ok(body)
}

#[cfg(feature = "streaming")]
async fn stream_reply(
    streaming: &crate::streaming::Streaming,
    request: &ChatRequest,
) -> anyhow::Result<()> {
    use std::io::Write;

    use futures_util::StreamExt;

    let mut chunks = streaming.chat(request).await?;
    let mut stdout = io::stdout();
    while let Some(chunk) = chunks.next().await {
        if let Some(delta) = chunk?.delta {
            write!(stdout, "{delta}")?;
            stdout.flush()?;
        }
    }
    writeln!(stdout)?;
    Ok(())
}

#[cfg(not(feature = "streaming"))]
async fn stream_reply(
    _streaming: &crate::streaming::Streaming,
    _request: &ChatRequest,
) -> anyhow::Result<()> {
    bail!("streaming is not available in this build")
}

#[cfg(test)]
mod tests {
    use super::dry_run_body;
    use crate::types::{ChatMessage, ChatRequest};

    #[test]
    fn dry_run_body_flags_the_request() {
        let request = ChatRequest::new("SeekGPT-mini", vec![ChatMessage::user("2+2?")]).max_tokens(8);

        let body = dry_run_body(&request, "https://api.seekgpt.org/v1").unwrap();

        assert_eq!(body["dry_run"], true);
        assert_eq!(body["base_url"], "https://api.seekgpt.org/v1");
        assert_eq!(body["model"], "SeekGPT-mini");
        assert_eq!(body["max_tokens"], 8);
        assert_eq!(body["messages"][0]["content"], "2+2?");
    }
}
