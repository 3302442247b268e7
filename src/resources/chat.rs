use std::sync::Arc;

use serde::Deserialize;

use crate::error::Error;
use crate::transport::Transport;
use crate::types::{ChatCompletion, ChatRequest, Usage};

pub(crate) const COMPLETIONS_PATH: &str = "chat/completions";

#[derive(Debug, Deserialize)]
struct CompletionPayload {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// `POST /chat/completions`.
#[derive(Debug, Clone)]
pub struct Chat {
    transport: Arc<Transport>,
}

impl Chat {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn create(&self, request: &ChatRequest) -> Result<ChatCompletion, Error> {
        let url = self.transport.url(COMPLETIONS_PATH);
        let response = self.transport.post(COMPLETIONS_PATH, request).await?;
        let payload: CompletionPayload = response
            .json()
            .await
            .map_err(|source| Error::Request { url, source })?;

        into_completion(payload)
    }
}

fn into_completion(payload: CompletionPayload) -> Result<ChatCompletion, Error> {
    let CompletionPayload {
        id,
        model,
        choices,
        usage,
    } = payload;
    let choice = choices.into_iter().next().ok_or(Error::EmptyResponse)?;
    let content = choice
        .message
        .content
        .filter(|content| !content.is_empty())
        .ok_or(Error::EmptyResponse)?;

    Ok(ChatCompletion {
        id,
        model,
        content,
        finish_reason: choice.finish_reason,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CompletionPayload, into_completion};
    use crate::error::Error;

    fn payload(value: serde_json::Value) -> CompletionPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn first_choice_becomes_the_completion() {
        let completion = into_completion(payload(json!({
            "id": "chatcmpl-1",
            "model": "SeekGPT-mini",
            "choices": [
                {"message": {"role": "assistant", "content": "Paris"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "Lyon"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 1, "total_tokens": 13}
        })))
        .unwrap();

        assert_eq!(completion.content, "Paris");
        assert_eq!(completion.id.as_deref(), Some("chatcmpl-1"));
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
        assert_eq!(completion.usage.and_then(|usage| usage.total_tokens), Some(13));
    }

    #[test]
    fn missing_or_empty_content_is_an_empty_response() {
        let no_choices = into_completion(payload(json!({"choices": []})));
        let empty = into_completion(payload(json!({
            "choices": [{"message": {"content": ""}, "finish_reason": null}]
        })));

        assert!(matches!(no_choices, Err(Error::EmptyResponse)));
        assert!(matches!(empty, Err(Error::EmptyResponse)));
    }
}
