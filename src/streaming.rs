//! The `seekgpt.streaming` namespace (extra: `streaming`).
//!
//! Chat completions delivered as server-sent events. Each `data:` line holds a
//! JSON chunk; the literal `[DONE]` ends the stream.

#![cfg_attr(not(feature = "streaming"), allow(dead_code))]

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Deserialize;

#[cfg(feature = "streaming")]
use futures_util::stream::BoxStream;

use crate::error::Error;
use crate::modules::{Namespace, STREAMING_PATH};
use crate::transport::Transport;
use crate::types::ChatChunk;

#[derive(Debug)]
pub struct Streaming {
    transport: Arc<Transport>,
}

impl Namespace for Streaming {
    const PATH: &'static str = STREAMING_PATH;
    type Deps = Arc<Transport>;

    fn materialize(transport: &Arc<Transport>) -> Self {
        Self {
            transport: Arc::clone(transport),
        }
    }
}

#[cfg(feature = "streaming")]
impl Streaming {
    /// Sends `request` with `stream: true` and yields chunks as they arrive.
    pub async fn chat(
        &self,
        request: &crate::types::ChatRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, Error>>, Error> {
        use futures_util::StreamExt;

        let mut request = request.clone();
        request.stream = true;
        let url = self.transport.url(crate::resources::COMPLETIONS_PATH);
        let response = self
            .transport
            .post(crate::resources::COMPLETIONS_PATH, &request)
            .await?;

        let body = Box::pin(response.bytes_stream());
        let state = (body, ChunkPump::default(), url);
        let chunks = futures_util::stream::unfold(state, |state| async move {
            let (mut body, mut pump, url) = state;
            loop {
                match pump.step() {
                    Step::Yield(event) => return Some((event, (body, pump, url))),
                    Step::End => return None,
                    Step::Read => match body.next().await {
                        Some(Ok(bytes)) => pump.on_read(Some(Ok(&bytes[..]))),
                        Some(Err(source)) => pump.on_read(Some(Err(Error::Request {
                            url: url.clone(),
                            source,
                        }))),
                        None => pump.on_read(None),
                    },
                }
            }
        });

        Ok(chunks.boxed())
    }
}

/// What the stream should do next.
#[derive(Debug)]
pub(crate) enum Step {
    Yield(Result<ChatChunk, Error>),
    Read,
    End,
}

/// Read-by-read state of a chunk stream, independent of the transport.
///
/// A transport error is yielded once and ends the stream. The body ending
/// without `[DONE]` decodes any unterminated line and then ends it.
#[derive(Debug, Default)]
pub(crate) struct ChunkPump {
    decoder: SseDecoder,
    ready: VecDeque<Result<ChatChunk, Error>>,
}

impl ChunkPump {
    pub(crate) fn step(&mut self) -> Step {
        if let Some(event) = self.ready.pop_front() {
            return Step::Yield(event);
        }
        if self.decoder.is_done() {
            return Step::End;
        }
        Step::Read
    }

    /// Feeds one read of the body; `None` means the body ended.
    pub(crate) fn on_read(&mut self, read: Option<Result<&[u8], Error>>) {
        match read {
            Some(Ok(bytes)) => {
                let events = self.decoder.push(bytes);
                self.ready.extend(events);
            }
            Some(Err(err)) => {
                self.decoder.finish();
                self.ready.push_back(Err(err));
            }
            None => {
                let events = self.decoder.flush();
                self.ready.extend(events);
                self.decoder.finish();
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Splits a byte stream into SSE `data:` payloads and decodes them.
///
/// Bytes are buffered until a full line arrives, so a character split across
/// reads is decoded whole.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<Result<ChatChunk, Error>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = self.decode_raw(&line[..newline]) {
                events.push(event);
            }
        }
        events
    }

    /// Decodes a trailing line left without a newline terminator.
    pub(crate) fn flush(&mut self) -> Vec<Result<ChatChunk, Error>> {
        let line = std::mem::take(&mut self.buffer);
        self.decode_raw(&line).into_iter().collect()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    pub(crate) fn finish(&mut self) {
        self.done = true;
    }

    fn decode_raw(&mut self, line: &[u8]) -> Option<Result<ChatChunk, Error>> {
        if self.done {
            return None;
        }
        match std::str::from_utf8(line) {
            Ok(line) => self.decode_line(line.trim_end_matches('\r')),
            Err(err) => Some(Err(Error::Stream(format!("invalid UTF-8 in event stream: {err}")))),
        }
    }

    fn decode_line(&mut self, line: &str) -> Option<Result<ChatChunk, Error>> {
        if self.done {
            return None;
        }
        let data = line.strip_prefix("data:")?.trim();
        if data.is_empty() {
            return None;
        }
        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        Some(
            serde_json::from_str::<ChunkPayload>(data)
                .map(into_chunk)
                .map_err(|err| Error::Stream(err.to_string())),
        )
    }
}

fn into_chunk(payload: ChunkPayload) -> ChatChunk {
    let choice = payload.choices.into_iter().next();
    let (delta, finish_reason) = match choice {
        Some(choice) => (choice.delta.content, choice.finish_reason),
        None => (None, None),
    };

    ChatChunk {
        id: payload.id,
        delta,
        finish_reason,
    }
}
