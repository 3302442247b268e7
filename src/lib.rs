//! Client for the SeekGPT chat-completions API.
//!
//! The client itself is small; everything past it is loaded lazily. The REST
//! resources, the `streaming` extra and the `codecs` extra are namespaces held
//! behind [`proxy::LazyProxy`] values and are only built on first use. Extras are
//! cargo features: asking for a namespace whose feature is not compiled in
//! yields an [`extras::MissingDependencyError`] naming the feature to enable.
//!
//! ```no_run
//! # async fn demo() -> Result<(), seekgpt::Error> {
//! use seekgpt::{ChatMessage, SeekGpt};
//!
//! let client = SeekGpt::builder().default_model("SeekGPT-mini").build()?;
//! let reply = client
//!     .chat(vec![ChatMessage::user("What is the capital of France?")])
//!     .await?;
//! println!("{}", reply.content);
//!
//! for model in client.models()?.list().await?.data {
//!     println!("- {}", model.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codecs;
pub mod commands;
pub mod config;
pub mod error;
pub mod extras;
pub mod modules;
pub mod proxy;
pub mod resources;
pub mod streaming;
pub mod transport;
pub mod types;

pub use client::{ClientBuilder, FailurePolicy, SeekGpt};
pub use error::{Error, LoadError, Result};
pub use extras::{MissingDependencyError, format_instructions};
pub use types::{ChatCompletion, ChatMessage, ChatRequest, ContentPart, ModelList, Role};

/// The process-wide codecs namespace; fails unless built with the `codecs` extra.
pub fn codecs() -> Result<&'static codecs::Codecs> {
    Ok(codecs::CODECS.resolve()?)
}
