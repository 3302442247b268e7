//! The `seekgpt.resources` namespace: REST resources bound to a transport.

mod chat;
mod models;

use std::sync::Arc;

pub use chat::Chat;
#[cfg(feature = "streaming")]
pub(crate) use chat::COMPLETIONS_PATH;
pub use models::Models;

use crate::modules::{Namespace, RESOURCES_PATH};
use crate::transport::Transport;

#[derive(Debug)]
pub struct Resources {
    pub chat: Chat,
    pub models: Models,
}

impl Namespace for Resources {
    const PATH: &'static str = RESOURCES_PATH;
    type Deps = Arc<Transport>;

    fn materialize(transport: &Arc<Transport>) -> Self {
        Self {
            chat: Chat::new(Arc::clone(transport)),
            models: Models::new(Arc::clone(transport)),
        }
    }
}
