use std::sync::Arc;

use crate::error::Error;
use crate::transport::Transport;
use crate::types::ModelList;

/// `GET /models`.
#[derive(Debug, Clone)]
pub struct Models {
    transport: Arc<Transport>,
}

impl Models {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> Result<ModelList, Error> {
        let url = self.transport.url("models");
        let response = self.transport.get("models").await?;

        response
            .json()
            .await
            .map_err(|source| Error::Request { url, source })
    }
}
