//! Command Channel Port (Driver Port)
//!
//! Delivers one framed request at a time and carries back one response.

use std::time::Duration;

use async_trait::async_trait;

use crate::application::dto::CommandResponse;
use crate::domain::shared::RequestId;

/// One fully received command document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    /// Correlation id used for the reply.
    pub id: RequestId,
    /// Raw JSON body.
    pub body: String,
}

impl InboundCommand {
    /// Create a command with a fresh correlation id.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            id: RequestId::generate(),
            body: body.into(),
        }
    }
}

/// Command channel error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The other side of the channel is gone.
    #[error("command channel disconnected")]
    Disconnected,

    /// No reply arrived in time.
    #[error("engine timeout")]
    Timeout,

    /// A frame could not be encoded or decoded.
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Port for the inbound command transport.
#[async_trait]
pub trait CommandChannelPort: Send + Sync {
    /// Wait up to `timeout` for the next command.
    ///
    /// `Ok(None)` means nothing arrived in time.
    async fn receive(&self, timeout: Duration) -> Result<Option<InboundCommand>, ChannelError>;

    /// Send the response for a previously received command.
    async fn reply(&self, id: &RequestId, response: &CommandResponse) -> Result<(), ChannelError>;
}
