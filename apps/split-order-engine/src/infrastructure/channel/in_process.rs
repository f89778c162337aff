//! In-process command channel.
//!
//! [`CommandBridge`] is the sending half used by transports such as the HTTP
//! bridge; [`InProcessCommandChannel`] is the receiving half polled by the
//! engine. Each command travels as one complete JSON frame and is answered
//! on its own oneshot.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, mpsc, oneshot};

use crate::application::dto::{CommandEnvelope, CommandResponse};
use crate::application::ports::{ChannelError, CommandChannelPort, InboundCommand};
use crate::domain::shared::RequestId;

#[derive(Debug)]
struct PendingCommand {
    command: InboundCommand,
    reply: oneshot::Sender<String>,
}

/// Create a connected bridge/channel pair.
#[must_use]
pub fn command_channel(
    capacity: usize,
    timeout: Duration,
) -> (CommandBridge, InProcessCommandChannel) {
    let (sender, inbox) = mpsc::channel(capacity);
    (
        CommandBridge { sender, timeout },
        InProcessCommandChannel {
            inbox: AsyncMutex::new(inbox),
            awaiting_reply: parking_lot::Mutex::new(HashMap::new()),
        },
    )
}

/// Sending half: submits a frame and waits for the reply frame.
#[derive(Debug, Clone)]
pub struct CommandBridge {
    sender: mpsc::Sender<PendingCommand>,
    timeout: Duration,
}

impl CommandBridge {
    /// Send a command document and wait for its response.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the envelope cannot be encoded
    /// - `Disconnected` if the engine is gone
    /// - `Timeout` if no reply arrives in time
    pub async fn send(&self, envelope: &CommandEnvelope) -> Result<String, ChannelError> {
        let body =
            serde_json::to_string(envelope).map_err(|e| ChannelError::Malformed(e.to_string()))?;
        self.send_raw(body).await
    }

    /// Send a raw frame and wait for its response.
    ///
    /// # Errors
    ///
    /// Same as [`CommandBridge::send`], minus encoding.
    pub async fn send_raw(&self, body: impl Into<String>) -> Result<String, ChannelError> {
        let (reply, response) = oneshot::channel();
        let command = InboundCommand::new(body);
        tracing::debug!(request_id = %command.id, "Command queued");

        self.sender
            .send(PendingCommand { command, reply })
            .await
            .map_err(|_| ChannelError::Disconnected)?;

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(_)) => Err(ChannelError::Disconnected),
            Err(_) => Err(ChannelError::Timeout),
        }
    }
}

/// Receiving half polled by the engine.
#[derive(Debug)]
pub struct InProcessCommandChannel {
    inbox: AsyncMutex<mpsc::Receiver<PendingCommand>>,
    awaiting_reply: parking_lot::Mutex<HashMap<RequestId, oneshot::Sender<String>>>,
}

#[async_trait]
impl CommandChannelPort for InProcessCommandChannel {
    async fn receive(&self, timeout: Duration) -> Result<Option<InboundCommand>, ChannelError> {
        let mut inbox = self.inbox.lock().await;
        match tokio::time::timeout(timeout, inbox.recv()).await {
            Err(_) => Ok(None),
            Ok(None) => Err(ChannelError::Disconnected),
            Ok(Some(PendingCommand { command, reply })) => {
                self.awaiting_reply.lock().insert(command.id.clone(), reply);
                Ok(Some(command))
            }
        }
    }

    async fn reply(&self, id: &RequestId, response: &CommandResponse) -> Result<(), ChannelError> {
        let body =
            serde_json::to_string(response).map_err(|e| ChannelError::Malformed(e.to_string()))?;
        let reply = self
            .awaiting_reply
            .lock()
            .remove(id)
            .ok_or(ChannelError::Disconnected)?;
        // The sender may have timed out already.
        reply.send(body).map_err(|_| ChannelError::Disconnected)
    }
}
