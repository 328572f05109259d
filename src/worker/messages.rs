//! Message protocol between the application and a worker.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Wire form: `{"type": "SKIP_WAITING"}` or `{"type": "GET_VERSION"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    SkipWaiting,
    GetVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
}

/// A delivered message. `GetVersion` carries its dedicated reply channel.
#[derive(Debug)]
pub enum WorkerMessage {
    SkipWaiting,
    GetVersion { reply: oneshot::Sender<VersionReply> },
}

impl WorkerMessage {
    /// Pairs a wire message with a reply channel where one is needed.
    pub fn from_client(message: ClientMessage) -> (Self, Option<oneshot::Receiver<VersionReply>>) {
        match message {
            ClientMessage::SkipWaiting => (WorkerMessage::SkipWaiting, None),
            ClientMessage::GetVersion => {
                let (reply, receiver) = oneshot::channel();
                (WorkerMessage::GetVersion { reply }, Some(receiver))
            }
        }
    }
}
