//! Wire envelope and typed chat messages
//!
//! Every frame is one JSON object of the shape
//! `{"type": ..., "user": {"name": ..., "id": ...} | null, "data": ... | null}`.
//! Fields outside that set are ignored. Decoding goes through [`Envelope`] and
//! is then narrowed to [`ClientMessage`], rejecting any kind whose required
//! field is missing.

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};
use crate::types::{Roster, User};

/// Discriminator carried in the `type` field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    UserJoined,
    UserJoinedAck,
    UserLeft,
    TextMessage,
    Error,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::UserJoined => "USER_JOINED",
            MessageType::UserJoinedAck => "USER_JOINED_ACK",
            MessageType::UserLeft => "USER_LEFT",
            MessageType::TextMessage => "TEXT_MESSAGE",
            MessageType::Error => "ERROR",
        }
    }
}

/// Untyped wire shape, one per frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<String>,
}

/// Messages a client may send
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    Join(User),
    Leave(User),
    Text { user: Option<User>, data: String },
}

impl ClientMessage {
    /// Parse and validate one inbound frame
    pub fn decode(frame: &str) -> ChatResult<Self> {
        let envelope: Envelope = serde_json::from_str(frame).map_err(ChatError::Decode)?;
        Self::try_from(envelope)
    }

    pub fn kind(&self) -> MessageType {
        match self {
            ClientMessage::Join(_) => MessageType::UserJoined,
            ClientMessage::Leave(_) => MessageType::UserLeft,
            ClientMessage::Text { .. } => MessageType::TextMessage,
        }
    }
}

impl TryFrom<Envelope> for ClientMessage {
    type Error = ChatError;

    fn try_from(envelope: Envelope) -> ChatResult<Self> {
        let kind = envelope.kind;
        match kind {
            MessageType::UserJoined => Ok(ClientMessage::Join(require_user(kind, envelope.user)?)),
            MessageType::UserLeft => Ok(ClientMessage::Leave(require_user(kind, envelope.user)?)),
            MessageType::TextMessage => {
                let data = envelope.data.ok_or(ChatError::MissingField {
                    kind: kind.as_str(),
                    field: "data",
                })?;
                Ok(ClientMessage::Text {
                    user: envelope.user,
                    data,
                })
            }
            MessageType::UserJoinedAck | MessageType::Error => {
                Err(ChatError::UnexpectedKind(kind.as_str()))
            }
        }
    }
}

fn require_user(kind: MessageType, user: Option<User>) -> ChatResult<User> {
    match user {
        Some(user) if user.has_valid_name() => Ok(user),
        _ => Err(ChatError::MissingField {
            kind: kind.as_str(),
            field: "user.name",
        }),
    }
}

/// Which way the roster just changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceChange {
    Joined,
    Left,
}

/// Messages the server emits
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    /// Unicast to the joining connection
    JoinAck(User),

    /// Broadcast after every join/leave; `roster` goes out as JSON in `data`
    Presence {
        change: PresenceChange,
        user: User,
        roster: Roster,
    },

    /// Chat text relayed as received
    Text { user: Option<User>, data: String },

    /// Unicast to a client whose frame was rejected
    Error(String),
}

impl ServerMessage {
    pub fn error(reason: impl Into<String>) -> Self {
        ServerMessage::Error(reason.into())
    }

    /// Build the wire envelope. Fails only if the roster cannot be serialized.
    pub fn to_envelope(&self) -> ChatResult<Envelope> {
        let envelope = match self {
            ServerMessage::JoinAck(user) => Envelope {
                kind: MessageType::UserJoinedAck,
                user: Some(user.clone()),
                data: None,
            },
            ServerMessage::Presence {
                change,
                user,
                roster,
            } => Envelope {
                kind: match change {
                    PresenceChange::Joined => MessageType::UserJoined,
                    PresenceChange::Left => MessageType::UserLeft,
                },
                user: Some(user.clone()),
                data: Some(serde_json::to_string(roster).map_err(ChatError::Encode)?),
            },
            ServerMessage::Text { user, data } => Envelope {
                kind: MessageType::TextMessage,
                user: user.clone(),
                data: Some(data.clone()),
            },
            ServerMessage::Error(reason) => Envelope {
                kind: MessageType::Error,
                user: None,
                data: Some(reason.clone()),
            },
        };
        Ok(envelope)
    }

    /// Serialize to one text frame
    pub fn encode(&self) -> ChatResult<String> {
        let envelope = self.to_envelope()?;
        serde_json::to_string(&envelope).map_err(ChatError::Encode)
    }
}

/// Parse the roster carried in a presence envelope's `data`
pub fn decode_roster(data: &str) -> ChatResult<Vec<User>> {
    serde_json::from_str(data).map_err(ChatError::Decode)
}
