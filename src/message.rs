use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a message.
///
/// The set of roles is closed: a conversation only ever contains user input,
/// assistant output, and system instructions. Deciding the role at
/// construction time lets downstream code match exhaustively instead of
/// inspecting strings at run time.
///
/// Roles serialize as lowercase strings (`"user"`, `"assistant"`,
/// `"system"`), which is the form used in persisted state and transport
/// payloads.
///
/// # Examples
///
/// ```
/// use threadgraph::message::Role;
///
/// assert_eq!(Role::User.as_str(), "user");
/// assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input supplied by the caller.
    User,
    /// Output produced by the engine (typically a model completion).
    Assistant,
    /// Instructions framing the conversation.
    System,
}

impl Role {
    /// Stable string form, matching the serde representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in a conversation thread.
///
/// Messages are immutable once created: state evolution happens by appending
/// new messages, never by editing old ones. Empty content is permitted (it
/// can stand in for a tool-call placeholder), but the role is always one of
/// the closed [`Role`] set.
///
/// # Examples
///
/// ```
/// use threadgraph::message::{Message, Role};
///
/// let user_msg = Message::user("What's the weather like?");
/// let assistant_msg = Message::assistant("Sunny, 23 degrees.");
/// let system_msg = Message::system("You are a weather assistant.");
///
/// assert!(user_msg.has_role(Role::User));
/// assert!(!user_msg.has_role(Role::Assistant));
/// assert_eq!(assistant_msg.content, "Sunny, 23 degrees.");
/// ```
///
/// # Serialization
///
/// ```
/// use threadgraph::message::Message;
///
/// let msg = Message::user("test");
/// let json = serde_json::to_string(&msg).unwrap();
/// assert_eq!(json, r#"{"role":"user","content":"test"}"#);
/// let parsed: Message = serde_json::from_str(&json).unwrap();
/// assert_eq!(msg, parsed);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this message.
    pub role: Role,
    /// The text content of the message. May be empty.
    pub content: String,
}

impl Message {
    /// Creates a new message with the specified role and content.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Returns true if this message was authored under `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
