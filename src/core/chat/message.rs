//=========================================================================
// Chat Message Types
//=========================================================================
//
// `ChatMessage` is the immutable, appended form. `MessageDraft` is what
// callers hand to `ChatLog::add`; missing ids and timestamps are filled
// in on append.
//
//=========================================================================

//=== External Dependencies ===============================================

use chrono::{DateTime, Utc};
use uuid::Uuid;

//=== Internal Dependencies ===============================================

use super::time_ago::time_ago;

//=== ChatMessage =========================================================

/// One line of the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,

    /// Display name of the sender, `None` for system lines.
    pub from: Option<String>,

    /// Participant id of the sender.
    pub from_id: Option<String>,

    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Relative age label against `now`.
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        time_ago(self.created_at, now)
    }
}

//=== MessageDraft ========================================================

/// A message not yet appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDraft {
    pub id: Option<String>,
    pub from: Option<String>,
    pub from_id: Option<String>,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl MessageDraft {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sender(mut self, name: impl Into<String>) -> Self {
        self.from = Some(name.into());
        self
    }

    pub fn sender_id(mut self, id: impl Into<String>) -> Self {
        self.from_id = Some(id.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Fills in a UUID v4 id and the current time where absent.
    pub(crate) fn finish(self) -> ChatMessage {
        ChatMessage {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            from: self.from,
            from_id: self.from_id,
            body: self.body,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

impl From<ChatMessage> for MessageDraft {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: Some(message.id),
            from: message.from,
            from_id: message.from_id,
            body: message.body,
            created_at: Some(message.created_at),
        }
    }
}

impl From<&str> for MessageDraft {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for MessageDraft {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
