//! UI-agnostic conversation state
//!
//! These types are shared by every front end (the TUI and the one-shot CLI)
//! and don't depend on any specific UI framework.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in the conversation. Fields are private so an entry can't be
/// edited after it's created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    role: ChatRole,
    text: String,
}

impl ChatEntry {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Append-only log of chat entries, in display order.
///
/// A `Conversation` is a snapshot: [`Conversation::append`] returns a new
/// version and leaves `self` untouched, so anyone holding an older snapshot
/// keeps seeing exactly what they saw. Observers compare [`version`] to
/// detect change.
///
/// [`version`]: Conversation::version
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    entries: Arc<Vec<ChatEntry>>,
    version: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn append(&self, entry: ChatEntry) -> Self {
        let mut entries = Arc::clone(&self.entries);
        // Clones the backing vec only while an older snapshot still shares it
        Arc::make_mut(&mut entries).push(entry);
        Self {
            entries,
            version: self.version + 1,
        }
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
