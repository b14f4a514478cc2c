//! Interactive Q&A sessions and their cache lifecycle.
//!
//! A session is the scope of a cache transaction: entries written while it is
//! open carry its id and stay pending until [`SessionRegistry::finish`] either
//! commits them (session kept) or discards them.

mod registry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use registry::SessionRegistry;

/// Leading messages (system prompt and greeting) that are never trimmed.
pub const PINNED_MESSAGES: usize = 2;

/// Conversation messages kept once the transcript grows past the cap.
pub const RECENT_MESSAGES: usize = 18;

/// Transcript length that triggers trimming.
pub const MAX_MESSAGES: usize = 22;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }
}

/// What a new session starts from.
#[derive(Debug, Clone, Default)]
pub struct SessionSeed {
    pub title: String,
    pub url: Option<String>,
    pub query: Option<String>,
    pub initial_summary: String,
    pub context_content: String,
    /// First message of the transcript.
    pub system_prompt: String,
    pub search_enabled: bool,
}

/// A saved interactive session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub initial_summary: String,
    #[serde(default)]
    pub context_content: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub search_enabled: bool,
    #[serde(default)]
    pub message_count: usize,
}

impl SessionData {
    pub(crate) fn from_seed(id: String, seed: SessionSeed, now: DateTime<Utc>) -> Self {
        let greeting = format!("I'm ready to answer questions about: {}", seed.title);
        let messages = vec![Message::new("system", seed.system_prompt), Message::new("assistant", greeting)];
        Self {
            id,
            title: seed.title,
            url: seed.url.filter(|u| !u.is_empty()),
            query: seed.query.filter(|q| !q.is_empty()),
            initial_summary: seed.initial_summary,
            context_content: seed.context_content,
            message_count: messages.len(),
            messages,
            created_at: now,
            last_accessed_at: now,
            last_modified: now,
            search_enabled: seed.search_enabled,
        }
    }

    /// Append a message, trimming the transcript once it exceeds
    /// [`MAX_MESSAGES`]: the pinned leading messages survive along with the
    /// latest [`RECENT_MESSAGES`].
    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));

        if self.messages.len() > MAX_MESSAGES {
            let cut = self.messages.len() - RECENT_MESSAGES;
            self.messages.drain(PINNED_MESSAGES..cut);
        }
    }

    /// Messages exchanged after the pinned ones.
    pub fn conversation_len(&self) -> usize {
        self.messages.len().saturating_sub(PINNED_MESSAGES)
    }

    pub fn display_title(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        if let Some(url) = &self.url {
            return format!("Web: {url}");
        }
        if let Some(query) = &self.query {
            return format!("Search: {query}");
        }
        format!("Session {}", self.id)
    }

    /// Coarse age since creation, e.g. `5m ago`.
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let age = now.signed_duration_since(self.created_at);
        if age < chrono::Duration::hours(1) {
            format!("{}m ago", age.num_minutes().max(0))
        } else if age < chrono::Duration::hours(24) {
            format!("{}h ago", age.num_hours())
        } else {
            format!("{}d ago", age.num_days())
        }
    }
}
