//! Conversation transcript accumulated during a live voice session.
//!
//! The voice SDK reports the whole conversation so far on every message event.
//! We merge those snapshots append-only: turns are ordered by arrival, a later
//! snapshot can add turns or extend the last one, but never remove anything.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    System,
    Assistant,
    User,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Speaker,
    #[serde(default)]
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Speaker, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Only spoken turns belong in the transcript; the system prompt and tool chatter do not.
    fn is_spoken(&self) -> bool {
        matches!(self.role, Speaker::Assistant | Speaker::User) && !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
    finalized: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Merges a full-conversation snapshot. Returns how many turns were added.
    /// No-op once finalized.
    pub fn merge(&mut self, snapshot: &[ConversationTurn]) -> usize {
        if self.finalized {
            return 0;
        }

        let spoken: Vec<&ConversationTurn> = snapshot.iter().filter(|t| t.is_spoken()).collect();
        let known = self.turns.len();

        // The last known turn may still have been growing when it was captured.
        if known > 0 {
            if let (Some(last), Some(update)) = (self.turns.last_mut(), spoken.get(known - 1)) {
                if last.role == update.role
                    && update.content.len() > last.content.len()
                    && update.content.starts_with(&last.content)
                {
                    last.content = update.content.clone();
                }
            }
        }

        let added = spoken.len().saturating_sub(known);
        self.turns.extend(spoken.into_iter().skip(known).cloned());
        added
    }

    /// Freezes the transcript. Later merges are ignored.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// JSON form handed to the feedback prompt.
    pub fn to_conversation_json(&self) -> String {
        serde_json::to_string(&self.turns).unwrap_or_else(|_| "[]".to_string())
    }
}
