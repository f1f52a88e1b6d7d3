//! crates/flareonix_core/src/chat.rs
//!
//! In-memory transcript of the support chat panel.

use crate::domain::{ChatMessage, ChatRole};

pub const GREETING: &str = "Hi! I’m your Flareonix assistant. Need help evaluating an idea or want to know about our tech team?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChatRejection {
    #[error("the message is empty")]
    EmptyMessage,
    #[error("a reply is already pending")]
    Busy,
}

/// The chat history plus the "one request in flight" guard.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(ChatRole::Assistant, GREETING)],
            pending: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Marks a request as in flight and returns the history to send with it.
    pub fn begin(&mut self, message: &str) -> Result<Vec<ChatMessage>, ChatRejection> {
        if message.trim().is_empty() {
            return Err(ChatRejection::EmptyMessage);
        }
        if self.pending {
            return Err(ChatRejection::Busy);
        }
        self.pending = true;
        Ok(self.messages.clone())
    }

    /// Records a successful exchange and returns the assistant's message.
    pub fn finish(&mut self, message: &str, reply: String) -> ChatMessage {
        self.pending = false;
        self.messages.push(ChatMessage::new(ChatRole::User, message));
        let answer = ChatMessage::new(ChatRole::Assistant, reply);
        self.messages.push(answer.clone());
        answer
    }

    /// Releases the guard after a failed request; the transcript stays as it was.
    pub fn abort(&mut self) {
        self.pending = false;
    }
}
