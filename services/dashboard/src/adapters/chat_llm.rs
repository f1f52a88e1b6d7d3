//! services/dashboard/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the support chat panel.
//! It implements the `ChatService` port from the `core` crate against any
//! OpenAI-compatible chat-completions endpoint.

const SYSTEM_INSTRUCTIONS: &str = "You are the Flareonix Support Assistant. You help users navigate the Flareonix platform, understand startup readiness metrics, and explain how to use the evaluation tool. If someone asks for tech help, suggest Flareonix Tech & Marketing teams.";

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use flareonix_core::{
    domain::{ChatMessage, ChatRole},
    ports::{ChatService, PortError, PortResult},
};
use tracing::{debug, error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the request transcript: instructions, prior turns, then the new message.
    fn build_messages(
        message: &str,
        history: &[ChatMessage],
    ) -> PortResult<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        ));

        for turn in history {
            let request_message = match turn.role {
                ChatRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.content.clone())
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?,
                ),
                ChatRole::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(turn.content.clone())
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?,
                ),
            };
            messages.push(request_message);
        }

        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(message)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        ));
        Ok(messages)
    }
}

//=========================================================================================
// `ChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatService for OpenAiChatAdapter {
    async fn reply(&self, message: &str, history: &[ChatMessage]) -> PortResult<String> {
        debug!("Sending chat message with {} prior turns", history.len());
        let messages = Self::build_messages(message, history)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!("Chat completion failed: {}", e);
            PortError::Provider(e.to_string())
        })?;

        let reply = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| PortError::MalformedResponse("No chat reply generated".to_string()))?;

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_forwarded_between_instructions_and_new_message() {
        let history = vec![
            ChatMessage::new(ChatRole::Assistant, "Hi!"),
            ChatMessage::new(ChatRole::User, "What is a readiness score?"),
            ChatMessage::new(ChatRole::Assistant, "It is the success probability."),
        ];
        let messages = OpenAiChatAdapter::build_messages("Thanks", &history).unwrap();

        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[4], ChatCompletionRequestMessage::User(_)));
    }
}
