//! Core chat-model trait and request/response types.
//!
//! The workflow crate is written against [`ChatModel`] only, so any provider
//! (or an in-process scripted model in tests) can drive it.
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use llm::{ChatModel, ChatRequest, ChatResponse, Message, Result};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ChatModel for Echo {
//!     async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
//!         let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
//!         Ok(ChatResponse::new(Message::assistant(last)))
//!     }
//!
//!     fn model_name(&self) -> &str {
//!         "echo"
//!     }
//! }
//! ```

use crate::error::Result;
use crate::messages::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A request to a chat model containing messages and configuration.
///
/// ```rust
/// use llm::{ChatRequest, Message};
///
/// let request = ChatRequest::new(vec![
///     Message::system("Respond with only a float."),
///     Message::human("Evaluate this prompt: 'Explain gravity.'"),
/// ])
/// .with_temperature(0.0);
///
/// assert_eq!(request.config.temperature, Some(0.0));
/// ```
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The conversation messages to send to the model.
    pub messages: Vec<Message>,

    /// Generation parameters.
    pub config: ChatConfig,
}

impl ChatRequest {
    /// Create a new chat request with the given messages and default configuration.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Content of the system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == crate::MessageRole::System)
            .map(|m| m.text())
    }
}

/// Generation parameters. Providers ignore the ones they do not support.
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    /// Sampling temperature (0.0-2.0).
    pub temperature: Option<f32>,

    /// Maximum tokens to generate.
    pub max_tokens: Option<usize>,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

impl UsageMetadata {
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// A complete (non-streamed) model response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant message.
    pub message: Message,

    /// Token usage, when the provider reports it.
    pub usage: Option<UsageMetadata>,

    /// Provider-specific extras (model, finish_reason, ...).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChatResponse {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
            metadata: HashMap::new(),
        }
    }

    /// Completion text.
    pub fn text(&self) -> &str {
        self.message.text()
    }
}

/// Core trait for chat-based language models.
///
/// Implementations must be `Send + Sync`; share them as `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete chat response from messages.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Identifier of the model answering requests.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageRole;
    use std::sync::Arc;

    struct MockModel {
        response_text: String,
    }

    #[async_trait]
    impl ChatModel for MockModel {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
            let mut response = ChatResponse::new(Message::assistant(self.response_text.clone()));
            response.usage = Some(UsageMetadata::new(10, 5));
            Ok(response)
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_trait_object() {
        let model: Arc<dyn ChatModel> = Arc::new(MockModel {
            response_text: "Hello!".to_string(),
        });

        let request = ChatRequest::new(vec![Message::human("Hi")]);
        let response = model.chat(request).await.unwrap();

        assert_eq!(response.text(), "Hello!");
        assert_eq!(response.message.role, MessageRole::Assistant);
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_system_prompt_lookup() {
        let request = ChatRequest::new(vec![
            Message::system("Be a constructive prompt critic."),
            Message::human("Critique and suggest improvements: x"),
        ]);
        assert_eq!(request.system_prompt(), Some("Be a constructive prompt critic."));
        assert_eq!(ChatRequest::new(vec![]).system_prompt(), None);
    }
}
