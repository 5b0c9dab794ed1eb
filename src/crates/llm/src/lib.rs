//! Chat model abstraction and hosted provider clients for promptcraft.
//!
//! This crate defines the provider-agnostic [`ChatModel`] trait together with
//! the message, request and response types that flow through it, and ships
//! concrete clients for hosted chat-completion APIs.
//!
//! # Remote Providers
//!
//! - **Groq** - OpenAI-compatible chat completions (Llama 3.1 and friends)
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use llm::remote::GroqClient;
//! use llm::{ChatModel, ChatRequest, Message, RemoteLlmConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::from_env(
//!         "GROQ_API_KEY",
//!         "https://api.groq.com/openai/v1",
//!         "llama-3.1-8b-instant",
//!     )?;
//!     let client = GroqClient::new(config)?;
//!
//!     let request = ChatRequest::new(vec![
//!         Message::system("You are an expert prompt engineer."),
//!         Message::human("Create a prompt that explains gravity to a child"),
//!     ])
//!     .with_temperature(0.0);
//!
//!     let response = client.chat(request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```
//!
//! # Retries
//!
//! Hosted APIs fail transiently (rate limits, 5xx, dropped connections).
//! [`retry::with_retry`] wraps a call in a bounded [`RetryPolicy`] and only
//! retries errors that [`LlmError::is_retryable`] classifies as transient.

pub mod chat;
pub mod config;
pub mod error;
pub mod messages;
pub mod retry;

#[cfg(feature = "remote")]
pub mod remote;

// Re-export commonly used types
pub use chat::{ChatConfig, ChatModel, ChatRequest, ChatResponse, UsageMetadata};
pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use messages::{Message, MessageRole};
pub use retry::{with_retry, RetryPolicy};
