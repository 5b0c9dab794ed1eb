//! Remote LLM provider implementations.
//!
//! Cloud-hosted chat-completion APIs. These providers require an API key.
//!
//! # Providers
//!
//! - **Groq** - OpenAI-compatible API serving Llama 3.1 and other open models

pub mod groq;

pub use groq::{GroqClient, GROQ_BASE_URL};
