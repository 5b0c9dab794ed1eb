//! Groq client implementation.
//!
//! Groq serves open-weight models (Llama 3.1, Mixtral, Gemma) behind an
//! OpenAI-compatible chat-completions API, so this client also works against
//! any endpoint that speaks the same format.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::GroqClient;
//! use llm::{ChatModel, ChatRequest, Message, RemoteLlmConfig};
//!
//! let config = RemoteLlmConfig::from_env(
//!     "GROQ_API_KEY",
//!     "https://api.groq.com/openai/v1",
//!     "llama-3.1-8b-instant"
//! )?;
//! let client = GroqClient::new(config)?;
//!
//! let request = ChatRequest::new(vec![Message::human("Hello!")]);
//! let response = client.chat(request).await?;
//! ```

use crate::chat::{ChatModel, ChatRequest, ChatResponse, UsageMetadata};
use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::messages::Message;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Default Groq API base URL.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq API client.
#[derive(Clone)]
pub struct GroqClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl GroqClient {
    /// Create a new Groq client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::ApiKeyNotFound("empty API key".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RemoteLlmConfig {
        &self.config
    }

    /// Convert a message to the OpenAI-compatible wire format.
    fn convert_message(&self, msg: &Message) -> GroqMessage {
        GroqMessage {
            role: msg.role.as_wire().to_string(),
            content: msg.content.clone(),
        }
    }

    fn build_request(&self, request: &ChatRequest) -> GroqRequest {
        GroqRequest {
            model: self.config.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| self.convert_message(m))
                .collect(),
            temperature: request.config.temperature,
            max_tokens: request.config.max_tokens,
            stream: false,
        }
    }

    /// Convert a Groq response to ChatResponse.
    fn convert_response(&self, groq_resp: GroqResponse) -> Result<ChatResponse> {
        let choice = groq_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

        let usage = groq_resp
            .usage
            .as_ref()
            .map(|u| UsageMetadata::new(u.prompt_tokens, u.completion_tokens));

        let mut metadata = HashMap::new();
        metadata.insert(
            "model".to_string(),
            serde_json::Value::String(groq_resp.model),
        );
        metadata.insert(
            "finish_reason".to_string(),
            serde_json::Value::String(choice.finish_reason.unwrap_or_default()),
        );

        Ok(ChatResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            usage,
            metadata,
        })
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = self.config.chat_completions_url();
        let req_body = self.build_request(&request);

        debug!(
            model = %self.config.model,
            messages = req_body.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&req_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(e.to_string())
                } else {
                    LlmError::HttpError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status("Groq", status, error_text));
        }

        let body = response.text().await.map_err(LlmError::HttpError)?;
        let groq_resp = parse_response(&body)?;

        let chat_response = self.convert_response(groq_resp)?;
        if let Some(usage) = chat_response.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Chat completion received"
            );
        }
        Ok(chat_response)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Decode a completion body. Malformed JSON is an invalid response, not a
/// transport failure, so it is never retried.
fn parse_response(body: &str) -> Result<GroqResponse> {
    serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))
}

// Groq API types (OpenAI-compatible)
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    model: String,
    choices: Vec<GroqChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}
