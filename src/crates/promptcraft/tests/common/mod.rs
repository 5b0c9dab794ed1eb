//! Common test utilities: a scripted in-process chat model

use async_trait::async_trait;
use llm::{ChatModel, ChatRequest, ChatResponse, LlmError, Message};
use promptcraft::nodes::system_prompts;
use promptcraft::{PromptCraftConfig, PromptWorkflow};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    AuthError,
    Unavailable,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }

    fn into_result(self) -> llm::Result<ChatResponse> {
        match self {
            Reply::Text(text) => Ok(ChatResponse::new(Message::assistant(text))),
            Reply::AuthError => Err(LlmError::AuthenticationError("invalid api key".into())),
            Reply::Unavailable => Err(LlmError::ServiceUnavailable(
                "Groq API error 503: upstream overloaded".into(),
            )),
        }
    }
}

/// Answers by system prompt. Each system prompt has a queue of replies; the
/// last reply repeats once the queue is down to one.
#[derive(Default)]
pub struct ScriptedModel {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, system: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(system.to_string(), replies.into_iter().collect());
        self
    }

    /// Generator and evaluator answers for a run that needs no critique.
    pub fn accepting(prompt: &str, score: &str) -> Self {
        Self::new()
            .on(system_prompts::GENERATOR, [Reply::text(prompt)])
            .on(system_prompts::EVALUATOR, [Reply::text(score)])
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, system: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.system_prompt() == Some(system))
            .count()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, request: ChatRequest) -> llm::Result<ChatResponse> {
        let system = request.system_prompt().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(request);

        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            let queue = scripts
                .get_mut(&system)
                .ok_or_else(|| LlmError::Other(format!("no script for system prompt '{}'", system)))?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        reply
            .ok_or_else(|| LlmError::Other(format!("empty script for '{}'", system)))?
            .into_result()
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Build a workflow over a scripted model with default settings.
pub fn workflow_with(model: Arc<ScriptedModel>) -> PromptWorkflow {
    PromptWorkflow::builder(PromptCraftConfig::default())
        .with_model(model)
        .build()
        .expect("workflow should build with an injected model")
}
