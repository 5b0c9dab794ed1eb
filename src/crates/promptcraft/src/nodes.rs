//! Node implementations.
//!
//! Local nodes format strings from earlier fields. Generative nodes send one
//! system + human exchange to the chat model (under the retry policy) and
//! copy the reply into a state field.

use crate::error::{Result, WorkflowError};
use crate::graph::NodeId;
use crate::score;
use crate::state::WorkflowState;
use llm::{with_retry, ChatModel, ChatRequest, Message, RetryPolicy};
use std::sync::Arc;
use tracing::debug;

/// Template stored by `TemplateSelector`; the placeholder is filled by the generator.
pub const BASE_TEMPLATE: &str = "Given the following task, create a useful prompt: {task_description}";

const TASK_PLACEHOLDER: &str = "{task_description}";

/// System instructions, one per generative node.
pub mod system_prompts {
    pub const GENERATOR: &str = "You are an expert prompt engineer.";
    pub const EVALUATOR: &str = "Respond with only a float.";
    pub const CRITIC: &str = "Be a constructive prompt critic.";
    pub const LOOP_IMPROVER: &str = "Improve this prompt based on feedback.";
    pub const DIRECT_IMPROVER: &str = "Improve this prompt with the given context.";
}

/// Executes individual nodes against a shared chat model.
#[derive(Clone)]
pub struct NodeRunner {
    model: Arc<dyn ChatModel>,
    temperature: f32,
    retry: RetryPolicy,
}

impl NodeRunner {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32, retry: RetryPolicy) -> Self {
        Self {
            model,
            temperature,
            retry,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Run one node, mutating the state in place.
    pub async fn run(&self, node: NodeId, state: &mut WorkflowState) -> Result<()> {
        match node {
            NodeId::Dispatcher | NodeId::End => Ok(()),
            NodeId::ContextBuilder => build_context(state),
            NodeId::TemplateSelector => {
                select_template(state);
                Ok(())
            }
            NodeId::PromptGenerator => self.generate_prompt(state).await,
            NodeId::PromptEvaluator => self.evaluate_prompt(state).await,
            NodeId::CritiqueNode => self.critique_prompt(state).await,
            NodeId::LoopImprover => self.improve_from_feedback(state).await,
            NodeId::PromptImproverDirect => self.improve_with_context(state).await,
        }
    }

    async fn generate_prompt(&self, state: &mut WorkflowState) -> Result<()> {
        let node = NodeId::PromptGenerator;
        let template = require(node, "base_template", &state.base_template)?;
        let task = require(node, "task_description", &state.task_description)?;
        let input_text = template.replace(TASK_PLACEHOLDER, task);

        let reply = self.complete(node, system_prompts::GENERATOR, input_text).await?;
        if reply.trim().is_empty() {
            return Err(WorkflowError::EmptyResponse { node });
        }
        state.prompt = Some(reply);
        Ok(())
    }

    async fn evaluate_prompt(&self, state: &mut WorkflowState) -> Result<()> {
        let node = NodeId::PromptEvaluator;
        let prompt = require(node, "prompt", &state.prompt)?;
        let eval_input = format!(
            "Evaluate this prompt: '{}'. Return only a float score between 0.0 and 1.0",
            prompt
        );

        let reply = self.complete(node, system_prompts::EVALUATOR, eval_input).await?;
        let value = score::parse_score(&reply);
        state.record_score(value);
        debug!(score = value, issue_found = state.has_issue(), "Prompt scored");
        Ok(())
    }

    async fn critique_prompt(&self, state: &mut WorkflowState) -> Result<()> {
        let node = NodeId::CritiqueNode;
        let prompt = require(node, "prompt", &state.prompt)?;
        let critique_input = format!("Critique and suggest improvements: {}", prompt);

        let reply = self.complete(node, system_prompts::CRITIC, critique_input).await?;
        state.feedback = Some(reply);
        Ok(())
    }

    async fn improve_from_feedback(&self, state: &mut WorkflowState) -> Result<()> {
        let node = NodeId::LoopImprover;
        let feedback = require(node, "feedback", &state.feedback)?;
        let prompt = require(node, "prompt", &state.prompt)?;
        let improve_input = format!("Feedback: {}\nPrompt: {}", feedback, prompt);

        let reply = self.complete(node, system_prompts::LOOP_IMPROVER, improve_input).await?;
        state.prompt = Some(reply);
        Ok(())
    }

    async fn improve_with_context(&self, state: &mut WorkflowState) -> Result<()> {
        let node = NodeId::PromptImproverDirect;
        let prompt = require(node, "prompt", &state.prompt)?;
        let context = require(node, "context", &state.context)?;
        let improve_input = format!("Prompt: {}\nContext: {}", prompt, context);

        let reply = self.complete(node, system_prompts::DIRECT_IMPROVER, improve_input).await?;
        state.improved_prompt = Some(reply);
        Ok(())
    }

    /// One logical system + human exchange; returns the reply text.
    async fn complete(&self, node: NodeId, system: &str, human: String) -> Result<String> {
        let request = ChatRequest::new(vec![Message::system(system), Message::human(human)])
            .with_temperature(self.temperature);

        let model = &self.model;
        let response = with_retry(&self.retry, node.as_str(), || model.chat(request.clone()))
            .await
            .map_err(|e| WorkflowError::model(node, e))?;

        Ok(response.message.content)
    }
}

/// `ContextBuilder`: frame the task for the assistant.
pub fn build_context(state: &mut WorkflowState) -> Result<()> {
    let task = require(NodeId::ContextBuilder, "task_description", &state.task_description)?;
    state.context = Some(format!("You are a helpful assistant. Task: {}", task));
    Ok(())
}

/// `TemplateSelector`: store the fixed template skeleton.
pub fn select_template(state: &mut WorkflowState) {
    state.base_template = Some(BASE_TEMPLATE.to_string());
}

fn require<'a>(node: NodeId, field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or(WorkflowError::MissingField { node, field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowRequest;
    use async_trait::async_trait;
    use llm::{ChatResponse, LlmError};
    use std::sync::Mutex;

    struct Recorder {
        reply: String,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl Recorder {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> ChatRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ChatModel for Recorder {
        async fn chat(&self, request: ChatRequest) -> llm::Result<ChatResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(ChatResponse::new(Message::assistant(self.reply.clone())))
        }

        fn model_name(&self) -> &str {
            "recorder"
        }
    }

    struct Failing;

    #[async_trait]
    impl ChatModel for Failing {
        async fn chat(&self, _request: ChatRequest) -> llm::Result<ChatResponse> {
            Err(LlmError::AuthenticationError("invalid api key".into()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn runner(model: Arc<dyn ChatModel>) -> NodeRunner {
        NodeRunner::new(model, 0.0, RetryPolicy::no_retry())
    }

    #[test]
    fn test_build_context() {
        let mut state = WorkflowState::from_request(WorkflowRequest::generate("Explain gravity"));
        build_context(&mut state).unwrap();
        assert_eq!(
            state.context.as_deref(),
            Some("You are a helpful assistant. Task: Explain gravity")
        );
    }

    #[test]
    fn test_select_template_keeps_placeholder() {
        let mut state = WorkflowState::from_request(WorkflowRequest::generate("t"));
        select_template(&mut state);
        assert_eq!(state.base_template.as_deref(), Some(BASE_TEMPLATE));
    }

    #[tokio::test]
    async fn test_generator_substitutes_task() {
        let model = Recorder::new("Explain gravity simply.");
        let runner = runner(model.clone());
        let mut state = WorkflowState::from_request(WorkflowRequest::generate("Explain gravity"));
        select_template(&mut state);

        runner.run(NodeId::PromptGenerator, &mut state).await.unwrap();

        assert_eq!(state.prompt.as_deref(), Some("Explain gravity simply."));
        let request = model.last_request();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0], Message::system(system_prompts::GENERATOR));
        assert_eq!(
            request.messages[1],
            Message::human("Given the following task, create a useful prompt: Explain gravity")
        );
        assert_eq!(request.config.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_generator_rejects_blank_reply() {
        let runner = runner(Recorder::new("  \n"));
        let mut state = WorkflowState::from_request(WorkflowRequest::generate("t"));
        select_template(&mut state);

        let err = runner.run(NodeId::PromptGenerator, &mut state).await.unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyResponse { node: NodeId::PromptGenerator }));
        assert!(state.prompt.is_none());
    }

    #[tokio::test]
    async fn test_generator_requires_template() {
        let runner = runner(Recorder::new("x"));
        let mut state = WorkflowState::from_request(WorkflowRequest::generate("t"));

        let err = runner.run(NodeId::PromptGenerator, &mut state).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::MissingField { field: "base_template", .. }
        ));
    }

    #[tokio::test]
    async fn test_evaluator_records_score() {
        let model = Recorder::new("0.42 is the score");
        let runner = runner(model.clone());
        let mut state = WorkflowState::from_request(WorkflowRequest::improve("Explain it.", "c"));

        runner.run(NodeId::PromptEvaluator, &mut state).await.unwrap();

        assert_eq!(state.score, Some(0.42));
        assert_eq!(state.issue_found, Some(true));
        assert_eq!(
            model.last_request().messages[1].content,
            "Evaluate this prompt: 'Explain it.'. Return only a float score between 0.0 and 1.0"
        );
    }

    #[tokio::test]
    async fn test_evaluator_falls_back_on_garbage() {
        let runner = runner(Recorder::new("N/A"));
        let mut state = WorkflowState::from_request(WorkflowRequest::improve("p", "c"));

        runner.run(NodeId::PromptEvaluator, &mut state).await.unwrap();

        assert_eq!(state.score, Some(score::DEFAULT_SCORE));
        assert_eq!(state.issue_found, Some(true));
    }

    #[tokio::test]
    async fn test_loop_improver_overwrites_prompt() {
        let model = Recorder::new("v2");
        let runner = runner(model.clone());
        let mut state = WorkflowState::from_request(WorkflowRequest::improve("v1", "c"));
        state.feedback = Some("too vague".into());

        runner.run(NodeId::LoopImprover, &mut state).await.unwrap();

        assert_eq!(state.prompt.as_deref(), Some("v2"));
        assert_eq!(model.last_request().messages[1].content, "Feedback: too vague\nPrompt: v1");
    }

    #[tokio::test]
    async fn test_direct_improver_message() {
        let model = Recorder::new("better");
        let runner = runner(model.clone());
        let mut state =
            WorkflowState::from_request(WorkflowRequest::improve("Explain relativity.", "Use a train"));

        runner.run(NodeId::PromptImproverDirect, &mut state).await.unwrap();

        assert_eq!(state.improved_prompt.as_deref(), Some("better"));
        let request = model.last_request();
        assert_eq!(request.system_prompt(), Some(system_prompts::DIRECT_IMPROVER));
        assert_eq!(
            request.messages[1].content,
            "Prompt: Explain relativity.\nContext: Use a train"
        );
    }

    #[tokio::test]
    async fn test_model_error_names_node() {
        let runner = runner(Arc::new(Failing));
        let mut state = WorkflowState::from_request(WorkflowRequest::improve("p", "c"));

        let err = runner.run(NodeId::CritiqueNode, &mut state).await.unwrap_err();
        match err {
            WorkflowError::Model { node, source } => {
                assert_eq!(node, NodeId::CritiqueNode);
                assert!(source.is_auth_error());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
