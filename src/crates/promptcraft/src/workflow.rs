//! Workflow executor.
//!
//! [`PromptWorkflow`] walks the edge table from [`NodeId::ENTRY`], running one
//! node at a time against a single state record until it reaches
//! [`NodeId::End`]. It is immutable once built, so one instance can serve
//! concurrent invocations; each invocation owns its own state.

use crate::config::PromptCraftConfig;
use crate::error::{Result, WorkflowError};
use crate::graph::{route, Condition, NodeId, RouteContext};
use crate::nodes::NodeRunner;
use crate::state::{WorkflowRequest, WorkflowState};
use llm::remote::GroqClient;
use llm::{ChatModel, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    /// Final state record
    pub state: WorkflowState,

    /// Nodes visited in order, ending with `END`
    pub path: Vec<NodeId>,

    /// Completed critique/improve cycles
    pub critique_rounds: usize,

    /// The evaluator still flagged the prompt when the round cap stopped the loop
    pub loop_exhausted: bool,
}

impl WorkflowOutcome {
    /// `prompt` in generate mode, `improved_prompt` in improve mode.
    pub fn final_prompt(&self) -> Option<&str> {
        self.state.final_prompt()
    }
}

/// Builder for [`PromptWorkflow`]
pub struct WorkflowBuilder {
    config: PromptCraftConfig,
    model: Option<Arc<dyn ChatModel>>,
    retry: Option<RetryPolicy>,
}

impl WorkflowBuilder {
    fn new(config: PromptCraftConfig) -> Self {
        Self {
            config,
            model: None,
            retry: None,
        }
    }

    /// Use this model instead of building a Groq client from the config.
    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_max_critique_rounds(mut self, rounds: usize) -> Self {
        self.config.workflow.max_critique_rounds = rounds;
        self
    }

    /// Override the retry policy derived from the config.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Validate the configuration and assemble the workflow.
    pub fn build(self) -> Result<PromptWorkflow> {
        self.config.validate()?;

        let retry = self.retry.unwrap_or_else(|| self.config.retry_policy());
        llm::retry::validate(&retry).map_err(|e| WorkflowError::Config(e.to_string()))?;

        let model: Arc<dyn ChatModel> = match self.model {
            Some(model) => model,
            None => {
                let remote = self.config.to_remote_config()?;
                let client =
                    GroqClient::new(remote).map_err(|e| WorkflowError::Config(e.to_string()))?;
                Arc::new(client)
            }
        };

        debug!(
            model = model.model_name(),
            max_critique_rounds = self.config.workflow.max_critique_rounds,
            max_attempts = retry.max_attempts,
            "Workflow built"
        );

        Ok(PromptWorkflow {
            nodes: NodeRunner::new(model, self.config.llm.temperature, retry),
            max_critique_rounds: self.config.workflow.max_critique_rounds,
        })
    }
}

/// The prompt generate/improve graph, ready to invoke
#[derive(Clone)]
pub struct PromptWorkflow {
    nodes: NodeRunner,
    max_critique_rounds: usize,
}

impl PromptWorkflow {
    pub fn builder(config: PromptCraftConfig) -> WorkflowBuilder {
        WorkflowBuilder::new(config)
    }

    pub fn model_name(&self) -> &str {
        self.nodes.model_name()
    }

    pub fn max_critique_rounds(&self) -> usize {
        self.max_critique_rounds
    }

    /// Run the graph once for `request`.
    pub async fn invoke(&self, request: WorkflowRequest) -> Result<WorkflowOutcome> {
        request.validate()?;

        let mode = request.mode();
        let started = Instant::now();
        info!(%mode, model = self.model_name(), "Workflow started");

        let mut state = WorkflowState::from_request(request);
        let mut path = Vec::new();
        let mut critique_rounds = 0;
        let mut loop_exhausted = false;
        let mut node = NodeId::ENTRY;

        loop {
            path.push(node);
            if node.is_terminal() {
                break;
            }

            self.nodes
                .run(node, &mut state)
                .instrument(info_span!("node", node = %node))
                .await?;

            if node == NodeId::CritiqueNode {
                critique_rounds += 1;
            }

            let ctx = RouteContext {
                state: &state,
                critique_rounds,
                max_critique_rounds: self.max_critique_rounds,
            };
            let edge = route(node, &ctx).ok_or(WorkflowError::Routing(node))?;

            if edge.condition == Condition::LoopExhausted {
                loop_exhausted = true;
                warn!(
                    critique_rounds,
                    score = ?state.score,
                    "Critique rounds exhausted, accepting current prompt"
                );
            }

            debug!(from = %node, to = %edge.target, "Route");
            node = edge.target;
        }

        info!(
            %mode,
            critique_rounds,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Workflow finished"
        );

        Ok(WorkflowOutcome {
            state,
            path,
            critique_rounds,
            loop_exhausted,
        })
    }

    /// Generate a prompt for a task description.
    pub async fn generate(&self, task_description: impl Into<String>) -> Result<WorkflowOutcome> {
        self.invoke(WorkflowRequest::generate(task_description)).await
    }

    /// Rewrite a prompt with caller guidance.
    pub async fn improve(
        &self,
        prompt: impl Into<String>,
        context: impl Into<String>,
    ) -> Result<WorkflowOutcome> {
        self.invoke(WorkflowRequest::improve(prompt, context)).await
    }
}
