//! Workflow state record and the requests that seed it.
//!
//! Callers never assemble a [`WorkflowState`] by hand. They pass a
//! [`WorkflowRequest`], which fixes the mode and the fields the caller owns;
//! every other field is filled in by the nodes as the graph runs. Fields only
//! ever go from `None` to `Some`; `prompt` is the one field a node
//! (`LoopImprover`) may overwrite.

use crate::error::{Result, WorkflowError};
use crate::score;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which branch of the graph an invocation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Build a prompt from a task description, then score and refine it.
    Generate,
    /// Rewrite an existing prompt with caller guidance.
    Improve,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Generate => f.write_str("generate"),
            Mode::Improve => f.write_str("improve"),
        }
    }
}

/// Input for generate mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub task_description: String,
}

/// Input for improve mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImproveRequest {
    pub prompt: String,
    pub context: String,
}

/// One invocation's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum WorkflowRequest {
    Generate(GenerateRequest),
    Improve(ImproveRequest),
}

impl WorkflowRequest {
    pub fn generate(task_description: impl Into<String>) -> Self {
        Self::Generate(GenerateRequest {
            task_description: task_description.into(),
        })
    }

    pub fn improve(prompt: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Improve(ImproveRequest {
            prompt: prompt.into(),
            context: context.into(),
        })
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Generate(_) => Mode::Generate,
            Self::Improve(_) => Mode::Improve,
        }
    }

    /// Reject blank inputs before any model call is made.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Generate(req) => require_text("task_description", &req.task_description),
            Self::Improve(req) => {
                require_text("prompt", &req.prompt)?;
                require_text("context", &req.context)
            }
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WorkflowError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// The record threaded through every node of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_found: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improved_prompt: Option<String>,
}

impl WorkflowState {
    fn empty(mode: Mode) -> Self {
        Self {
            mode,
            task_description: None,
            context: None,
            base_template: None,
            prompt: None,
            feedback: None,
            score: None,
            issue_found: None,
            improved_prompt: None,
        }
    }

    /// Seed a fresh record from a caller request.
    pub fn from_request(request: WorkflowRequest) -> Self {
        match request {
            WorkflowRequest::Generate(req) => Self {
                task_description: Some(req.task_description),
                ..Self::empty(Mode::Generate)
            },
            WorkflowRequest::Improve(req) => Self {
                prompt: Some(req.prompt),
                context: Some(req.context),
                ..Self::empty(Mode::Improve)
            },
        }
    }

    /// Record an evaluator score; `issue_found` is always derived from it.
    pub fn record_score(&mut self, value: f64) {
        self.score = Some(value);
        self.issue_found = Some(score::is_issue(value));
    }

    /// True once the evaluator has run and flagged the prompt.
    pub fn has_issue(&self) -> bool {
        self.issue_found.unwrap_or(false)
    }

    /// The caller-facing result for this mode.
    pub fn final_prompt(&self) -> Option<&str> {
        match self.mode {
            Mode::Generate => self.prompt.as_deref(),
            Mode::Improve => self.improved_prompt.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_generate_request() {
        let state = WorkflowState::from_request(WorkflowRequest::generate("Explain gravity"));
        assert_eq!(state.mode, Mode::Generate);
        assert_eq!(state.task_description.as_deref(), Some("Explain gravity"));
        assert!(state.prompt.is_none());
        assert!(state.score.is_none());
    }

    #[test]
    fn test_from_improve_request() {
        let state = WorkflowState::from_request(WorkflowRequest::improve(
            "Explain relativity.",
            "Use a train analogy",
        ));
        assert_eq!(state.mode, Mode::Improve);
        assert_eq!(state.prompt.as_deref(), Some("Explain relativity."));
        assert_eq!(state.context.as_deref(), Some("Use a train analogy"));
        assert!(state.task_description.is_none());
    }

    #[test]
    fn test_validate_rejects_blank() {
        assert!(WorkflowRequest::generate("   ").validate().is_err());
        assert!(WorkflowRequest::improve("p", "").validate().is_err());
        assert!(WorkflowRequest::improve("", "c").validate().is_err());
        assert!(WorkflowRequest::improve("p", "c").validate().is_ok());
    }

    #[test]
    fn test_record_score_derives_issue() {
        let mut state = WorkflowState::from_request(WorkflowRequest::generate("t"));
        state.record_score(0.7);
        assert_eq!(state.issue_found, Some(false));
        state.record_score(0.699999);
        assert_eq!(state.issue_found, Some(true));
        assert!(state.has_issue());
    }

    #[test]
    fn test_final_prompt_by_mode() {
        let mut generate = WorkflowState::from_request(WorkflowRequest::generate("t"));
        generate.prompt = Some("p".into());
        assert_eq!(generate.final_prompt(), Some("p"));

        let mut improve = WorkflowState::from_request(WorkflowRequest::improve("p", "c"));
        assert_eq!(improve.final_prompt(), None);
        improve.improved_prompt = Some("better".into());
        assert_eq!(improve.final_prompt(), Some("better"));
    }

    #[test]
    fn test_serialization_skips_unset_fields() {
        let state = WorkflowState::from_request(WorkflowRequest::generate("t"));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"mode": "generate", "task_description": "t"})
        );
    }

    #[test]
    fn test_request_tagged_serde() {
        let request: WorkflowRequest =
            serde_json::from_value(json!({"mode": "improve", "prompt": "p", "context": "c"}))
                .unwrap();
        assert_eq!(request, WorkflowRequest::improve("p", "c"));
        assert_eq!(request.mode(), Mode::Improve);
    }
}
