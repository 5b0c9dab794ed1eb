//! Error types for workflow construction and execution.
//!
//! ```text
//! WorkflowError
//! ├── InvalidInput   - empty task/prompt/context from the caller
//! ├── MissingField   - a node ran without a field it reads
//! ├── EmptyResponse  - the generator returned no text
//! ├── Model          - provider failure that survived the retry policy
//! ├── Routing        - no outgoing edge matched the state
//! ├── Config         - invalid or incomplete configuration
//! ├── TomlParse      - configuration file is not valid TOML
//! └── Io             - configuration file could not be read
//! ```

use crate::graph::NodeId;
use llm::LlmError;
use thiserror::Error;

/// Convenience result type using [`WorkflowError`]
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors raised while building or running the prompt workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Caller supplied an unusable request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A node read a state field that no earlier node (or the caller) set
    #[error("Node '{node}' requires field '{field}' which is not set")]
    MissingField {
        node: NodeId,
        field: &'static str,
    },

    /// The model answered with blank text where content is required
    #[error("Node '{node}' received an empty response from the model")]
    EmptyResponse { node: NodeId },

    /// The model call failed
    #[error("Node '{node}' model call failed: {source}")]
    Model {
        node: NodeId,
        #[source]
        source: LlmError,
    },

    /// No outgoing edge matched; indicates a broken edge table
    #[error("No route out of node '{0}'")]
    Routing(NodeId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file parse error
    #[error("Failed to parse configuration: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkflowError {
    /// Wrap a provider error with the node that issued the call
    pub fn model(node: NodeId, source: LlmError) -> Self {
        Self::Model { node, source }
    }

    /// Node where the failure happened, if it is node-scoped
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::MissingField { node, .. }
            | Self::EmptyResponse { node }
            | Self::Model { node, .. } => Some(*node),
            Self::Routing(node) => Some(*node),
            _ => None,
        }
    }
}
