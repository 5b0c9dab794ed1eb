//! # PromptCraft
//!
//! A small workflow graph that either generates a prompt from a task
//! description or improves an existing prompt, using a hosted chat model.
//!
//! ## Modes
//!
//! - **Generate** - build context and a template, draft a prompt, then score
//!   it and run critique/improve rounds until the score clears the threshold
//!   or the round cap is reached.
//! - **Improve** - one direct rewrite of a caller prompt with caller context.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promptcraft::{ConfigLoader, PromptWorkflow};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ConfigLoader::new().load().await?;
//! let workflow = PromptWorkflow::builder(config).build()?;
//!
//! let outcome = workflow.generate("Explain gravity to a child").await?;
//! println!("{}", outcome.final_prompt().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! Any [`llm::ChatModel`] can be injected with
//! [`WorkflowBuilder::with_model`], which is how the tests drive the graph
//! without network access.

pub mod config;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod score;
pub mod state;
pub mod visualization;
pub mod workflow;

pub use config::{ConfigLoader, PromptCraftConfig};
pub use error::{Result, WorkflowError};
pub use graph::{edges_from, route, Condition, Edge, NodeId, RouteContext};
pub use state::{GenerateRequest, ImproveRequest, Mode, WorkflowRequest, WorkflowState};
pub use visualization::{visualize, VisualizationFormat};
pub use workflow::{PromptWorkflow, WorkflowBuilder, WorkflowOutcome};
