//! The workflow graph: nodes, conditions and the edge table.
//!
//! ```text
//!                    Dispatcher
//!          mode=generate │     │ mode=improve
//!                        ▼     ▼
//!              ContextBuilder  PromptImproverDirect ──► END
//!                        │
//!                        ▼
//!              TemplateSelector
//!                        │
//!                        ▼
//!              PromptGenerator
//!                        │
//!                        ▼
//!       ┌──────► PromptEvaluator ──── accepted / loop exhausted ──► END
//!       │                │ issue found
//!       │                ▼
//!  LoopImprover ◄── CritiqueNode
//! ```
//!
//! The table is spelled out per node in [`edges_from`], an exhaustive match,
//! so adding a node without giving it outgoing edges does not compile. For
//! any state exactly one condition out of a node holds.

use crate::state::{Mode, WorkflowState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every node of the workflow, including the terminal marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    Dispatcher,
    ContextBuilder,
    TemplateSelector,
    PromptGenerator,
    PromptEvaluator,
    CritiqueNode,
    LoopImprover,
    PromptImproverDirect,
    #[serde(rename = "END")]
    End,
}

impl NodeId {
    /// Entry point of every invocation.
    pub const ENTRY: NodeId = NodeId::Dispatcher;

    /// All nodes in declaration order.
    pub const ALL: [NodeId; 9] = [
        NodeId::Dispatcher,
        NodeId::ContextBuilder,
        NodeId::TemplateSelector,
        NodeId::PromptGenerator,
        NodeId::PromptEvaluator,
        NodeId::CritiqueNode,
        NodeId::LoopImprover,
        NodeId::PromptImproverDirect,
        NodeId::End,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Dispatcher => "Dispatcher",
            NodeId::ContextBuilder => "ContextBuilder",
            NodeId::TemplateSelector => "TemplateSelector",
            NodeId::PromptGenerator => "PromptGenerator",
            NodeId::PromptEvaluator => "PromptEvaluator",
            NodeId::CritiqueNode => "CritiqueNode",
            NodeId::LoopImprover => "LoopImprover",
            NodeId::PromptImproverDirect => "PromptImproverDirect",
            NodeId::End => "END",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeId::End)
    }

    /// Whether running this node issues a model call.
    pub fn is_generative(&self) -> bool {
        matches!(
            self,
            NodeId::PromptGenerator
                | NodeId::PromptEvaluator
                | NodeId::CritiqueNode
                | NodeId::LoopImprover
                | NodeId::PromptImproverDirect
        )
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guard on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Unconditional.
    Always,
    /// The invocation's mode matches.
    ModeIs(Mode),
    /// The evaluator flagged the prompt and critique rounds remain.
    IssueFound,
    /// The evaluator did not flag the prompt.
    Accepted,
    /// The evaluator flagged the prompt but the round cap is reached.
    LoopExhausted,
}

impl Condition {
    /// Evaluate the guard against the current state and loop counters.
    pub fn holds(&self, ctx: &RouteContext<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::ModeIs(mode) => ctx.state.mode == *mode,
            Condition::IssueFound => ctx.state.has_issue() && ctx.rounds_remaining(),
            Condition::Accepted => !ctx.state.has_issue(),
            Condition::LoopExhausted => ctx.state.has_issue() && !ctx.rounds_remaining(),
        }
    }

    /// Short label used in rendered diagrams.
    pub fn label(&self) -> Option<String> {
        match self {
            Condition::Always => None,
            Condition::ModeIs(mode) => Some(format!("mode={}", mode)),
            Condition::IssueFound => Some("issue_found".to_string()),
            Condition::Accepted => Some("accepted".to_string()),
            Condition::LoopExhausted => Some("loop_exhausted".to_string()),
        }
    }

    pub fn is_conditional(&self) -> bool {
        !matches!(self, Condition::Always)
    }
}

/// An outgoing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub condition: Condition,
    pub target: NodeId,
}

const fn edge(condition: Condition, target: NodeId) -> Edge {
    Edge { condition, target }
}

const DISPATCHER_EDGES: [Edge; 2] = [
    edge(Condition::ModeIs(Mode::Improve), NodeId::PromptImproverDirect),
    edge(Condition::ModeIs(Mode::Generate), NodeId::ContextBuilder),
];

const EVALUATOR_EDGES: [Edge; 3] = [
    edge(Condition::IssueFound, NodeId::CritiqueNode),
    edge(Condition::Accepted, NodeId::End),
    edge(Condition::LoopExhausted, NodeId::End),
];

const CONTEXT_BUILDER_EDGES: [Edge; 1] = [edge(Condition::Always, NodeId::TemplateSelector)];
const TEMPLATE_SELECTOR_EDGES: [Edge; 1] = [edge(Condition::Always, NodeId::PromptGenerator)];
const GENERATOR_EDGES: [Edge; 1] = [edge(Condition::Always, NodeId::PromptEvaluator)];
const CRITIQUE_EDGES: [Edge; 1] = [edge(Condition::Always, NodeId::LoopImprover)];
const LOOP_IMPROVER_EDGES: [Edge; 1] = [edge(Condition::Always, NodeId::PromptEvaluator)];
const IMPROVER_DIRECT_EDGES: [Edge; 1] = [edge(Condition::Always, NodeId::End)];

/// Outgoing edges of a node, checked in order.
pub fn edges_from(node: NodeId) -> &'static [Edge] {
    match node {
        NodeId::Dispatcher => &DISPATCHER_EDGES,
        NodeId::ContextBuilder => &CONTEXT_BUILDER_EDGES,
        NodeId::TemplateSelector => &TEMPLATE_SELECTOR_EDGES,
        NodeId::PromptGenerator => &GENERATOR_EDGES,
        NodeId::PromptEvaluator => &EVALUATOR_EDGES,
        NodeId::CritiqueNode => &CRITIQUE_EDGES,
        NodeId::LoopImprover => &LOOP_IMPROVER_EDGES,
        NodeId::PromptImproverDirect => &IMPROVER_DIRECT_EDGES,
        NodeId::End => &[],
    }
}

/// Everything a routing decision may look at.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub state: &'a WorkflowState,
    pub critique_rounds: usize,
    pub max_critique_rounds: usize,
}

impl RouteContext<'_> {
    fn rounds_remaining(&self) -> bool {
        self.critique_rounds < self.max_critique_rounds
    }
}

/// Pick the next node, or `None` when no edge matches.
pub fn route(node: NodeId, ctx: &RouteContext<'_>) -> Option<Edge> {
    edges_from(node)
        .iter()
        .find(|edge| edge.condition.holds(ctx))
        .copied()
}
