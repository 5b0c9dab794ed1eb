//! Render the workflow graph as Mermaid or Graphviz DOT.
//!
//! Both renderers read the edge table directly, so the diagram always matches
//! what the executor routes on. Conditional edges are dashed and labeled with
//! their condition.

use crate::graph::{edges_from, NodeId};
use std::fmt;
use std::str::FromStr;

const START: &str = "START";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualizationFormat {
    /// Mermaid flowchart (`graph TD`)
    #[default]
    Mermaid,
    /// DOT format for Graphviz
    Dot,
}

impl FromStr for VisualizationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mermaid" => Ok(Self::Mermaid),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(format!("unknown graph format '{}', expected mermaid or dot", other)),
        }
    }
}

impl fmt::Display for VisualizationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mermaid => f.write_str("mermaid"),
            Self::Dot => f.write_str("dot"),
        }
    }
}

/// Render the workflow graph.
pub fn visualize(format: VisualizationFormat) -> String {
    match format {
        VisualizationFormat::Mermaid => visualize_mermaid(),
        VisualizationFormat::Dot => visualize_dot(),
    }
}

fn visualize_mermaid() -> String {
    let mut output = String::from("graph TD\n");

    output.push_str(&format!("    {}((START))\n", START));
    output.push_str(&format!("    style {} fill:#90EE90,stroke:#228B22,stroke-width:3px\n", START));

    for node in NodeId::ALL {
        let id = node.as_str();
        if node.is_terminal() {
            output.push_str(&format!("    {}((END))\n", id));
            output.push_str(&format!("    style {} fill:#FFB6C1,stroke:#DC143C,stroke-width:3px\n", id));
        } else if has_conditional_edges(node) {
            output.push_str(&format!("    {}{{\"{}\"}}\n", id, id));
            output.push_str(&format!("    style {} fill:#FFE4B5,stroke:#FF8C00,stroke-width:2px\n", id));
        } else if node.is_generative() {
            output.push_str(&format!("    {}[\"{}\"]\n", id, id));
            output.push_str(&format!("    style {} fill:#ADD8E6,stroke:#4682B4,stroke-width:2px\n", id));
        } else {
            output.push_str(&format!("    {}[\"{}\"]\n", id, id));
        }
    }

    output.push_str(&format!("    {} --> {}\n", START, NodeId::ENTRY.as_str()));
    for node in NodeId::ALL {
        for edge in edges_from(node) {
            match edge.condition.label() {
                Some(label) => output.push_str(&format!(
                    "    {} -.\"{}\".-> {}\n",
                    node.as_str(),
                    label,
                    edge.target.as_str()
                )),
                None => output.push_str(&format!(
                    "    {} --> {}\n",
                    node.as_str(),
                    edge.target.as_str()
                )),
            }
        }
    }

    output
}

fn visualize_dot() -> String {
    let mut output = String::from("digraph promptcraft {\n");
    output.push_str("    rankdir=TB;\n");
    output.push_str("    node [shape=box, style=rounded];\n");
    output.push_str(&format!(
        "    \"{}\" [shape=circle, style=filled, fillcolor=green];\n",
        START
    ));

    for node in NodeId::ALL {
        let attrs = if node.is_terminal() {
            " [shape=circle, style=filled, fillcolor=red]"
        } else if has_conditional_edges(node) {
            " [shape=diamond]"
        } else {
            ""
        };
        output.push_str(&format!("    \"{}\"{};\n", node.as_str(), attrs));
    }

    output.push_str(&format!("    \"{}\" -> \"{}\";\n", START, NodeId::ENTRY.as_str()));
    for node in NodeId::ALL {
        for edge in edges_from(node) {
            match edge.condition.label() {
                Some(label) => output.push_str(&format!(
                    "    \"{}\" -> \"{}\" [label=\"{}\", style=dashed];\n",
                    node.as_str(),
                    edge.target.as_str(),
                    label
                )),
                None => output.push_str(&format!(
                    "    \"{}\" -> \"{}\";\n",
                    node.as_str(),
                    edge.target.as_str()
                )),
            }
        }
    }

    output.push_str("}\n");
    output
}

fn has_conditional_edges(node: NodeId) -> bool {
    edges_from(node).iter().any(|e| e.condition.is_conditional())
}
