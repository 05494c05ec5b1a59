// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Workflow input composition.
//!
//! Upstream outputs are rendered as blocks:
//!
//! ```text
//! --- Input from "Report" ---
//! <output>
//! ```
//!
//! Blocks are joined by a blank line and either replace every `{{input}}`
//! in the prompt or, without a placeholder, go in front of it after a
//! short preamble.

use crate::graph::ConnectionGraph;

/// Placeholder replaced by the rendered input blocks.
pub const INPUT_PLACEHOLDER: &str = "{{input}}";

/// First line of the context prepended to prompts without a placeholder.
pub const CONTEXT_PREAMBLE: &str = "Here is context from previous workflow steps:";

pub fn format_input_block(name: &str, output: &str) -> String {
    format!("--- Input from \"{name}\" ---\n{output}")
}

/// Render the inputs of `workspace_id` that have output, in connection order.
///
/// Returns `None` when no input has produced output yet.
pub fn input_context(graph: &ConnectionGraph, workspace_id: &str) -> Option<String> {
    let blocks: Vec<String> = graph
        .get_inputs_for_workspace(workspace_id)
        .into_iter()
        .filter_map(|input| {
            let output = input.output?;
            let name = graph
                .get(&input.id)
                .map(|ws| ws.name.as_str())
                .unwrap_or(input.id.as_str());
            Some(format_input_block(name, &output))
        })
        .collect();

    (!blocks.is_empty()).then(|| blocks.join("\n\n"))
}

/// Insert `context` into `prompt`.
pub fn apply_context(prompt: &str, context: &str) -> String {
    if prompt.contains(INPUT_PLACEHOLDER) {
        prompt.replace(INPUT_PLACEHOLDER, context)
    } else {
        format!("{CONTEXT_PREAMBLE}\n\n{context}\n\n{prompt}")
    }
}

/// The final prompt for a dispatch to `workspace_id`.
pub fn compose_prompt(graph: &ConnectionGraph, workspace_id: &str, prompt: &str) -> String {
    match input_context(graph, workspace_id) {
        Some(context) => apply_context(prompt, &context),
        None => prompt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::WorkspaceSpec;

    fn chain(output: Option<&str>) -> (ConnectionGraph, String) {
        let mut graph = ConnectionGraph::new();
        let a = graph.add_workspace(WorkspaceSpec::at(0.0, 0.0).named("A"));
        let b = graph.add_workspace(WorkspaceSpec::at(300.0, 0.0).named("B"));
        graph.connect_workspaces(&a, &b);
        graph.set_last_output(&a, output.map(String::from));
        (graph, b)
    }

    #[test]
    fn test_placeholder_replaced() {
        let (graph, b) = chain(Some("report text"));
        assert_eq!(
            compose_prompt(&graph, &b, "summarize {{input}}"),
            "summarize --- Input from \"A\" ---\nreport text"
        );
    }

    #[test]
    fn test_every_placeholder_replaced() {
        let (graph, b) = chain(Some("42"));
        let composed = compose_prompt(&graph, &b, "{{input}} and again {{input}}");
        assert_eq!(composed.matches("--- Input from \"A\" ---\n42").count(), 2);
        assert!(!composed.contains(INPUT_PLACEHOLDER));
    }

    #[test]
    fn test_preamble_without_placeholder() {
        let (graph, b) = chain(Some("42"));
        assert_eq!(
            compose_prompt(&graph, &b, "What is the answer?"),
            "Here is context from previous workflow steps:\n\n--- Input from \"A\" ---\n42\n\nWhat is the answer?"
        );
    }

    #[test]
    fn test_no_output_leaves_prompt() {
        let (graph, b) = chain(None);
        assert_eq!(compose_prompt(&graph, &b, "summarize {{input}}"), "summarize {{input}}");
    }

    #[test]
    fn test_multiple_inputs_in_connection_order() {
        let mut graph = ConnectionGraph::new();
        let p = graph.add_workspace(WorkspaceSpec::at(0.0, 0.0).named("P"));
        let q = graph.add_workspace(WorkspaceSpec::at(0.0, 300.0).named("Q"));
        let r = graph.add_workspace(WorkspaceSpec::at(0.0, 600.0).named("R"));
        let d = graph.add_workspace(WorkspaceSpec::at(300.0, 300.0));
        graph.connect_workspaces(&q, &d);
        graph.connect_workspaces(&r, &d);
        graph.connect_workspaces(&p, &d);
        graph.set_last_output(&q, Some("q".to_string()));
        graph.set_last_output(&p, Some("p".to_string()));

        assert_eq!(
            input_context(&graph, &d).unwrap(),
            "--- Input from \"Q\" ---\nq\n\n--- Input from \"P\" ---\np"
        );
    }
}
