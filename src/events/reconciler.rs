// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Event reconciler: applies one runner event to the workflow state.
//!
//! `apply` is a single synchronous block of mutations. It never suspends and
//! never calls the runner; downstream dispatches are returned as triggers for
//! the caller to schedule.
//!
//! Transition policy lives here. Activity transitions (thinking and the tool
//! states) are skipped once the agent is terminal, while logs are still kept.

use tracing::{debug, info};

use super::protocol::{AgentEvent, StopReason};
use crate::agents::{AgentState, LogDraft, LogKind};
use crate::graph::{
    ConnectionGraph, WorkspaceState, FAILURE_MESSINESS, SUCCESS_MESSINESS,
};
use crate::state::WorkflowState;
use crate::types::WorkspaceId;

/// Separator between message logs in a workspace's `last_output`.
pub const OUTPUT_SEPARATOR: &str = "\n\n";

/// A downstream workspace that became ready to auto-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoRunTrigger {
    pub workspace_id: WorkspaceId,
    /// The upstream workspace whose success caused the trigger.
    pub source_workspace_id: WorkspaceId,
    pub task_template: String,
}

/// Apply one event and return the auto-run triggers it produced.
pub fn apply(state: &mut WorkflowState, event: &AgentEvent) -> Vec<AutoRunTrigger> {
    debug!(kind = event.kind(), agent_id = event.agent_id(), "Reconciling event");

    #[cfg(feature = "telemetry")]
    crate::telemetry::GLOBAL_METRICS.record_event(event.kind());

    match event {
        AgentEvent::Started { agent_id, .. } => {
            state
                .agents
                .append_log(agent_id, LogDraft::info("Agent started"));
            state.set_status("Agent started for workspace");
        }
        AgentEvent::Init {
            agent_id,
            session_id,
            model,
        } => {
            state.agents.set_agent_session(agent_id, session_id, model);
            state.agents.append_log(
                agent_id,
                LogDraft::info(format!("Session initialized with model: {model}")),
            );
        }
        AgentEvent::Message { agent_id, content } => {
            state
                .agents
                .append_log(agent_id, LogDraft::message(content.clone()));
            enter_activity(state, agent_id, AgentState::Thinking);
        }
        AgentEvent::ToolUse {
            agent_id,
            tool_name,
            tool_input,
        } => {
            if enter_activity(state, agent_id, AgentState::for_tool(tool_name)) {
                if let Some(ws_id) = workspace_id_of(state, agent_id) {
                    state
                        .graph
                        .update_workspace_state(&ws_id, WorkspaceState::Working);
                }
            }
            state.agents.append_log(
                agent_id,
                LogDraft::new(LogKind::Tool, format!("Using tool: {tool_name}"))
                    .with_tool(tool_name.clone())
                    .with_tool_input(tool_input.clone()),
            );
        }
        AgentEvent::ToolResult {
            agent_id,
            tool_name,
            success,
        } => {
            let outcome = if *success { "success" } else { "failed" };
            state.agents.append_log(
                agent_id,
                LogDraft::new(LogKind::Result, format!("Tool {tool_name}: {outcome}"))
                    .with_tool(tool_name.clone()),
            );
            enter_activity(state, agent_id, AgentState::Thinking);
        }
        AgentEvent::Result {
            agent_id,
            success,
            duration_ms,
        } => return apply_result(state, agent_id, *success, *duration_ms),
        AgentEvent::Error { agent_id, message } => {
            state.agents.set_agent_error(agent_id, message.clone());
            if let Some(ws_id) = workspace_id_of(state, agent_id) {
                state
                    .graph
                    .update_workspace_state(&ws_id, WorkspaceState::Error);
            }
            state
                .agents
                .append_log(agent_id, LogDraft::error(message.clone()));
            state.set_status(format!("Error: {message}"));
        }
        AgentEvent::Stopped { agent_id, reason } => {
            if *reason == StopReason::Cancelled {
                if let Some(ws_id) = workspace_id_of(state, agent_id) {
                    state
                        .graph
                        .update_workspace_state(&ws_id, WorkspaceState::Occupied);
                }
                state.agents.update_agent_state(agent_id, AgentState::Idle);
            }
            state
                .agents
                .append_log(agent_id, LogDraft::info(format!("Agent stopped: {reason}")));
        }
    }

    Vec::new()
}

fn apply_result(
    state: &mut WorkflowState,
    agent_id: &str,
    success: bool,
    duration_ms: u64,
) -> Vec<AutoRunTrigger> {
    state.agents.complete_agent(agent_id, success);

    let mut triggers = Vec::new();
    if let Some(ws_id) = workspace_id_of(state, agent_id) {
        let (next, messiness) = if success {
            (WorkspaceState::Success, SUCCESS_MESSINESS)
        } else {
            (WorkspaceState::Error, FAILURE_MESSINESS)
        };
        state.graph.update_workspace_state(&ws_id, next);
        state.graph.increment_messiness(&ws_id, messiness);

        if success {
            let output = state
                .agents
                .get(agent_id)
                .map(|agent| agent.messages().collect::<Vec<_>>().join(OUTPUT_SEPARATOR))
                .unwrap_or_default();
            if !output.is_empty() {
                state.graph.set_last_output(&ws_id, Some(output));
            }
            triggers = auto_run_triggers(&state.graph, &ws_id);
        }
    }

    let summary = if success {
        LogDraft::info(format!("Task completed in {duration_ms}ms"))
    } else {
        LogDraft::error(format!("Task failed in {duration_ms}ms"))
    };
    state.agents.append_log(agent_id, summary);
    state.set_status(if success {
        "Task completed!"
    } else {
        "Task failed"
    });

    triggers
}

/// Downstream workspaces of `source` that are ready to auto-run.
///
/// Re-evaluated on every qualifying upstream success. There is no
/// per-generation join barrier, so a fan-in node can fire more than once.
pub fn auto_run_triggers(graph: &ConnectionGraph, source: &str) -> Vec<AutoRunTrigger> {
    graph
        .get_downstream_workspaces(source)
        .into_iter()
        .filter_map(|downstream_id| {
            let downstream = graph.get(&downstream_id)?;
            if !downstream.auto_run {
                return None;
            }
            let template = downstream.task_template.clone()?;
            if !inputs_ready(graph, &downstream_id) {
                debug!(workspace_id = %downstream_id, "Auto-run waiting on inputs");
                return None;
            }

            info!(
                workspace_id = %downstream_id,
                source_workspace_id = %source,
                "Auto-run triggered"
            );
            #[cfg(feature = "telemetry")]
            crate::telemetry::GLOBAL_METRICS.record_auto_run();

            Some(AutoRunTrigger {
                workspace_id: downstream_id,
                source_workspace_id: source.to_string(),
                task_template: template,
            })
        })
        .collect()
}

/// Every input currently reads as a success with output.
pub fn inputs_ready(graph: &ConnectionGraph, workspace_id: &str) -> bool {
    graph.get(workspace_id).is_some_and(|ws| {
        ws.input_connections.iter().all(|input_id| {
            graph
                .get(input_id)
                .is_some_and(|input| input.has_successful_output())
        })
    })
}

/// Move a non-terminal agent into an activity state.
fn enter_activity(state: &mut WorkflowState, agent_id: &str, next: AgentState) -> bool {
    match state.agents.get(agent_id) {
        Some(agent) if !agent.state.is_terminal() => {
            state.agents.update_agent_state(agent_id, next);
            true
        }
        Some(agent) => {
            debug!(agent_id, state = %agent.state, next = %next, "Ignoring transition out of terminal state");
            false
        }
        None => false,
    }
}

fn workspace_id_of(state: &WorkflowState, agent_id: &str) -> Option<WorkspaceId> {
    state.workspace_of(agent_id).map(|ws| ws.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::WorkspaceSpec;

    fn state_with_agent(name: &str, agent_id: &str) -> (WorkflowState, WorkspaceId) {
        let mut state = WorkflowState::new();
        let ws = state.graph.add_workspace(WorkspaceSpec::at(0.0, 0.0).named(name));
        state.agents.register(agent_id, ws.clone(), "task");
        state.graph.set_workspace_agent(&ws, Some(agent_id.to_string()));
        state.graph.update_workspace_state(&ws, WorkspaceState::Working);
        (state, ws)
    }

    fn message(agent_id: &str, content: &str) -> AgentEvent {
        AgentEvent::Message {
            agent_id: agent_id.to_string(),
            content: content.to_string(),
        }
    }

    fn result(agent_id: &str, success: bool) -> AgentEvent {
        AgentEvent::Result {
            agent_id: agent_id.to_string(),
            success,
            duration_ms: 1500,
        }
    }

    /// Mark a workspace as having completed with the given output.
    fn succeed(state: &mut WorkflowState, ws: &str, output: &str) {
        state.graph.update_workspace_state(ws, WorkspaceState::Success);
        state.graph.set_last_output(ws, Some(output.to_string()));
    }

    #[test]
    fn test_count_to_five_scenario() {
        let (mut state, ws) = state_with_agent("A", "a1");
        let events = [
            AgentEvent::Init {
                agent_id: "a1".to_string(),
                session_id: "s".to_string(),
                model: "sonnet".to_string(),
            },
            message("a1", "1,2,3"),
            message("a1", "4,5"),
            result("a1", true),
        ];
        for event in &events {
            assert!(apply(&mut state, event).is_empty());
        }

        let agent = state.agents.get("a1").unwrap();
        assert_eq!(agent.state, AgentState::Success);
        assert_eq!(agent.progress, 100);
        let workspace = state.graph.get(&ws).unwrap();
        assert_eq!(workspace.state, WorkspaceState::Success);
        assert_eq!(workspace.last_output.as_deref(), Some("1,2,3\n\n4,5"));
        assert_eq!(workspace.messiness, 15);
        assert_eq!(state.status, "Task completed!");
        assert_eq!(
            agent.logs.back().map(|l| l.content.as_str()),
            Some("Task completed in 1500ms")
        );
    }

    #[test]
    fn test_failed_result() {
        let (mut state, ws) = state_with_agent("A", "a1");
        apply(&mut state, &message("a1", "partial"));
        apply(&mut state, &result("a1", false));

        let workspace = state.graph.get(&ws).unwrap();
        assert_eq!(workspace.state, WorkspaceState::Error);
        assert_eq!(workspace.messiness, 5);
        assert!(workspace.last_output.is_none());
        let last = state.agents.get("a1").unwrap().logs.back().unwrap();
        assert_eq!(last.kind, LogKind::Error);
        assert_eq!(last.content, "Task failed in 1500ms");
        assert_eq!(state.status, "Task failed");
    }

    #[test]
    fn test_success_without_messages_keeps_previous_output() {
        let (mut state, ws) = state_with_agent("A", "a1");
        state.graph.set_last_output(&ws, Some("earlier".to_string()));
        apply(&mut state, &result("a1", true));
        assert_eq!(state.graph.get(&ws).unwrap().last_output.as_deref(), Some("earlier"));
    }

    #[test]
    fn test_messiness_saturates() {
        let (mut state, ws) = state_with_agent("A", "a1");
        state.graph.update_messiness(&ws, 95);
        apply(&mut state, &result("a1", true));
        assert_eq!(state.graph.get(&ws).unwrap().messiness, 100);
    }

    #[test]
    fn test_tool_use_classifies_and_marks_working() {
        let (mut state, ws) = state_with_agent("A", "a1");
        state.graph.update_workspace_state(&ws, WorkspaceState::Occupied);
        apply(
            &mut state,
            &AgentEvent::ToolUse {
                agent_id: "a1".to_string(),
                tool_name: "Grep".to_string(),
                tool_input: serde_json::json!({"pattern": "fn main"}),
            },
        );

        let agent = state.agents.get("a1").unwrap();
        assert_eq!(agent.state, AgentState::Reading);
        assert_eq!(state.graph.get(&ws).unwrap().state, WorkspaceState::Working);
        let log = agent.logs.back().unwrap();
        assert_eq!(log.kind, LogKind::Tool);
        assert_eq!(log.content, "Using tool: Grep");
        assert_eq!(log.tool_name.as_deref(), Some("Grep"));
        assert_eq!(log.tool_input, Some(serde_json::json!({"pattern": "fn main"})));

        apply(
            &mut state,
            &AgentEvent::ToolResult {
                agent_id: "a1".to_string(),
                tool_name: "Grep".to_string(),
                success: false,
            },
        );
        let agent = state.agents.get("a1").unwrap();
        assert_eq!(agent.state, AgentState::Thinking);
        assert_eq!(agent.logs.back().unwrap().content, "Tool Grep: failed");
    }

    #[test]
    fn test_terminal_agent_ignores_activity() {
        let (mut state, ws) = state_with_agent("A", "a1");
        apply(&mut state, &result("a1", true));
        apply(&mut state, &message("a1", "late"));
        apply(
            &mut state,
            &AgentEvent::ToolUse {
                agent_id: "a1".to_string(),
                tool_name: "Bash".to_string(),
                tool_input: serde_json::Value::Null,
            },
        );

        let agent = state.agents.get("a1").unwrap();
        assert_eq!(agent.state, AgentState::Success);
        assert_eq!(agent.logs.back().unwrap().content, "Using tool: Bash");
        assert_eq!(state.graph.get(&ws).unwrap().state, WorkspaceState::Success);
    }

    #[test]
    fn test_error_event() {
        let (mut state, ws) = state_with_agent("A", "a1");
        apply(
            &mut state,
            &AgentEvent::Error {
                agent_id: "a1".to_string(),
                message: "rate limited".to_string(),
            },
        );

        let agent = state.agents.get("a1").unwrap();
        assert_eq!(agent.state, AgentState::Error);
        assert_eq!(agent.error.as_deref(), Some("rate limited"));
        assert!(agent.completed_at.is_some());
        assert_eq!(state.graph.get(&ws).unwrap().state, WorkspaceState::Error);
        assert_eq!(state.graph.get(&ws).unwrap().messiness, 0);
        assert_eq!(state.status, "Error: rate limited");
    }

    #[test]
    fn test_cancelled_stop_resets_to_occupied() {
        let (mut state, ws) = state_with_agent("A", "a1");
        apply(
            &mut state,
            &AgentEvent::Stopped {
                agent_id: "a1".to_string(),
                reason: StopReason::Cancelled,
            },
        );
        assert_eq!(state.graph.get(&ws).unwrap().state, WorkspaceState::Occupied);
        let agent = state.agents.get("a1").unwrap();
        assert_eq!(agent.state, AgentState::Idle);
        assert_eq!(agent.logs.back().unwrap().content, "Agent stopped: cancelled");
    }

    #[test]
    fn test_completed_stop_only_logs() {
        let (mut state, ws) = state_with_agent("A", "a1");
        apply(&mut state, &result("a1", true));
        apply(
            &mut state,
            &AgentEvent::Stopped {
                agent_id: "a1".to_string(),
                reason: StopReason::Completed,
            },
        );
        assert_eq!(state.graph.get(&ws).unwrap().state, WorkspaceState::Success);
        let agent = state.agents.get("a1").unwrap();
        assert_eq!(agent.state, AgentState::Success);
        assert_eq!(agent.logs.back().unwrap().content, "Agent stopped: completed");
    }

    #[test]
    fn test_errored_stop_only_logs() {
        let (mut state, ws) = state_with_agent("A", "a1");
        state.graph.update_messiness(&ws, 20);
        let before = state.agents.get("a1").unwrap().clone();

        let triggers = apply(
            &mut state,
            &AgentEvent::Stopped {
                agent_id: "a1".to_string(),
                reason: StopReason::Error,
            },
        );
        assert!(triggers.is_empty());

        let workspace = state.graph.get(&ws).unwrap();
        assert_eq!(workspace.state, WorkspaceState::Working);
        assert_eq!(workspace.messiness, 20);
        assert_eq!(workspace.agent_id.as_deref(), Some("a1"));
        let agent = state.agents.get("a1").unwrap();
        assert_eq!(agent.state, before.state);
        assert_eq!(agent.error, before.error);
        assert_eq!(agent.logs.len(), before.logs.len() + 1);
        assert_eq!(agent.logs.back().unwrap().content, "Agent stopped: error");
    }

    #[test]
    fn test_unknown_agent_is_noop() {
        let mut state = WorkflowState::new();
        let ws = state.graph.add_workspace(WorkspaceSpec::at(0.0, 0.0));
        for event in [message("ghost", "hi"), result("ghost", true)] {
            assert!(apply(&mut state, &event).is_empty());
        }
        assert!(state.agents.is_empty());
        assert_eq!(state.graph.get(&ws).unwrap().state, WorkspaceState::Empty);
    }

    #[test]
    fn test_auto_run_fires_for_ready_downstream() {
        let (mut state, a) = state_with_agent("A", "a1");
        let b = state.graph.add_workspace(WorkspaceSpec::at(300.0, 0.0).named("B"));
        state.graph.connect_workspaces(&a, &b);
        state.graph.set_auto_run(&b, true);
        state
            .graph
            .set_task_template(&b, Some("summarize {{input}}".to_string()));

        apply(&mut state, &message("a1", "report text"));
        let triggers = apply(&mut state, &result("a1", true));
        assert_eq!(
            triggers,
            vec![AutoRunTrigger {
                workspace_id: b,
                source_workspace_id: a,
                task_template: "summarize {{input}}".to_string(),
            }]
        );
    }

    #[test]
    fn test_auto_run_requires_flag_and_template() {
        let (mut state, a) = state_with_agent("A", "a1");
        let no_flag = state.graph.add_workspace(WorkspaceSpec::at(300.0, 0.0));
        let no_template = state.graph.add_workspace(WorkspaceSpec::at(300.0, 300.0));
        state.graph.connect_workspaces(&a, &no_flag);
        state.graph.connect_workspaces(&a, &no_template);
        state.graph.set_task_template(&no_flag, Some("x".to_string()));
        state.graph.set_auto_run(&no_template, true);

        apply(&mut state, &message("a1", "out"));
        assert!(apply(&mut state, &result("a1", true)).is_empty());
    }

    #[test]
    fn test_fan_in_waits_for_every_input() {
        let mut state = WorkflowState::new();
        let p = state.graph.add_workspace(WorkspaceSpec::at(0.0, 0.0).named("P"));
        let q = state.graph.add_workspace(WorkspaceSpec::at(0.0, 300.0).named("Q"));
        let d = state.graph.add_workspace(WorkspaceSpec::at(300.0, 150.0).named("D"));
        state.graph.connect_workspaces(&p, &d);
        state.graph.connect_workspaces(&q, &d);
        state.graph.set_auto_run(&d, true);
        state.graph.set_task_template(&d, Some("X".to_string()));

        succeed(&mut state, &p, "p-out");
        assert!(!inputs_ready(&state.graph, &d));
        assert!(auto_run_triggers(&state.graph, &p).is_empty());

        succeed(&mut state, &q, "q-out");
        assert!(inputs_ready(&state.graph, &d));
        assert_eq!(auto_run_triggers(&state.graph, &q).len(), 1);
    }

    #[test]
    fn test_failed_input_blocks_readiness() {
        let mut state = WorkflowState::new();
        let p = state.graph.add_workspace(WorkspaceSpec::at(0.0, 0.0));
        let q = state.graph.add_workspace(WorkspaceSpec::at(0.0, 300.0));
        let d = state.graph.add_workspace(WorkspaceSpec::at(300.0, 150.0));
        state.graph.connect_workspaces(&p, &d);
        state.graph.connect_workspaces(&q, &d);

        succeed(&mut state, &p, "p-out");
        succeed(&mut state, &q, "q-out");
        state.graph.update_workspace_state(&q, WorkspaceState::Error);
        assert!(!inputs_ready(&state.graph, &d));

        state.graph.update_workspace_state(&q, WorkspaceState::Success);
        state.graph.set_last_output(&q, None);
        assert!(!inputs_ready(&state.graph, &d));
    }

    #[test]
    fn test_fan_in_refires_on_each_upstream_success() {
        let mut state = WorkflowState::new();
        let p = state.graph.add_workspace(WorkspaceSpec::at(0.0, 0.0).named("P"));
        let q = state.graph.add_workspace(WorkspaceSpec::at(0.0, 300.0).named("Q"));
        let d = state.graph.add_workspace(WorkspaceSpec::at(300.0, 150.0).named("D"));
        state.graph.connect_workspaces(&p, &d);
        state.graph.connect_workspaces(&q, &d);
        state.graph.set_auto_run(&d, true);
        state.graph.set_task_template(&d, Some("merge {{input}}".to_string()));
        succeed(&mut state, &q, "q-out");

        for (run, agent_id) in ["p1", "p2"].into_iter().enumerate() {
            for stale in state.agents.agents_for_workspace(&p) {
                state.agents.remove_agent(&stale);
            }
            state.agents.register(agent_id, p.clone(), "task");
            state.graph.set_workspace_agent(&p, Some(agent_id.to_string()));
            state.graph.update_workspace_state(&p, WorkspaceState::Working);

            apply(&mut state, &message(agent_id, &format!("p-out {run}")));
            let triggers = apply(&mut state, &result(agent_id, true));
            assert_eq!(triggers.len(), 1, "run {run}");
            assert_eq!(triggers[0].workspace_id, d);
            assert_eq!(triggers[0].source_workspace_id, p);
            assert_eq!(state.graph.get(&q).unwrap().state, WorkspaceState::Success);
        }
    }
}
