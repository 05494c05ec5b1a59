// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for event reconciliation and prompt composition.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use giga_workflow::dispatch::compose_prompt;
use giga_workflow::events::{self, AgentEvent};
use giga_workflow::graph::{WorkspaceSpec, WorkspaceState};
use giga_workflow::WorkflowState;

/// A workflow with one registered agent bound to one workspace.
fn single_agent() -> (WorkflowState, String) {
    let mut state = WorkflowState::new();
    let ws = state.graph.add_workspace(WorkspaceSpec::at(0.0, 0.0));
    state.agents.register("agent-1", ws.clone(), "bench");
    state.graph.set_workspace_agent(&ws, Some("agent-1".to_string()));
    (state, ws)
}

/// Benchmark applying streamed message and tool events.
fn bench_event_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciler/stream");

    let message = AgentEvent::Message {
        agent_id: "agent-1".to_string(),
        content: "Counting: 1, 2, 3".to_string(),
    };
    let tool_use = AgentEvent::ToolUse {
        agent_id: "agent-1".to_string(),
        tool_name: "Read".to_string(),
        tool_input: serde_json::json!({ "file_path": "src/lib.rs" }),
    };

    group.bench_function("message", |b| {
        let (mut state, _) = single_agent();
        b.iter(|| events::apply(&mut state, black_box(&message)));
    });

    group.bench_function("tool_use", |b| {
        let (mut state, _) = single_agent();
        b.iter(|| events::apply(&mut state, black_box(&tool_use)));
    });

    group.finish();
}

/// Benchmark a result event, which joins logs and evaluates readiness.
fn bench_result(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciler/result");

    for fan_out in [1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::new("fan_out", fan_out), &fan_out, |b, &n| {
            b.iter_with_setup(
                || {
                    let (mut state, source) = single_agent();
                    for i in 0..50 {
                        events::apply(
                            &mut state,
                            &AgentEvent::Message {
                                agent_id: "agent-1".to_string(),
                                content: format!("line {i}"),
                            },
                        );
                    }
                    for i in 0..n {
                        let id = state
                            .graph
                            .add_workspace(WorkspaceSpec::at(300.0, i as f64 * 250.0));
                        state.graph.connect_workspaces(&source, &id);
                        state.graph.set_auto_run(&id, true);
                        state.graph.set_task_template(&id, Some("next {{input}}".to_string()));
                    }
                    state
                },
                |mut state| {
                    events::apply(
                        &mut state,
                        black_box(&AgentEvent::Result {
                            agent_id: "agent-1".to_string(),
                            success: true,
                            duration_ms: 10,
                        }),
                    )
                },
            );
        });
    }

    group.finish();
}

/// Benchmark composing a prompt from many upstream outputs.
fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/compose");

    for inputs in [1usize, 8, 32] {
        let mut state = WorkflowState::new();
        let target = state.graph.add_workspace(WorkspaceSpec::at(600.0, 0.0));
        for i in 0..inputs {
            let id = state
                .graph
                .add_workspace(WorkspaceSpec::at(0.0, i as f64 * 250.0));
            state.graph.update_workspace_state(&id, WorkspaceState::Success);
            state.graph.set_last_output(&id, Some("output ".repeat(200)));
            state.graph.connect_workspaces(&id, &target);
        }

        group.bench_with_input(BenchmarkId::new("inputs", inputs), &state, |b, state| {
            b.iter(|| compose_prompt(&state.graph, black_box(&target), "summarize {{input}}"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_event_stream, bench_result, bench_compose);
criterion_main!(benches);
