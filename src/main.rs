// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Giga main entry point - CLI and commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use giga_workflow::config::{self, CliOptions, ResolvedConfig};
use giga_workflow::dispatch::TaskOptions;
use giga_workflow::graph::{WorkspaceState, DEFAULT_WORKSPACE_SIZE};
use giga_workflow::orchestrate::{Commander, EventLoop};
use giga_workflow::runner::HttpRunner;
use giga_workflow::telemetry::{init_telemetry, TelemetryConfig};
use giga_workflow::types::{CliType, WorkspaceId, AVAILABLE_MODELS};
use giga_workflow::WorkflowState;

/// Gap between pipeline workspaces on the canvas.
const PIPELINE_SPACING: f64 = 50.0;
/// How long to wait for the runner's event stream before giving up.
const STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Giga - orchestrate coding-agent CLIs as a workflow graph.
#[derive(Parser)]
#[command(name = "giga")]
#[command(author, version, about = "Orchestrate coding-agent CLIs as a workflow graph", long_about = None)]
struct Cli {
    /// Base URL of the agent runner
    #[arg(long, env = "GIGA_RUNNER_URL", global = true)]
    runner_url: Option<String>,

    /// Agent CLI for new workspaces (claude, cursor, kilo, gemini, grok, deepseek)
    #[arg(long, env = "GIGA_CLI", global = true)]
    cli: Option<CliType>,

    /// Model for new workspaces
    #[arg(short, long, env = "GIGA_MODEL", global = true)]
    model: Option<String>,

    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Show debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Show trace output (full payloads)
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for task results.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Subcommands for giga.
#[derive(Subcommand)]
enum Commands {
    /// Run one task in a fresh workspace and print its output
    Run {
        /// The task prompt
        prompt: String,

        /// Workspace name
        #[arg(long)]
        name: Option<String>,

        /// System prompt for the agent
        #[arg(long)]
        system_prompt: Option<String>,

        /// Seconds to wait for the task to finish
        #[arg(long, default_value_t = 600)]
        timeout: u64,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a chain of tasks, feeding each step's output into the next
    Pipeline {
        /// One prompt per step, in order. Use {{input}} to place upstream output.
        #[arg(required = true)]
        steps: Vec<String>,

        /// Seconds to wait for the whole pipeline
        #[arg(long, default_value_t = 1800)]
        timeout: u64,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List agents known to the runner
    Agents,

    /// Cancel a running agent
    Stop {
        /// Agent to cancel
        #[arg(required_unless_present = "all")]
        agent_id: Option<String>,

        /// Cancel every agent
        #[arg(long, conflicts_with = "agent_id")]
        all: bool,
    },

    /// Check which agent CLIs the runner can execute
    Check {
        /// Only check this CLI
        cli: Option<CliType>,
    },

    /// List runner skills, or show one
    Skills {
        /// Skill to show
        name: Option<String>,
    },

    /// List selectable models
    Models,

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved configuration
    Show,
    /// Write an example .giga.json in the current directory
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_telemetry(&TelemetryConfig::from_flags(cli.verbose, cli.debug, cli.trace))?;

    let cli_options = CliOptions {
        runner_url: cli.runner_url,
        cli: cli.cli,
        model: cli.model,
    };

    let result = handle_command(cli.command, cli_options).await;

    #[cfg(feature = "telemetry")]
    if cli.verbose {
        print_metrics();
    }

    result
}

async fn handle_command(command: Commands, cli_options: CliOptions) -> anyhow::Result<()> {
    let resolve = || config::load_config(&workspace_root()?, cli_options.clone()).map_err(anyhow::Error::from);

    match command {
        Commands::Run {
            prompt,
            name,
            system_prompt,
            timeout,
            format,
        } => {
            run_task(&resolve()?, &prompt, name, system_prompt, timeout, format).await?;
        }
        Commands::Pipeline {
            steps,
            timeout,
            format,
        } => {
            run_pipeline(&resolve()?, &steps, timeout, format).await?;
        }
        Commands::Agents => {
            let agents = build_commander(&resolve()?)?.live_agents().await?;
            if agents.is_empty() {
                println!("{}", "No agents running".dimmed());
            }
            for agent_id in agents {
                println!("{agent_id}");
            }
        }
        Commands::Stop { agent_id, all } => {
            let commander = build_commander(&resolve()?)?;
            if all {
                commander.stop_all().await?;
                println!("{} Cancelled all agents", "✓".green());
            } else if let Some(agent_id) = agent_id {
                commander.stop_task(&agent_id).await?;
                println!("{} {}", "✓".green(), commander.status());
            }
        }
        Commands::Check { cli } => {
            let commander = build_commander(&resolve()?)?;
            let targets = match cli {
                Some(cli) => vec![cli],
                None => CliType::ALL.to_vec(),
            };
            for cli in targets {
                let available = commander.check_cli(cli).await?;
                let mark = if available { "✓".green() } else { "✗".red() };
                println!("{mark} {} ({})", cli.to_string().bright_white(), cli.binary().dimmed());
            }
        }
        Commands::Skills { name } => {
            let commander = build_commander(&resolve()?)?;
            match name {
                Some(name) => {
                    let skill = commander.skill(&name).await?;
                    println!("{}", skill.info.name.bright_cyan().bold());
                    println!("{}", skill.path.dimmed());
                    println!("\n{}", skill.markdown);
                }
                None => {
                    for skill in commander.skills().await? {
                        println!("{} - {}", skill.name.bright_white(), skill.description);
                    }
                }
            }
        }
        Commands::Models => {
            let config = resolve()?;
            for model in AVAILABLE_MODELS {
                let marker = if model.id == config.default_model { "*" } else { " " };
                println!(
                    "{marker} {} [{}] - {}",
                    model.name.bright_white(),
                    model.id,
                    model.description
                );
            }
        }
        Commands::Config { action } => {
            handle_config_command(action.unwrap_or(ConfigAction::Show), &cli_options)?;
        }
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, cli_options: &CliOptions) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = config::load_config(&workspace_root()?, cli_options.clone())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Init => {
            let path = config::init_config(&std::env::current_dir()?, None)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

fn workspace_root() -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(config::find_workspace_root(&cwd).unwrap_or(cwd))
}

fn build_commander(config: &ResolvedConfig) -> anyhow::Result<Commander> {
    let runner = HttpRunner::new(config.runner_url.clone())
        .with_context(|| format!("Failed to create runner client for {}", config.runner_url))?
        .with_stream_options(config.stream_options());
    Ok(Commander::new(Arc::new(runner), config.commander_config()))
}

/// Start the event loop and wait for the stream to connect. Dispatching
/// earlier would lose the agent's first events.
async fn connect_events(
    commander: &Commander,
    config: &ResolvedConfig,
) -> anyhow::Result<EventLoop> {
    let mut events = commander.spawn_event_loop();
    let connected = tokio::time::timeout(STREAM_CONNECT_TIMEOUT, events.wait_connected())
        .await
        .unwrap_or(false);
    if !connected {
        events.abort();
        bail!("Runner event stream unavailable at {}", config.runner_url);
    }
    Ok(events)
}

fn is_settled(state: WorkspaceState) -> bool {
    matches!(state, WorkspaceState::Success | WorkspaceState::Error)
}

fn workspace_state(state: &WorkflowState, id: &str) -> Option<WorkspaceState> {
    state.graph.get(id).map(|ws| ws.state)
}

/// Wait for `done`, cancelling whatever is still bound on timeout.
async fn wait_for(
    commander: &Commander,
    ids: &[WorkspaceId],
    timeout_secs: u64,
    done: impl FnMut(&WorkflowState) -> bool,
) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(timeout_secs);
    if tokio::time::timeout(timeout, commander.wait_until(done))
        .await
        .is_ok()
    {
        return Ok(());
    }

    let bound: Vec<_> = commander.read(|state| {
        ids.iter()
            .filter_map(|id| state.graph.get(id)?.agent_id.clone())
            .collect()
    });
    for agent_id in bound {
        let _ = commander.stop_task(&agent_id).await;
    }
    bail!("Timed out after {timeout_secs}s");
}

async fn run_task(
    config: &ResolvedConfig,
    prompt: &str,
    name: Option<String>,
    system_prompt: Option<String>,
    timeout: u64,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let commander = build_commander(config)?;
    let events = connect_events(&commander, config).await?;

    let mut spec = config.workspace_spec(0.0, 0.0);
    if let Some(name) = name {
        spec = spec.named(name);
    }
    if let Some(prompt) = system_prompt {
        spec = spec.with_system_prompt(prompt);
    }
    let ws = commander.add_workspace(spec);

    let agent_id = commander.start_task(&ws, prompt, TaskOptions::new()).await?;
    if let OutputFormat::Text = format {
        eprintln!("{} Dispatched agent {}", "→".cyan(), agent_id.dimmed());
    }

    let ids = [ws.clone()];
    let waited = wait_for(&commander, &ids, timeout, |state| {
        workspace_state(state, &ws).is_some_and(is_settled)
    })
    .await;
    events.abort();
    waited?;

    let (workspace, agent) = commander.read(|state| {
        (state.graph.get(&ws).cloned(), state.agent_for(&ws).cloned())
    });
    let workspace = workspace.context("workspace disappeared")?;
    let success = workspace.state == WorkspaceState::Success;

    match format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "success": success,
                "workspaceId": workspace.id,
                "agentId": agent.as_ref().map(|a| a.id.clone()),
                "output": workspace.last_output,
                "error": agent.as_ref().and_then(|a| a.error.clone()),
                "durationMs": agent.as_ref().and_then(|a| a.duration()).map(|d| d.num_milliseconds()),
                "status": commander.status(),
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            if let Some(output) = &workspace.last_output {
                println!("{output}");
            }
            if !success {
                let reason = agent
                    .and_then(|a| a.error)
                    .unwrap_or_else(|| commander.status());
                eprintln!("{}", reason.red());
            }
        }
    }

    if !success {
        bail!("Task failed");
    }
    Ok(())
}

async fn run_pipeline(
    config: &ResolvedConfig,
    steps: &[String],
    timeout: u64,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let commander = build_commander(config)?;
    let events = connect_events(&commander, config).await?;

    let ids: Vec<WorkspaceId> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let x = i as f64 * (DEFAULT_WORKSPACE_SIZE + PIPELINE_SPACING);
            let id = commander.add_workspace(config.workspace_spec(x, 0.0).named(format!("Step {}", i + 1)));
            commander.with_graph_mut(|graph| {
                graph.set_task_template(&id, Some(step.clone()));
                graph.set_auto_run(&id, i > 0);
            });
            id
        })
        .collect();

    for pair in ids.windows(2) {
        commander.connect(&pair[0], &pair[1])?;
    }

    let Some((first, last)) = ids.first().zip(ids.last()) else {
        bail!("A pipeline needs at least one step");
    };
    commander.run_workspace(first).await?;

    let waited = wait_for(&commander, &ids, timeout, |state| {
        workspace_state(state, last) == Some(WorkspaceState::Success)
            || ids
                .iter()
                .any(|id| workspace_state(state, id) == Some(WorkspaceState::Error))
    })
    .await;
    events.abort();
    waited?;

    let state = commander.snapshot();
    let results: Vec<_> = ids.iter().filter_map(|id| state.graph.get(id)).collect();
    let success = results.iter().all(|ws| ws.state == WorkspaceState::Success);

    match format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "success": success,
                "steps": results.iter().map(|ws| serde_json::json!({
                    "name": ws.name,
                    "state": ws.state,
                    "output": ws.last_output,
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            for ws in &results {
                let mark = match ws.state {
                    WorkspaceState::Success => "✓".green(),
                    WorkspaceState::Error => "✗".red(),
                    _ => "·".dimmed(),
                };
                eprintln!("{mark} {} ({})", ws.name.bright_white(), ws.state);
            }
            if let Some(output) = results.last().and_then(|ws| ws.last_output.as_ref()) {
                println!("{output}");
            }
        }
    }

    if !success {
        bail!("Pipeline failed");
    }
    Ok(())
}

#[cfg(feature = "telemetry")]
fn print_metrics() {
    let snapshot = giga_workflow::telemetry::GLOBAL_METRICS.snapshot();
    eprintln!("\n{}", "Metrics".bright_blue().bold());
    eprintln!("  events:        {}", snapshot.total_events());
    for (kind, count) in &snapshot.events {
        eprintln!("    {kind:<12} {count}");
    }
    eprintln!(
        "  dispatches:    {} ({} failed, avg {:?})",
        snapshot.dispatch.count,
        snapshot.dispatch.failures,
        snapshot.dispatch.avg_duration()
    );
    eprintln!("  auto-runs:     {}", snapshot.auto_runs);
    eprintln!("  cancellations: {}", snapshot.cancellations);
}
