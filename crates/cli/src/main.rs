//! Unlock CLI - drive objective progression from the terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use unlock_core::{
    format_timestamp, GateContext, GradeResult, ObjectiveDefinition, SystemClock, Timestamp,
    UnlockConfig,
};
use unlock_progress::ObjectiveTracker;
use unlock_storage::JsonFileStore;

#[derive(Parser)]
#[command(name = "unlock")]
#[command(about = "Sequential objective gating", long_about = None)]
struct Cli {
    /// Objective definitions (JSON array)
    #[arg(long, default_value = "objectives.json")]
    definitions: PathBuf,

    /// Persistent state
    #[arg(long, default_value = ".unlock/store.json")]
    store: PathBuf,

    /// Gating configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress of every objective
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start an objective
    Start {
        /// Objective key
        key: String,
    },
    /// Accomplish an objective once all tasks are completed
    Accomplish {
        /// Objective key
        key: String,
        /// Evaluate at this epoch-millisecond time instead of the local clock
        #[arg(long)]
        trusted_time: Option<Timestamp>,
    },
    /// Confirm a confirmation task
    Confirm {
        /// Objective key
        key: String,
        /// Task position within the objective
        task: usize,
    },
    /// Submit answers to an exam task
    Answer {
        /// Objective key
        key: String,
        /// Task position within the objective
        task: usize,
        /// Positions of the selected options
        selected: Vec<usize>,
    },
    /// Undo a start
    RevertStart {
        /// Objective key
        key: String,
    },
    /// Undo an accomplishment
    RevertAccomplish {
        /// Objective key
        key: String,
    },
    /// Reset all progress
    Reset,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => UnlockConfig::default(),
    };
    let store = JsonFileStore::open(&cli.store)
        .with_context(|| format!("Failed to open store {}", cli.store.display()))?;
    let ctx = GateContext::from_shared(Arc::new(store), Arc::new(SystemClock)).with_config(config);

    let definitions = std::fs::read_to_string(&cli.definitions)
        .with_context(|| format!("Failed to read {}", cli.definitions.display()))?;
    let definitions = ObjectiveDefinition::from_json(&definitions)?;
    let mut tracker = ObjectiveTracker::from_definitions(&definitions, &ctx)?;

    match cli.command {
        Commands::Status { json } => {
            let snapshot = tracker.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                return Ok(());
            }

            println!("Objectives ({})", snapshot.objectives.len());
            for (index, objective) in snapshot.objectives.iter().enumerate() {
                let marker = if snapshot.current == Some(index) { ">" } else { " " };
                println!(
                    "{} {} | {} | {}",
                    marker, objective.key, objective.status, objective.title
                );
                if objective.started_at != 0 {
                    println!("    started:      {}", format_timestamp(objective.started_at));
                }
                if objective.accomplished_at != 0 {
                    println!("    accomplished: {}", format_timestamp(objective.accomplished_at));
                }
                for (position, task) in objective.tasks.iter().enumerate() {
                    let check = if task.completed { "x" } else { " " };
                    println!("    [{}] {}. {} - {}", check, position, task.title, task.progress);
                }
            }
        }
        Commands::Start { key } => {
            let index = tracker.index_of(&key)?;
            let started_at = tracker.start(index)?;
            println!("Started {} at {}", key, format_timestamp(started_at));
        }
        Commands::Accomplish { key, trusted_time } => {
            let index = tracker.index_of(&key)?;
            let accomplished_at = tracker.accomplish(index, trusted_time)?;
            println!("Accomplished {} at {}", key, format_timestamp(accomplished_at));
        }
        Commands::Confirm { key, task } => {
            let index = tracker.index_of(&key)?;
            let confirmation = tracker
                .get_mut(index)
                .and_then(|o| o.task_mut(task))
                .and_then(|t| t.as_confirmation_mut())
                .ok_or_else(|| anyhow!("Task {} of {} is not a confirmation task", task, key))?;
            confirmation.record_answer(true)?;
            println!("Confirmed task {} of {}", task, key);
        }
        Commands::Answer { key, task, selected } => {
            let index = tracker.index_of(&key)?;
            let exam = tracker
                .get_mut(index)
                .and_then(|o| o.task_mut(task))
                .and_then(|t| t.as_exam_mut())
                .ok_or_else(|| anyhow!("Task {} of {} is not an exam task", task, key))?;

            match exam.submit(selected)? {
                GradeResult::Passed => println!("Correct"),
                GradeResult::Failed {
                    incorrect,
                    disabled_until,
                } => {
                    println!("Wrong answers for options {:?}", incorrect);
                    println!("Try again after {}", format_timestamp(disabled_until));
                }
                GradeResult::Locked { until } => {
                    println!("Answering is locked until {}", format_timestamp(until));
                }
            }
        }
        Commands::RevertStart { key } => {
            let index = tracker.index_of(&key)?;
            tracker.revert_start(index)?;
            println!("Reverted start of {}", key);
        }
        Commands::RevertAccomplish { key } => {
            let index = tracker.index_of(&key)?;
            tracker.revert_accomplish(index)?;
            println!("Reverted accomplishment of {}", key);
        }
        Commands::Reset => {
            tracker.reset()?;
            info!("Progress reset");
            println!("All objectives reset");
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<UnlockConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: UnlockConfig = serde_json::from_str(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}
