//! Command-line interface for taskm
//!
//! A single command with four mutually exclusive operations. After the
//! operation runs the process keeps its background workers alive until
//! SIGINT/SIGTERM (or right away with `--once`), then shuts down and saves.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::app::AppState;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_shutdown, OutputOptions};
use crate::shutdown::{ShutdownCoordinator, TerminationSignals};

mod task;

/// taskm - a small task manager
///
/// Tasks live in a pipe-delimited text file. Completed tasks are copied to an
/// archive file in the background and every action is recorded in an
/// activity log.
#[derive(Parser, Debug)]
#[command(name = "taskm")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("operation")
        .args(["add", "list", "done", "delete"])
        .multiple(false)
))]
pub struct Cli {
    /// Add a task with this title
    #[arg(long, value_name = "TITLE")]
    pub add: Option<String>,

    /// Priority for --add: high, medium, low
    #[arg(long, value_name = "PRIORITY", default_value = "medium")]
    pub priority: String,

    /// List tasks grouped by priority
    #[arg(long)]
    pub list: bool,

    /// Mark the task with this ID as done
    #[arg(long, value_name = "ID")]
    pub done: Option<u64>,

    /// Delete the task with this ID
    #[arg(long, value_name = "ID")]
    pub delete: Option<u64>,

    /// Directory holding tasks, archive and log files
    #[arg(long, env = "TASKM_STORAGE_DIR", value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Path to a taskm.toml configuration file
    #[arg(long, env = "TASKM_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Shut down right after the operation instead of waiting for a signal
    #[arg(long, env = "TASKM_ONCE")]
    pub once: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

/// The operation selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add { title: String, priority: String },
    List,
    Done(u64),
    Delete(u64),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "add",
            Operation::List => "list",
            Operation::Done(_) => "done",
            Operation::Delete(_) => "delete",
        }
    }
}

/// Parsed invocation plus whether any arguments were given at all
#[derive(Debug)]
pub struct Invocation {
    pub cli: Cli,
    pub had_args: bool,
}

impl Invocation {
    /// Parse `args` (including the program name).
    pub fn try_parse_from<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let had_args = args.len() > 1;
        let cli = Cli::try_parse_from(args)?;
        Ok(Self { cli, had_args })
    }

    pub fn command_name(&self) -> &'static str {
        self.cli.operation().map(|op| op.name()).unwrap_or("taskm")
    }

    pub fn json(&self) -> bool {
        self.cli.json
    }

    /// Execute the operation, then wait for termination and shut down.
    pub async fn run(self) -> Result<()> {
        let Invocation { cli, had_args } = self;
        let options = OutputOptions {
            json: cli.json,
            quiet: cli.quiet,
        };

        let operation = cli.operation();
        match &operation {
            None if had_args => {
                return Err(Error::InvalidArgument(
                    "no operation given; use --add, --list, --done or --delete".to_string(),
                ));
            }
            Some(Operation::Add { title, .. }) if title.trim().is_empty() => {
                return Err(Error::InvalidArgument(
                    "task title cannot be empty".to_string(),
                ));
            }
            _ => {}
        }

        let config = Config::resolve(cli.config.as_deref(), cli.storage_dir.as_deref())?;
        let mut signals = if cli.once {
            None
        } else {
            Some(TerminationSignals::install()?)
        };
        let coordinator = ShutdownCoordinator::new(config.shutdown_timeout()?);
        let (state, workers) = AppState::start(config).await?;
        coordinator.spawn_workers(workers);

        let outcome = match operation {
            Some(operation) => task::run(&state, operation, options),
            None => task::banner(options),
        };

        if let (Ok(()), Some(signals)) = (&outcome, signals.as_mut()) {
            wait_for_termination(signals, options).await;
        }

        let report = coordinator.shutdown(&state).await;
        emit_shutdown(options, &report);
        outcome
    }
}

impl Cli {
    /// The selected operation, if any.
    pub fn operation(&self) -> Option<Operation> {
        if let Some(title) = &self.add {
            return Some(Operation::Add {
                title: title.clone(),
                priority: self.priority.clone(),
            });
        }
        if self.list {
            return Some(Operation::List);
        }
        if let Some(id) = self.done {
            return Some(Operation::Done(id));
        }
        self.delete.map(Operation::Delete)
    }
}

async fn wait_for_termination(signals: &mut TerminationSignals, options: OutputOptions) {
    if !options.quiet && !options.json {
        eprintln!("Running. Press Ctrl+C to save and exit.");
    }
    match signals.recv().await {
        Ok(signal) => tracing::info!(signal, "termination signal received"),
        Err(err) => tracing::warn!(error = %err, "signal handler failed, shutting down"),
    }
}
