//! Console output for taskm commands.
//!
//! Every command renders either human text or a single JSON envelope on
//! stdout. Warnings and not-found reports go to stderr in human mode.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::shutdown::ShutdownReport;
use crate::task::{Priority, TaskRecord};

pub const SCHEMA_VERSION: &str = "taskm.v1";

const LIST_RULE_TOP: &str = "-------------------- TASKS --------------------";
const LIST_RULE_BOTTOM: &str = "-----------------------------------------------";
const LIST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    lines: Vec<String>,
    warnings: Vec<String>,
    to_stderr: bool,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            lines: Vec::new(),
            warnings: Vec::new(),
            to_stderr: false,
        }
    }

    /// A report that belongs on stderr and is shown even with `--quiet`.
    pub fn problem(header: impl Into<String>) -> Self {
        Self {
            to_stderr: true,
            ..Self::new(header)
        }
    }

    pub fn push_line(&mut self, value: impl Into<String>) {
        self.lines.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let Some(human) = human else {
        return Ok(());
    };

    for warning in &human.warnings {
        eprintln!("warning: {warning}");
    }

    if human.to_stderr {
        eprintln!("{}", format_human(human));
    } else if !options.quiet {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
            },
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Report the end of a run. JSON mode keeps stdout to the command envelope.
pub fn emit_shutdown(options: OutputOptions, report: &ShutdownReport) {
    if let Some(err) = &report.save_error {
        eprintln!("error: failed to save tasks: {err}");
        return;
    }
    if options.json || options.quiet {
        return;
    }
    if let Some(saved) = report.saved_tasks {
        println!("Tasks saved to file ({saved}).");
    }
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::with_capacity(output.lines.len() + 1);
    lines.push(output.header.clone());
    lines.extend(output.lines.iter().cloned());
    lines.join("\n")
}

/// Listing grouped under a header per priority. `tasks` must already be
/// sorted.
pub fn task_list(tasks: &[TaskRecord]) -> HumanOutput {
    if tasks.is_empty() {
        return HumanOutput::new("No tasks found.");
    }

    let mut output = HumanOutput::new(LIST_RULE_TOP);
    let mut current: Option<Priority> = None;
    for task in tasks {
        if current != Some(task.priority) {
            output.push_line("");
            output.push_line(format!("--- Priority: {} ---", task.priority));
            current = Some(task.priority);
        }
        output.push_line(task_line(task));
    }
    output.push_line(LIST_RULE_BOTTOM);
    output
}

fn task_line(task: &TaskRecord) -> String {
    let status = if task.done { "Done" } else { "Pending" };
    format!(
        "  ID: {:<4} | Status: {:<7} | Created: {} | Title: {}",
        task.id,
        status,
        task.created_at.format(LIST_TIME_FORMAT),
        task.title
    )
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        1 => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::InvalidArgument(_) => vec!["taskm --help".to_string()],
        Error::InvalidConfig(_) => vec!["fix taskm.toml then retry".to_string()],
        _ => Vec::new(),
    }
}
