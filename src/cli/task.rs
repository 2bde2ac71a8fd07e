//! Task operations: add, list, done, delete
//!
//! Not-found and already-done are reported, not errors.

use serde::Serialize;

use crate::app::AppState;
use crate::error::Result;
use crate::output::{emit_success, task_list, HumanOutput, OutputOptions};
use crate::store::{DeleteOutcome, MarkDoneOutcome};
use crate::task::{Priority, TaskRecord};

use super::Operation;

const USAGE: &str = "Usage: --add <TITLE> [--priority high|medium|low], --list, --done <ID>, --delete <ID>";

#[derive(Serialize)]
struct TaskReport<'a> {
    outcome: &'static str,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<&'a TaskRecord>,
}

#[derive(Serialize)]
struct ListReport<'a> {
    count: usize,
    tasks: &'a [TaskRecord],
}

#[derive(Serialize)]
struct UsageReport {
    usage: &'static str,
}

pub(super) fn run(state: &AppState, operation: Operation, options: OutputOptions) -> Result<()> {
    match operation {
        Operation::Add { title, priority } => run_add(state, &title, &priority, options),
        Operation::List => run_list(state, options),
        Operation::Done(id) => run_done(state, id, options),
        Operation::Delete(id) => run_delete(state, id, options),
    }
}

pub(super) fn banner(options: OutputOptions) -> Result<()> {
    let mut human = HumanOutput::new("taskm - task manager");
    human.push_line(USAGE);
    emit_success(options, "taskm", &UsageReport { usage: USAGE }, Some(&human))
}

fn run_add(state: &AppState, title: &str, raw_priority: &str, options: OutputOptions) -> Result<()> {
    let (priority, coerced) = Priority::parse_lenient(raw_priority);
    let task = state.add_task(title, priority)?;

    let mut human = HumanOutput::new(format!("Task added with ID {}.", task.id));
    if coerced {
        human.push_warning(format!(
            "invalid priority '{raw_priority}', using '{}'",
            Priority::default()
        ));
    }

    let report = TaskReport {
        outcome: "added",
        id: task.id,
        task: Some(&task),
    };
    emit_success(options, "add", &report, Some(&human))
}

fn run_list(state: &AppState, options: OutputOptions) -> Result<()> {
    let tasks = state.list_tasks();
    let human = task_list(&tasks);
    let report = ListReport {
        count: tasks.len(),
        tasks: &tasks,
    };
    emit_success(options, "list", &report, Some(&human))
}

fn run_done(state: &AppState, id: u64, options: OutputOptions) -> Result<()> {
    let outcome = state.complete_task(id);
    let (report, human) = match &outcome {
        MarkDoneOutcome::Completed(task) => (
            TaskReport {
                outcome: "completed",
                id,
                task: Some(task),
            },
            HumanOutput::new(format!("Marked task with ID {id} as done.")),
        ),
        MarkDoneOutcome::AlreadyDone(task) => (
            TaskReport {
                outcome: "already_done",
                id,
                task: Some(task),
            },
            HumanOutput::new(format!("Task with ID {id} is already marked as done.")),
        ),
        MarkDoneOutcome::NotFound => (
            TaskReport {
                outcome: "not_found",
                id,
                task: None,
            },
            HumanOutput::problem(format!("Error: Task with ID {id} not found.")),
        ),
    };
    emit_success(options, "done", &report, Some(&human))
}

fn run_delete(state: &AppState, id: u64, options: OutputOptions) -> Result<()> {
    let outcome = state.delete_task(id);
    let (report, human) = match &outcome {
        DeleteOutcome::Deleted(task) => (
            TaskReport {
                outcome: "deleted",
                id,
                task: Some(task),
            },
            HumanOutput::new(format!("Deleted task with ID {id}.")),
        ),
        DeleteOutcome::NotFound => (
            TaskReport {
                outcome: "not_found",
                id,
                task: None,
            },
            HumanOutput::problem(format!("Error: Task with ID {id} not found for deletion.")),
        ),
    };
    emit_success(options, "delete", &report, Some(&human))
}
