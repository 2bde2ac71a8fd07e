//! Application state and command handlers.
//!
//! [`AppState::start`] builds everything a run needs from a [`Config`]: the
//! storage directory, the activity log, the task store loaded from disk and
//! the archiver. Handlers mutate the store, write an activity log entry and
//! hand the outcome back for rendering.

use std::path::PathBuf;
use std::sync::Arc;

use crate::archiver::Archiver;
use crate::codec::{self, LoadedTasks};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logger::{self, AsyncLogger, LoggerWorker};
use crate::store::{DeleteOutcome, MarkDoneOutcome, TaskStore};
use crate::task::{sort_tasks, Priority, TaskRecord};

/// Background workers created at startup, not yet running
#[derive(Debug)]
pub struct Workers {
    pub logger: LoggerWorker,
    pub archiver: Archiver,
}

/// What was found on disk at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupSummary {
    pub loaded: usize,
    pub skipped: usize,
    pub max_id: u64,
    pub archived: usize,
}

#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<TaskStore>,
    pub logger: AsyncLogger,
    pub startup: StartupSummary,
}

impl AppState {
    /// Prepare storage, open the activity log and load tasks.
    ///
    /// Failing to create the storage directory or open the log file is
    /// fatal. An unreadable task file starts an empty store instead.
    pub async fn start(config: Config) -> Result<(Self, Workers)> {
        let dir = config.storage.dir.clone();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| Error::storage(&dir, err))?;

        let (logger, logger_worker) =
            logger::open(&config.log_path(), config.logger.queue_capacity).await?;
        logger.log("Application starting");

        let tasks_path = config.tasks_path();
        let loaded = match load_blocking(tasks_path.clone()).await? {
            Ok(loaded) => {
                logger.log(format!(
                    "Loaded {} tasks. Highest task ID: {}",
                    loaded.tasks.len(),
                    loaded.max_id
                ));
                loaded
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load tasks, starting empty");
                logger.log(format!("Failed to load tasks: {err}"));
                LoadedTasks::default()
            }
        };

        // Done tasks may have been archived and then deleted from the live
        // file; their ids must not come back.
        let archive_path = config.archive_path();
        let archive = match load_blocking(archive_path.clone()).await? {
            Ok(archive) => archive,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read archive, not seeding archived ids");
                LoadedTasks::default()
            }
        };

        let startup = StartupSummary {
            loaded: loaded.tasks.len(),
            skipped: loaded.skipped.len(),
            max_id: loaded.max_id,
            archived: archive.tasks.len(),
        };

        let store = Arc::new(TaskStore::from_records(loaded.tasks, loaded.max_id));
        store.ids().advance(archive.max_id);

        let archiver = Archiver::new(
            archive_path,
            Arc::clone(&store),
            config.archive_interval()?,
            config.archive.skip_archived,
        )
        .with_archived_ids(archive.tasks.iter().map(|task| task.id));

        tracing::debug!(?startup, dir = %dir.display(), "application state ready");

        let state = Self {
            config,
            store,
            logger,
            startup,
        };
        let workers = Workers {
            logger: logger_worker,
            archiver,
        };
        Ok((state, workers))
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.config.tasks_path()
    }

    pub fn add_task(&self, title: &str, priority: Priority) -> Result<TaskRecord> {
        if title.trim().is_empty() {
            return Err(Error::InvalidArgument("task title cannot be empty".to_string()));
        }

        let task = self.store.add(title, priority);
        self.logger.log(format!(
            "Task added ID {}: \"{}\" priority: {}",
            task.id, task.title, task.priority
        ));
        Ok(task)
    }

    /// All tasks, highest priority first and oldest first within a priority.
    pub fn list_tasks(&self) -> Vec<TaskRecord> {
        let mut tasks = self.store.list();
        sort_tasks(&mut tasks);
        if tasks.is_empty() {
            self.logger.log("Listed tasks: none found");
        } else {
            self.logger.log(format!("Listed {} tasks", tasks.len()));
        }
        tasks
    }

    pub fn complete_task(&self, id: u64) -> MarkDoneOutcome {
        let outcome = self.store.mark_done(id);
        let message = match &outcome {
            MarkDoneOutcome::Completed(task) => {
                format!("Marked task ID {} as done: \"{}\"", task.id, task.title)
            }
            MarkDoneOutcome::AlreadyDone(_) => {
                format!("Task ID {id} was already done")
            }
            MarkDoneOutcome::NotFound => {
                format!("Failed to mark task ID {id} as done: not found")
            }
        };
        self.logger.log(message);
        outcome
    }

    pub fn delete_task(&self, id: u64) -> DeleteOutcome {
        let outcome = self.store.delete(id);
        let message = match &outcome {
            DeleteOutcome::Deleted(task) => {
                format!("Deleted task ID {}: \"{}\"", task.id, task.title)
            }
            DeleteOutcome::NotFound => format!("Failed to delete task ID {id}: not found"),
        };
        self.logger.log(message);
        outcome
    }
}

async fn load_blocking(path: PathBuf) -> Result<Result<LoadedTasks>> {
    Ok(tokio::task::spawn_blocking(move || codec::load(&path)).await?)
}
