//! In-memory task store.
//!
//! Every operation takes the store mutex for its whole duration and releases
//! it before returning. Only [`TaskStore::save_to`] performs I/O under the
//! lock, and it is meant for the final save at shutdown.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::codec;
use crate::error::Result;
use crate::id_gen::IdGenerator;
use crate::task::{Priority, TaskRecord};

/// Result of marking a task done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkDoneOutcome {
    Completed(TaskRecord),
    AlreadyDone(TaskRecord),
    NotFound,
}

/// Result of deleting a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(TaskRecord),
    NotFound,
}

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Mutex<Vec<TaskRecord>>,
    ids: IdGenerator,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from previously loaded records.
    ///
    /// The id generator starts after `max_id`.
    pub fn from_records(tasks: Vec<TaskRecord>, max_id: u64) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ids: IdGenerator::new(max_id),
        }
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    // Records are plain values; a panic in another holder cannot leave them
    // in a state worth refusing to read.
    fn lock(&self) -> MutexGuard<'_, Vec<TaskRecord>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a pending task and return a copy of it.
    pub fn add(&self, title: impl Into<String>, priority: Priority) -> TaskRecord {
        let mut tasks = self.lock();
        let task = TaskRecord::new(self.ids.next(), title, priority);
        tasks.push(task.clone());
        task
    }

    /// Snapshot of all tasks in backing order.
    pub fn list(&self) -> Vec<TaskRecord> {
        self.lock().clone()
    }

    /// Copies of every completed task.
    pub fn completed(&self) -> Vec<TaskRecord> {
        self.lock().iter().filter(|task| task.done).cloned().collect()
    }

    pub fn mark_done(&self, id: u64) -> MarkDoneOutcome {
        let mut tasks = self.lock();
        match tasks.iter_mut().find(|task| task.id == id) {
            Some(task) if task.done => MarkDoneOutcome::AlreadyDone(task.clone()),
            Some(task) => {
                task.done = true;
                MarkDoneOutcome::Completed(task.clone())
            }
            None => MarkDoneOutcome::NotFound,
        }
    }

    /// Remove the first task with `id`.
    ///
    /// The last task is moved into the freed slot, so the relative order of
    /// the remaining tasks is not preserved. Listing sorts anyway.
    pub fn delete(&self, id: u64) -> DeleteOutcome {
        let mut tasks = self.lock();
        match tasks.iter().position(|task| task.id == id) {
            Some(index) => DeleteOutcome::Deleted(tasks.swap_remove(index)),
            None => DeleteOutcome::NotFound,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Atomically rewrite `path` with the current tasks while holding the lock.
    ///
    /// Returns the number of tasks written.
    pub fn save_to(&self, path: &Path) -> Result<usize> {
        let tasks = self.lock();
        codec::save(path, &tasks)?;
        Ok(tasks.len())
    }
}
