//! Periodic copy of completed tasks into the archive file.
//!
//! The live store is only read. Each tick takes a snapshot of done tasks
//! under the store lock, releases it, and appends outside the lock.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::codec;
use crate::error::Result;
use crate::store::TaskStore;

/// Outcome of one archive pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveTick {
    /// Done tasks seen in the store
    pub completed: usize,
    /// Records written to the archive file
    pub appended: usize,
}

#[derive(Debug)]
pub struct Archiver {
    path: PathBuf,
    store: Arc<TaskStore>,
    interval: Duration,
    skip_archived: bool,
    archived: HashSet<u64>,
}

impl Archiver {
    pub fn new(
        path: impl Into<PathBuf>,
        store: Arc<TaskStore>,
        interval: Duration,
        skip_archived: bool,
    ) -> Self {
        Self {
            path: path.into(),
            store,
            interval,
            skip_archived,
            archived: HashSet::new(),
        }
    }

    /// Treat `ids` as already present in the archive file.
    pub fn with_archived_ids(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.archived.extend(ids);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a single pass immediately.
    pub async fn archive_once(&mut self) -> Result<ArchiveTick> {
        let completed = self.store.completed();
        let mut tick = ArchiveTick {
            completed: completed.len(),
            appended: 0,
        };

        let batch: Vec<_> = if self.skip_archived {
            completed
                .into_iter()
                .filter(|task| !self.archived.contains(&task.id))
                .collect()
        } else {
            completed
        };

        if batch.is_empty() {
            tracing::debug!(completed = tick.completed, "nothing new to archive");
            return Ok(tick);
        }

        let path = self.path.clone();
        let written = tokio::task::spawn_blocking(move || codec::append(&path, &batch)).await??;

        tick.appended = written.len();
        self.archived.extend(written);
        tracing::info!(
            path = %self.path.display(),
            appended = tick.appended,
            "archived completed tasks"
        );
        Ok(tick)
    }

    /// Tick every `interval` until `cancel` fires. The first tick happens one
    /// full interval after start; no pass runs on cancellation.
    pub async fn run(mut self, cancel: CancellationToken) {
        let Some(start) = Instant::now().checked_add(self.interval) else {
            tracing::warn!(interval = ?self.interval, "archive interval out of range, archiver idle");
            cancel.cancelled().await;
            return;
        };
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(interval = ?self.interval, "archiver started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.archive_once().await {
                        tracing::warn!(
                            path = %self.path.display(),
                            error = %err,
                            "archive pass failed"
                        );
                    }
                }
            }
        }

        tracing::debug!("archiver stopped");
    }
}
