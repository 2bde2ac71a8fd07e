//! Activity log backed by a bounded queue and one writer task.
//!
//! Producers never block: [`AsyncLogger::log`] either enqueues the message or
//! drops it. The [`LoggerWorker`] owns the file and appends
//! `[YYYY-MM-DD HH:MM:SS] <message>` lines in enqueue order.
//!
//! Cancellation moves the worker from `Running` to `Draining`; it closes the
//! queue, writes whatever is still buffered, flushes and reports `Stopped`.
//! [`AsyncLogger::close`] only refuses new messages and does not stop the
//! worker.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::task::TIMESTAMP_FORMAT;

/// What happened to a message handed to [`AsyncLogger::log`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Queued,
    DroppedFull,
    DroppedClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    Running,
    Draining,
    Stopped,
}

impl LoggerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LoggerState::Running,
            1 => LoggerState::Draining,
            _ => LoggerState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LoggerState::Running => 0,
            LoggerState::Draining => 1,
            LoggerState::Stopped => 2,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    closed: AtomicBool,
    dropped: AtomicU64,
    state: AtomicU8,
}

impl Shared {
    fn set_state(&self, state: LoggerState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

/// Cloneable producer handle
#[derive(Debug, Clone)]
pub struct AsyncLogger {
    tx: mpsc::Sender<String>,
    shared: Arc<Shared>,
}

/// Consumer half; run it with [`LoggerWorker::run`]
#[derive(Debug)]
pub struct LoggerWorker {
    rx: mpsc::Receiver<String>,
    writer: BufWriter<File>,
    path: PathBuf,
    shared: Arc<Shared>,
}

/// Open `path` for appending and build a logger with a queue of `capacity`.
///
/// Fails when the file cannot be opened or `capacity` is zero.
pub async fn open(path: &Path, capacity: usize) -> Result<(AsyncLogger, LoggerWorker)> {
    if capacity == 0 {
        return Err(Error::InvalidConfig(
            "logger queue capacity must be at least 1".to_string(),
        ));
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|err| Error::storage(path, err))?;

    let (tx, rx) = mpsc::channel(capacity);
    let shared = Arc::new(Shared::default());

    let logger = AsyncLogger {
        tx,
        shared: Arc::clone(&shared),
    };
    let worker = LoggerWorker {
        rx,
        writer: BufWriter::new(file),
        path: path.to_path_buf(),
        shared,
    };
    Ok((logger, worker))
}

impl AsyncLogger {
    pub fn log(&self, message: impl Into<String>) -> LogStatus {
        let message = message.into();

        if self.shared.closed.load(Ordering::SeqCst) {
            self.shared.dropped.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(%message, "logger closed, dropping message");
            return LogStatus::DroppedClosed;
        }

        match self.tx.try_send(message) {
            Ok(()) => LogStatus::Queued,
            Err(TrySendError::Full(message)) => {
                self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(%message, "log queue full, dropping message");
                LogStatus::DroppedFull
            }
            Err(TrySendError::Closed(message)) => {
                self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(%message, "log writer gone, dropping message");
                LogStatus::DroppedClosed
            }
        }
    }

    /// Refuse further messages. Safe to call more than once.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("logger closed for new messages");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> LoggerState {
        LoggerState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    /// Messages dropped so far, for any reason
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::SeqCst)
    }
}

impl LoggerWorker {
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::debug!(path = %self.path.display(), "log writer started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                message = self.rx.recv() => match message {
                    Some(message) => self.write(&message).await,
                    None => break,
                },
            }
        }

        self.shared.set_state(LoggerState::Draining);
        self.rx.close();
        let mut drained = 0usize;
        while let Ok(message) = self.rx.try_recv() {
            self.write(&message).await;
            drained += 1;
        }

        if let Err(err) = self.writer.flush().await {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to flush log file");
        }
        if let Err(err) = self.writer.get_mut().sync_all().await {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to sync log file");
        }

        self.shared.set_state(LoggerState::Stopped);
        tracing::debug!(drained, "log writer stopped");
    }

    async fn write(&mut self, message: &str) {
        let entry = format!("[{}] {}\n", Local::now().format(TIMESTAMP_FORMAT), message);
        let result = match self.writer.write_all(entry.as_bytes()).await {
            Ok(()) => self.writer.flush().await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to write log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn messages(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| {
                assert!(line.starts_with('['), "missing timestamp: {line}");
                line.split_once("] ").unwrap().1.to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn writes_messages_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        let (logger, worker) = open(&path, 10).await.unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(cancel.clone()));

        for n in 0..5 {
            assert_eq!(logger.log(format!("msg {n}")), LogStatus::Queued);
        }
        assert_eq!(logger.state(), LoggerState::Running);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            messages(&path),
            vec!["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]
        );
        assert_eq!(logger.state(), LoggerState::Stopped);
    }

    #[tokio::test]
    async fn drops_newest_when_full() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        let (logger, worker) = open(&path, 2).await.unwrap();

        assert_eq!(logger.log("first"), LogStatus::Queued);
        assert_eq!(logger.log("second"), LogStatus::Queued);
        assert_eq!(logger.log("third"), LogStatus::DroppedFull);
        assert_eq!(logger.dropped(), 1);

        let cancel = CancellationToken::new();
        cancel.cancel();
        worker.run(cancel).await;

        assert_eq!(messages(&path), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn close_then_cancel_keeps_earlier_messages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        let (logger, worker) = open(&path, 10).await.unwrap();

        logger.log("before close");
        logger.close();
        logger.close();
        assert!(logger.is_closed());
        assert_eq!(logger.log("after close"), LogStatus::DroppedClosed);

        // Closing does not stop the worker.
        assert_eq!(logger.state(), LoggerState::Running);

        let cancel = CancellationToken::new();
        cancel.cancel();
        worker.run(cancel).await;

        assert_eq!(messages(&path), vec!["before close"]);
        assert_eq!(logger.dropped(), 1);
    }

    #[tokio::test]
    async fn appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "[2024-01-01 00:00:00] old\n").unwrap();

        let (logger, worker) = open(&path, 4).await.unwrap();
        logger.log("new");
        let cancel = CancellationToken::new();
        cancel.cancel();
        worker.run(cancel).await;

        assert_eq!(messages(&path), vec!["old", "new"]);
    }

    #[tokio::test]
    async fn log_after_worker_exit_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        let (logger, worker) = open(&path, 4).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        worker.run(cancel).await;

        assert_eq!(logger.log("late"), LogStatus::DroppedClosed);
    }

    #[tokio::test]
    async fn open_fails_for_directory_target() {
        let dir = TempDir::new().unwrap();
        let err = open(dir.path(), 4).await.unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[tokio::test]
    async fn zero_capacity_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = open(&dir.path().join("log.txt"), 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
