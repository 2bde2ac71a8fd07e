//! Pipe-delimited text format for task files.
//!
//! One record per line:
//!
//! ```text
//! <id>|<title>|<done>|<YYYY-MM-DD HH:MM:SS>|<priority>
//! ```
//!
//! Titles are written verbatim. A title containing `|` or a newline corrupts
//! its own line on the next load; that line is skipped like any other
//! malformed line.
//!
//! Decoding never aborts on a bad line. Full rewrites go through a temp file
//! in the target directory followed by a rename, so the target is either the
//! old content or the new content. Appends are best-effort per record.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::task::{Priority, TaskRecord, TIMESTAMP_FORMAT};

const FIELD_SEPARATOR: char = '|';
const FIELD_COUNT: usize = 5;

/// Why a single line was rejected during decode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid id '{0}'")]
    InvalidId(String),

    #[error("invalid done flag '{0}'")]
    InvalidDone(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// A line that was dropped while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub content: String,
    pub reason: LineError,
}

/// A successfully decoded line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    pub record: TaskRecord,
    /// Original priority text when it was not recognized and `medium` was used
    pub coerced_priority: Option<String>,
}

/// Result of loading a task file
#[derive(Debug, Clone, Default)]
pub struct LoadedTasks {
    pub tasks: Vec<TaskRecord>,
    /// Highest id among parsed records, 0 when there are none
    pub max_id: u64,
    pub skipped: Vec<SkippedLine>,
    /// Number of records kept with a coerced priority
    pub coerced: usize,
}

/// Render one record as a newline-terminated line.
pub fn encode_line(task: &TaskRecord) -> String {
    format!(
        "{}|{}|{}|{}|{}\n",
        task.id,
        task.title,
        task.done,
        task.created_at.format(TIMESTAMP_FORMAT),
        task.priority
    )
}

/// Render a sequence of records.
pub fn encode_all(tasks: &[TaskRecord]) -> String {
    tasks.iter().map(encode_line).collect()
}

/// Parse one line (without its trailing newline).
pub fn decode_line(line: &str) -> std::result::Result<DecodedLine, LineError> {
    let parts: Vec<&str> = line.splitn(FIELD_COUNT, FIELD_SEPARATOR).collect();
    if parts.len() != FIELD_COUNT {
        return Err(LineError::FieldCount(parts.len()));
    }

    let id = match parts[0].parse::<u64>() {
        Ok(id) if id > 0 => id,
        _ => return Err(LineError::InvalidId(parts[0].to_string())),
    };

    let title = parts[1].to_string();

    let done = parse_bool(parts[2]).ok_or_else(|| LineError::InvalidDone(parts[2].to_string()))?;

    let created_at = NaiveDateTime::parse_from_str(parts[3], TIMESTAMP_FORMAT)
        .map_err(|_| LineError::InvalidTimestamp(parts[3].to_string()))?;

    let (priority, coerced) = Priority::parse_lenient(parts[4]);
    let coerced_priority = coerced.then(|| parts[4].to_string());

    Ok(DecodedLine {
        record: TaskRecord {
            id,
            title,
            done,
            created_at,
            priority,
        },
        coerced_priority,
    })
}

/// Boolean spellings accepted in the done column.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Decode every line from a reader, skipping malformed ones.
///
/// Lines are split on raw bytes so one line with invalid UTF-8 is skipped
/// like any other malformed line. Only a failed read is an error.
pub fn decode_reader<R: BufRead>(reader: R, source: &Path) -> io::Result<LoadedTasks> {
    let mut loaded = LoadedTasks::default();

    for (index, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        let line_number = index + 1;

        let decoded = match String::from_utf8(bytes) {
            Ok(text) => {
                let line = text.trim_end_matches('\r');
                if line.trim().is_empty() {
                    continue;
                }
                decode_line(line).map_err(|reason| (line.to_string(), reason))
            }
            Err(err) => {
                let lossy = String::from_utf8_lossy(err.as_bytes());
                Err((lossy.trim_end_matches('\r').to_string(), LineError::InvalidUtf8))
            }
        };

        match decoded {
            Ok(decoded) => {
                if let Some(raw) = &decoded.coerced_priority {
                    tracing::warn!(
                        path = %source.display(),
                        line = line_number,
                        priority = %raw,
                        "unknown priority, using medium"
                    );
                    loaded.coerced += 1;
                }
                loaded.max_id = loaded.max_id.max(decoded.record.id);
                loaded.tasks.push(decoded.record);
            }
            Err((content, reason)) => {
                tracing::warn!(
                    path = %source.display(),
                    line = line_number,
                    %reason,
                    "skipping malformed task line"
                );
                loaded.skipped.push(SkippedLine {
                    line_number,
                    content,
                    reason,
                });
            }
        }
    }

    Ok(loaded)
}

/// Load all tasks from `path`.
///
/// A missing file is an empty task list, not an error.
pub fn load(path: &Path) -> Result<LoadedTasks> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LoadedTasks::default()),
        Err(err) => return Err(Error::storage(path, err)),
    };

    decode_reader(BufReader::new(file), path).map_err(|err| Error::storage(path, err))
}

/// Replace the contents of `path` with `tasks`.
///
/// Writes to a temp file in the same directory, syncs it, then renames it
/// over the target. The temp file is removed on every failure path.
pub fn save(path: &Path, tasks: &[TaskRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|err| Error::storage(dir, err))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|err| Error::storage(dir, err))?;
    temp.write_all(encode_all(tasks).as_bytes())
        .and_then(|()| temp.flush())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|err| Error::storage(temp.path(), err))?;

    temp.persist(path)
        .map_err(|err| Error::storage(path, err.error))?;

    Ok(())
}

/// Append `tasks` to `path`, creating it if needed.
///
/// A failed record write is logged and the remaining records are still
/// attempted. Returns the ids of the records written; a flush failure is an
/// error.
pub fn append(path: &Path, tasks: &[TaskRecord]) -> Result<Vec<u64>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| Error::storage(path, err))?;

    append_to(BufWriter::new(file), path, tasks)
}

fn append_to<W: Write>(mut writer: W, path: &Path, tasks: &[TaskRecord]) -> Result<Vec<u64>> {
    let mut written = Vec::with_capacity(tasks.len());
    for task in tasks {
        match writer.write_all(encode_line(task).as_bytes()) {
            Ok(()) => written.push(task.id),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    id = task.id,
                    error = %err,
                    "failed to append task record"
                );
            }
        }
    }

    writer.flush().map_err(|err| Error::storage(path, err))?;
    Ok(written)
}
