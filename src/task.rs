//! Task records and priorities.
//!
//! A [`TaskRecord`] is plain data: the store owns the collection, the codec
//! owns the on-disk shape. Priority is a closed enum with a total numeric rank
//! so listing order never depends on string comparison.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Calendar timestamp layout shared by the task files and the activity log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Higher rank sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Parse user or file input, falling back to `Medium`.
    ///
    /// The flag is `true` when the input was not recognized and the fallback
    /// was applied, so callers can emit their own warning.
    pub fn parse_lenient(raw: &str) -> (Priority, bool) {
        match raw.parse::<Priority>() {
            Ok(priority) => (priority, false),
            Err(_) => (Priority::default(), true),
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "invalid priority '{}': must be high, medium, or low",
                    s
                ))
            })
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    pub title: String,
    pub done: bool,
    pub created_at: NaiveDateTime,
    pub priority: Priority,
}

impl TaskRecord {
    /// Build a fresh, pending task stamped with the current local time.
    pub fn new(id: u64, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id,
            title: title.into(),
            done: false,
            created_at: now_seconds(),
            priority,
        }
    }
}

/// Current local time truncated to whole seconds (the on-disk resolution).
pub fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Order tasks for display: priority descending, then oldest first.
pub fn sort_tasks(tasks: &mut [TaskRecord]) {
    tasks.sort_by(|left, right| {
        right
            .priority
            .rank()
            .cmp(&left.priority.rank())
            .then_with(|| left.created_at.cmp(&right.created_at))
            .then_with(|| left.id.cmp(&right.id))
    });
}
