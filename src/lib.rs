//! taskm - Task Manager Library
//!
//! Core of the taskm CLI: a prioritised to-do list persisted as a
//! pipe-delimited text file, with two background workers sharing the
//! process.
//!
//! # Core Concepts
//!
//! - **Task Records**: id, title, completion flag, creation time, priority
//! - **Text Codec**: one record per line, atomic rewrites, best-effort appends
//! - **Archiver**: periodically copies completed tasks to an archive file
//! - **Async Logger**: bounded, non-blocking activity log writer
//! - **Shutdown**: cancel workers, save the store, drain the log
//!
//! # Module Organization
//!
//! - `app`: Startup and command handlers over shared state
//! - `archiver`: Periodic archive worker
//! - `cli`: Command-line interface using clap
//! - `codec`: Task file encoding and decoding
//! - `config`: Configuration loading from `taskm.toml`
//! - `error`: Error types and result aliases
//! - `id_gen`: Monotonic id allocation
//! - `logger`: Activity log worker
//! - `output`: Human and JSON console output
//! - `shutdown`: Cancellation, bounded waits and the final save
//! - `store`: In-memory task collection
//! - `task`: Task record and priority types

pub mod app;
pub mod archiver;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod id_gen;
pub mod logger;
pub mod output;
pub mod shutdown;
pub mod store;
pub mod task;

pub use error::{Error, Result};
