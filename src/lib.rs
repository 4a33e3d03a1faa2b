//! cfgsplice core library.
//!
//! This crate patches one named section of a YAML configuration file as text,
//! so comments, blank lines and every other section survive byte for byte.
//!
//! High-level modules:
//! - `scan`: Line classification and the section locator.
//! - `format`: Rendering of `key: value` lines, including the widget layout block.
//! - `patch`: The pure section patcher and its sanity floor.
//! - `backup`: Settings-gated, best-effort backups before a write.
//! - `apply`: The patch transaction (validate, read, patch, back up, write).
//! - `models`: Request/response shapes, section paths and widgets.
//! - `error`: Error types and their status mapping.
//! - `config`: Discovery and effective configuration resolution.
//! - `cli`: CLI argument parsing (binary uses this).
//! - `output`: Human/JSON printers for outcomes and failures.
//! - `utils`: Supporting helpers.
pub mod apply;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod output;
pub mod patch;
pub mod scan;
pub mod utils;
