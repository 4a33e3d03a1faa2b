//! Backups taken before a configuration file is rewritten.
//!
//! Backups are best-effort. They are gated by `files.autoBackup` in
//! `<dir>/settings/config-tool-settings.yaml`; only an explicit `false`
//! disables them. The copy lands in `<dir>/config-backups/` under
//! `<stem>_backup_<timestamp>.<ext>` and never replaces an existing file.
//! The number of YAML backups present afterwards is reported, never pruned.

use crate::error::BackupError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Backup directory name, relative to the target's directory.
pub const BACKUP_DIR: &str = "config-backups";
/// Settings file consulted for `files.autoBackup`, relative to the target's directory.
pub const SETTINGS_FILE: &str = "settings/config-tool-settings.yaml";

#[derive(Debug, Default, Deserialize)]
struct ToolSettings {
    #[serde(default)]
    files: Option<FileSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(rename = "autoBackup")]
    auto_backup: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupOutcome {
    pub path: PathBuf,
    /// `*.yaml` and `*.yml` files in the backup directory after this backup.
    pub count: usize,
}

/// Whether backups are enabled for files in `dir`.
pub fn auto_backup_enabled(dir: &Path) -> bool {
    let path = dir.join(SETTINGS_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) => return true,
    };
    match serde_yaml::from_str::<ToolSettings>(&text) {
        Ok(settings) => settings
            .files
            .and_then(|f| f.auto_backup)
            .unwrap_or(true),
        Err(e) => {
            tracing::warn!(settings = %path.display(), error = %e, "unreadable tool settings; backups stay enabled");
            true
        }
    }
}

/// Backup file name for `target` at `now`, e.g.
/// `settings_backup_2026-10-19T09-28-00-000Z.yaml`.
pub fn backup_file_name(target: &Path, now: DateTime<Utc>) -> String {
    let (stem, ext) = stem_and_ext(target);
    numbered_name(&stem, &ext, &timestamp(now), 0)
}

fn numbered_name(stem: &str, ext: &str, stamp: &str, attempt: usize) -> String {
    if attempt == 0 {
        format!("{}_backup_{}.{}", stem, stamp, ext)
    } else {
        format!("{}_backup_{}-{}.{}", stem, stamp, attempt, ext)
    }
}

fn stem_and_ext(target: &Path) -> (String, String) {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "config".to_string());
    let ext = target
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "yaml".to_string());
    (stem, ext)
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

fn target_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Write `original` as a backup of `target`. `Ok(None)` when backups are
/// disabled by settings.
pub fn create_backup(
    target: &Path,
    original: &str,
    now: DateTime<Utc>,
) -> Result<Option<BackupOutcome>, BackupError> {
    let dir = target_dir(target);
    if !auto_backup_enabled(dir) {
        tracing::debug!(file = %target.display(), "automatic backups disabled by settings");
        return Ok(None);
    }
    let backup_dir = dir.join(BACKUP_DIR);
    fs::create_dir_all(&backup_dir).map_err(|source| BackupError::Io {
        path: backup_dir.clone(),
        source,
    })?;

    let (stem, ext) = stem_and_ext(target);
    let stamp = timestamp(now);
    let mut attempt = 0usize;
    let path = loop {
        let candidate = backup_dir.join(numbered_name(&stem, &ext, &stamp, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(original.as_bytes())
                    .map_err(|source| BackupError::Io {
                        path: candidate.clone(),
                        source,
                    })?;
                break candidate;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => {
                return Err(BackupError::Io {
                    path: candidate,
                    source,
                })
            }
        }
    };

    let count = count_backups(&backup_dir);
    tracing::info!(backup = %path.display(), count, "backup created");
    Ok(Some(BackupOutcome { path, count }))
}

/// Count `*.yaml` and `*.yml` files in `dir`.
pub fn count_backups(dir: &Path) -> usize {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    ["yaml", "yml"]
        .iter()
        .filter_map(|ext| glob::glob(&format!("{}/*.{}", base, ext)).ok())
        .flat_map(|paths| paths.flatten())
        .filter(|p| p.is_file())
        .count()
}

/// Failure-isolating wrapper around [`create_backup`]: errors are logged and
/// become `None`.
pub fn try_backup(target: &Path, original: &str) -> Option<BackupOutcome> {
    match create_backup(target, original, Utc::now()) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(file = %target.display(), error = %e, "backup failed; continuing with write");
            None
        }
    }
}
