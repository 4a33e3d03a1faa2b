//! Small shared helpers for the binary's stderr messages.

use owo_colors::OwoColorize;
use std::path::Path;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn prefix(label: &str, paint: fn(&str) -> String) -> String {
    if colors_enabled() {
        paint(label)
    } else {
        label.to_string()
    }
}

pub fn error_prefix() -> String {
    prefix("error:", |s| s.red().bold().to_string())
}

pub fn note_prefix() -> String {
    prefix("note:", |s| s.yellow().bold().to_string())
}

/// Display `path` relative to the working directory when it lives below it.
pub fn rel_to_wd(path: &Path) -> String {
    let Ok(cwd) = std::env::current_dir() else {
        return path.to_string_lossy().to_string();
    };
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    match pathdiff::diff_paths(&abs, &cwd) {
        Some(rel) if !rel.starts_with("..") && !rel.as_os_str().is_empty() => {
            rel.to_string_lossy().to_string()
        }
        _ => path.to_string_lossy().to_string(),
    }
}
