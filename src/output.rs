//! Output rendering for patch outcomes and failures.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is the
//! `PatchResponse`/`ErrorResponse` shape, plus `preview` and `diff` when
//! nothing was written.

use crate::apply::PatchOutcome;
use crate::error::PatchError;
use crate::models::ErrorResponse;
use crate::utils::rel_to_wd;
use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn pretty(v: &JsonVal) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Print a successful outcome. Previews print the patched document, or the
/// changed region when `diff` is set.
pub fn print_outcome(outcome: &PatchOutcome, output: &str, diff: bool) {
    if output == "json" {
        println!("{}", pretty(&compose_outcome_json(outcome, diff)));
        return;
    }
    let color = use_colors(output);
    let file = rel_to_wd(Path::new(&outcome.response.file_path));
    if outcome.wrote {
        let backups = match outcome.response.backup_count {
            Some(n) => format!(" (backups: {})", n),
            None => String::new(),
        };
        if color {
            println!(
                "{} {}{}",
                "patched:".green().bold(),
                file.bold(),
                backups.bright_black()
            );
        } else {
            println!("patched: {}{}", file, backups);
        }
        return;
    }

    let body = if diff {
        region_diff(&outcome.original, &outcome.patched)
    } else {
        Some(outcome.patched.clone())
    };
    match body {
        Some(text) => {
            if color {
                println!("{} {}\n{}", "---".cyan().bold(), file.bold(), text);
            } else {
                println!("--- {}\n{}", file, text);
            }
        }
        None => {
            if color {
                println!("{} {}", "no changes:".bright_black(), file);
            } else {
                println!("no changes: {}", file);
            }
        }
    }
}

/// Print a failure. JSON goes to stdout so callers can parse it; the human
/// line goes to stderr.
pub fn print_error(err: &PatchError, output: &str) {
    if output == "json" {
        println!("{}", pretty(&compose_error_json(err)));
    } else {
        eprintln!("{} {}", crate::utils::error_prefix(), err);
    }
}

/// Changed line region between `old` and `new`, with 1-based line numbers.
/// `None` when the texts are identical.
pub fn region_diff(old: &str, new: &str) -> Option<String> {
    if old == new {
        return None;
    }
    let a: Vec<&str> = old.split('\n').collect();
    let b: Vec<&str> = new.split('\n').collect();
    let head = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let tail = a[head..]
        .iter()
        .rev()
        .zip(b[head..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut out = Vec::new();
    out.push(format!(
        "@@ -{},{} +{},{} @@",
        head + 1,
        a.len() - head - tail,
        head + 1,
        b.len() - head - tail
    ));
    for (i, line) in a[head..a.len() - tail].iter().enumerate() {
        out.push(format!("-{:>4} | {}", head + i + 1, line));
    }
    for (i, line) in b[head..b.len() - tail].iter().enumerate() {
        out.push(format!("+{:>4} | {}", head + i + 1, line));
    }
    Some(out.join("\n"))
}

/// Compose outcome JSON object (pure) for testing purposes.
pub fn compose_outcome_json(outcome: &PatchOutcome, diff: bool) -> JsonVal {
    let mut v = serde_json::to_value(&outcome.response).unwrap_or(JsonVal::Null);
    if !outcome.wrote {
        if let JsonVal::Object(map) = &mut v {
            map.insert("preview".into(), JsonVal::String(outcome.patched.clone()));
            if diff {
                let d = region_diff(&outcome.original, &outcome.patched);
                map.insert("diff".into(), d.map(JsonVal::String).unwrap_or(JsonVal::Null));
            }
        }
    }
    v
}

/// Compose error JSON object (pure) for testing purposes.
pub fn compose_error_json(err: &PatchError) -> JsonVal {
    serde_json::to_value(ErrorResponse::from(err)).unwrap_or(JsonVal::Null)
}
