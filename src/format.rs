//! Field/value formatter for section bodies.
//!
//! Each top-level field of a section is rendered to one or more lines at a
//! given indentation. Rules, in priority order:
//! - `null` (and an empty `layout`) renders as `key: null`.
//! - A non-empty `layout` renders as a YAML list of JSON-flow widget objects,
//!   the shape the dashboard tooling reads back.
//! - Strings are bare unless they need single quotes: the `birthday` and
//!   `restingHeartRateFormula` keys, ISO dates, YAML-significant characters,
//!   surrounding whitespace, a leading `- `, or the empty string. Strings with
//!   line breaks or tabs are double-quoted with JSON escapes.
//! - Objects and other arrays go through `serde_yaml`, re-indented under the
//!   key. Bare ISO-date keys and scalars in that output are then wrapped in
//!   single quotes so they never re-parse as anything but strings. The body
//!   of a `|`/`>` block scalar is copied as is.
//! - Numbers and booleans use their display form.

use crate::error::PatchError;
use crate::models::widget::{validate_layout, Widget, LAYOUT_KEY};
use crate::scan::{indentation, INDENT_STEP};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;
use std::borrow::Cow;

/// Keys whose string values are always single-quoted.
pub const FORCE_QUOTED_KEYS: [&str; 2] = ["birthday", "restingHeartRateFormula"];

const YAML_SIGNIFICANT: &[char] = &[
    ':', '#', '[', ']', '{', '}', '*', '&', '!', '|', '>', '\'', '"', '@', '`', '%',
];

const LINE_BREAKING: &[char] = &['\n', '\r', '\t'];

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

static DATE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<lead>\s*(?:- )*)(?P<date>\d{4}-\d{2}-\d{2})(?P<rest>:(?:\s.*)?)$")
        .expect("valid date key regex")
});

static DATE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<lead>.*?: |\s*(?:- )+)(?P<date>\d{4}-\d{2}-\d{2})$")
        .expect("valid date value regex")
});

/// A line whose value is a `|` or `>` block scalar header.
static BLOCK_SCALAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)[|>][-+]?[0-9]?[-+]?$").expect("valid block scalar regex")
});

/// True when `s` is exactly `YYYY-MM-DD`.
pub fn is_iso_date(s: &str) -> bool {
    ISO_DATE.is_match(s)
}

/// Render one field of a section body at `indent` spaces.
pub fn format_field(indent: usize, key: &str, value: &Json) -> Result<Vec<String>, PatchError> {
    let pad = " ".repeat(indent);
    let lines = match value {
        Json::Null => vec![format!("{}{}: null", pad, key)],
        Json::Array(items) if key == LAYOUT_KEY => {
            if items.is_empty() {
                vec![format!("{}{}: null", pad, key)]
            } else {
                let widgets = validate_layout(value)?;
                format_layout(indent, key, &widgets)
            }
        }
        Json::String(s) => vec![format!("{}{}: {}", pad, key, format_string(key, s))],
        Json::Object(map) if map.is_empty() => vec![format!("{}{}: {{}}", pad, key)],
        Json::Array(items) if items.is_empty() => vec![format!("{}{}: []", pad, key)],
        Json::Object(_) | Json::Array(_) => format_nested(indent, key, value)?,
        Json::Bool(b) => vec![format!("{}{}: {}", pad, key, b)],
        Json::Number(n) => vec![format!("{}{}: {}", pad, key, n)],
    };
    Ok(lines)
}

/// Quote a top-level string value according to the scalar rules.
pub fn format_string<'s>(key: &str, s: &'s str) -> Cow<'s, str> {
    if s.contains(LINE_BREAKING) {
        Cow::Owned(Json::String(s.to_string()).to_string())
    } else if needs_single_quotes(key, s) {
        Cow::Owned(single_quote(s))
    } else {
        Cow::Borrowed(s)
    }
}

fn needs_single_quotes(key: &str, s: &str) -> bool {
    FORCE_QUOTED_KEYS.contains(&key)
        || s.is_empty()
        || is_iso_date(s)
        || s.contains(YAML_SIGNIFICANT)
        || s.trim() != s
        || s.starts_with("- ")
}

fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Widget array as a YAML list of multi-line JSON-flow objects.
fn format_layout(indent: usize, key: &str, widgets: &[Widget]) -> Vec<String> {
    let pad = " ".repeat(indent);
    let item = " ".repeat(indent + INDENT_STEP);
    let field = " ".repeat(indent + 2 * INDENT_STEP);
    let entry = " ".repeat(indent + 3 * INDENT_STEP);

    let mut out = vec![format!("{}{}:", pad, key)];
    for w in widgets {
        let config = w.non_empty_config();
        out.push(format!("{}- {{", item));
        out.push(format!("{}\"widget\": {},", field, json_string(&w.widget)));
        out.push(format!("{}\"width\": {},", field, w.width));
        out.push(format!(
            "{}\"enabled\": {}{}",
            field,
            w.enabled,
            if config.is_some() { "," } else { "" }
        ));
        if let Some(cfg) = config {
            out.push(format!("{}\"config\": {{", field));
            let last = cfg.len() - 1;
            for (i, (k, v)) in cfg.iter().enumerate() {
                out.push(format!(
                    "{}{}: {}{}",
                    entry,
                    json_string(k),
                    v,
                    if i < last { "," } else { "" }
                ));
            }
            out.push(format!("{}}}", field));
        }
        out.push(format!("{}}}", item));
    }
    out
}

fn json_string(s: &str) -> String {
    Json::String(s.to_string()).to_string()
}

/// Nested objects and arrays: delegate to `serde_yaml`, then re-indent.
fn format_nested(indent: usize, key: &str, value: &Json) -> Result<Vec<String>, PatchError> {
    let rendered = serde_yaml::to_string(value)?;
    let child = " ".repeat(indent + INDENT_STEP);
    let mut out = vec![format!("{}{}:", " ".repeat(indent), key)];
    // Indentation of the line that opened the current block scalar.
    let mut block: Option<usize> = None;
    for line in rendered.lines() {
        if line.is_empty() {
            out.push(String::new());
            continue;
        }
        let level = indentation(line);
        if let Some(open) = block {
            if level > open {
                out.push(format!("{}{}", child, line));
                continue;
            }
            block = None;
        }
        if BLOCK_SCALAR.is_match(line) {
            block = Some(level);
        }
        out.push(format!("{}{}", child, quote_dates(line)));
    }
    Ok(out)
}

/// Wrap a bare ISO-date key and/or scalar on one emitted line in single
/// quotes. Already quoted dates are left alone.
pub fn quote_dates(line: &str) -> Cow<'_, str> {
    let keyed = DATE_KEY.replace(line, "${lead}'${date}'${rest}");
    if DATE_VALUE.is_match(&keyed) {
        Cow::Owned(DATE_VALUE.replace(&keyed, "${lead}'${date}'").into_owned())
    } else {
        keyed
    }
}
