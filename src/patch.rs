//! Section patcher: replaces one section's body in a YAML document.
//!
//! The document is treated as text. Only the target section's body lines are
//! replaced; every other line, including comments and blank lines, is copied
//! through unchanged. A structural parse runs first purely as a diagnostic:
//! documents that do not parse are still patched, since the point of a
//! literal splice is to be able to repair them.

use crate::error::PatchError;
use crate::format::format_field;
use crate::models::section::{SectionPath, ATHLETE_FIELD_ORDER};
use crate::models::widget::{validate_layout, LAYOUT_KEY};
use crate::scan::{Anchor, Document, Locator, INDENT_STEP};
use serde_json::{Map, Value as Json};

/// Minimum non-whitespace characters a patched document must keep.
pub const MIN_OUTPUT_CHARS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    /// Child keys of a top-level section copied back verbatim instead of
    /// being replaced.
    pub preserve_nested_keys: Vec<String>,
}

/// Replace the body of `path` in `document` with `data`.
pub fn patch_section(
    document: &str,
    path: &SectionPath,
    data: &Map<String, Json>,
    options: &PatchOptions,
) -> Result<String, PatchError> {
    if document.trim().is_empty() {
        return Err(PatchError::EmptyDocument);
    }
    if let Some(layout) = data.get(LAYOUT_KEY) {
        validate_layout(layout)?;
    }
    if let Err(e) = serde_yaml::from_str::<serde_yaml::Value>(document) {
        tracing::warn!(section = %path, error = %e, "document is not valid YAML; patching text anyway");
    }

    let doc = Document::parse(document);
    let span = Locator::new(&doc, path, &options.preserve_nested_keys).locate();
    tracing::debug!(section = %path, anchor = ?span.anchor, body = ?span.body, "located section");
    if span.anchor.is_synthesized() {
        tracing::warn!(
            section = %path,
            "section header not found; appending a new section (a header with an inline comment or odd spacing is not recognised)"
        );
    }

    let preserved_keys: Vec<&str> = span
        .preserved
        .iter()
        .filter_map(|r| doc.lines()[r.start].key())
        .collect();

    let body_indent = span.anchor.indent() + INDENT_STEP;
    let mut fields: Vec<String> = Vec::new();
    for (key, value) in ordered_fields(path, data) {
        if preserved_keys.contains(&key.as_str()) {
            tracing::debug!(key = %key, "skipping data key owned by a preserved block");
            continue;
        }
        fields.extend(format_field(body_indent, key, value)?);
    }

    let mut out: Vec<&str> = Vec::with_capacity(doc.len() + fields.len());
    match &span.anchor {
        Anchor::Existing { header, .. } => out.extend(doc.texts(0..header + 1)),
        Anchor::Synthesized {
            insert_at,
            header_lines,
            ..
        } => {
            out.extend(doc.texts(0..*insert_at));
            out.extend(header_lines.iter().map(String::as_str));
        }
    }
    out.extend(fields.iter().map(String::as_str));
    for range in &span.preserved {
        out.extend(doc.texts(range.clone()));
    }
    out.extend(doc.texts(span.body.end..doc.len()));
    Ok(out.join("\n"))
}

/// Fields in emission order. The athlete section leads with its preferred
/// keys; every other section keeps the data's insertion order.
pub fn ordered_fields<'m>(
    path: &SectionPath,
    data: &'m Map<String, Json>,
) -> Vec<(&'m String, &'m Json)> {
    if *path != SectionPath::Athlete {
        return data.iter().collect();
    }
    let mut out: Vec<(&String, &Json)> = ATHLETE_FIELD_ORDER
        .iter()
        .filter_map(|k| data.iter().find(|(key, _)| key.as_str() == *k))
        .collect();
    out.extend(
        data.iter()
            .filter(|(k, _)| !ATHLETE_FIELD_ORDER.contains(&k.as_str())),
    );
    out
}

/// Reject output that lost (nearly) everything.
pub fn ensure_sane(output: &str) -> Result<(), PatchError> {
    let chars = output.chars().filter(|c| !c.is_whitespace()).count();
    if chars < MIN_OUTPUT_CHARS {
        return Err(PatchError::OutputTooShort { chars });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data(v: Json) -> Map<String, Json> {
        v.as_object().cloned().unwrap()
    }

    fn patch(doc: &str, section: &str, v: Json) -> String {
        let path = SectionPath::parse(section, false).unwrap();
        patch_section(doc, &path, &data(v), &PatchOptions::default()).unwrap()
    }

    const SAMPLE: &str = "\
# Statistics config
general:
  # display settings
  theme: blue
  units: metric

# Look and feel
appearance:
  locale: \"en\"
  dashboard:
    layout: null
";

    #[test]
    fn test_athlete_synthesized_under_general() {
        let path = SectionPath::Athlete;
        let out = patch_section(
            "general:\n  theme: blue\n",
            &path,
            &data(json!({"birthday": "1990-01-01"})),
            &PatchOptions::default(),
        )
        .unwrap();
        assert_eq!(
            out,
            "general:\n  theme: blue\n  athlete:\n    birthday: '1990-01-01'\n"
        );
    }

    #[test]
    fn test_body_comments_are_replaced() {
        let out = patch(
            "appearance:\n  # user note\n  locale: \"en\"\n",
            "appearance",
            json!({"locale": "fr"}),
        );
        assert_eq!(out, "appearance:\n  locale: fr\n");
    }

    #[test]
    fn test_other_sections_and_comments_are_untouched() {
        let out = patch(SAMPLE, "general", json!({"theme": "dark", "units": "imperial"}));
        assert_eq!(
            out,
            "\
# Statistics config
general:
  theme: dark
  units: imperial

# Look and feel
appearance:
  locale: \"en\"
  dashboard:
    layout: null
"
        );
    }

    #[test]
    fn test_nested_section_replaced_in_place() {
        let out = patch(
            SAMPLE,
            "appearance.dashboard",
            json!({"layout": [{"widget": "clock", "width": 50, "enabled": true}]}),
        );
        assert!(out.starts_with(&SAMPLE[..SAMPLE.find("  dashboard:").unwrap()]));
        assert!(out.ends_with(
            "  dashboard:\n    layout:\n      - {\n        \"widget\": \"clock\",\n        \"width\": 50,\n        \"enabled\": true\n      }\n"
        ));
        let parsed: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(
            parsed["appearance"]["dashboard"]["layout"][0]["widget"].as_str(),
            Some("clock")
        );
    }

    #[test]
    fn test_nested_section_synthesized_as_last_child() {
        let doc = "appearance:\n  locale: en\n\nother: 1\n";
        let out = patch(doc, "appearance.dashboard", json!({"layout": null}));
        assert_eq!(
            out,
            "appearance:\n  locale: en\n  dashboard:\n    layout: null\n\nother: 1\n"
        );
    }

    #[test]
    fn test_synthesized_child_keeps_indented_comment_above() {
        let doc = "appearance:\n  locale: en\n  # dashboard goes here\nnext: 1\n";
        let out = patch(doc, "appearance.dashboard", json!({"layout": null}));
        assert_eq!(
            out,
            "appearance:\n  locale: en\n  # dashboard goes here\n  dashboard:\n    layout: null\nnext: 1\n"
        );
    }

    #[test]
    fn test_multiline_nested_string_survives_date_quoting() {
        let text = "ride log\nsince: 2024-01-01\n- 2024-02-02";
        let out = patch(
            "general:\n  theme: blue\n",
            "general",
            json!({"notes": {"text": text, "since": "2024-01-01"}}),
        );
        let parsed: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed["general"]["notes"]["text"].as_str(), Some(text));
        assert_eq!(
            parsed["general"]["notes"]["since"].as_str(),
            Some("2024-01-01")
        );
    }

    #[test]
    fn test_crlf_document() {
        let doc = "# c\r\ngeneral:\r\n  theme: blue\r\nnext: 1\r\n";
        let out = patch(doc, "general", json!({"theme": "dark"}));
        assert_eq!(out, "# c\r\ngeneral:\r\n  theme: dark\nnext: 1\r\n");
    }

    #[test]
    fn test_layout_null_line() {
        let out = patch("dashboard:\n  layout: []\n", "dashboard", json!({"layout": null}));
        assert!(out.lines().any(|l| l == "  layout: null"));
    }

    #[test]
    fn test_missing_top_level_section_is_appended() {
        let out = patch("general:\n  theme: blue\n", "sync", json!({"enabled": true}));
        assert_eq!(out, "general:\n  theme: blue\nsync:\n  enabled: true\n");
    }

    #[test]
    fn test_athlete_field_order() {
        let path = SectionPath::Athlete;
        let out = patch_section(
            "general:\n  athlete:\n    birthday: '1980-01-01'\nother: x\n",
            &path,
            &data(json!({
                "nickname": "rider",
                "ftpHistory": [],
                "restingHeartRateFormula": "karvonen",
                "birthday": "1990-01-01"
            })),
            &PatchOptions::default(),
        )
        .unwrap();
        assert_eq!(
            out,
            "general:\n  athlete:\n    birthday: '1990-01-01'\n    restingHeartRateFormula: 'karvonen'\n    ftpHistory: []\n    nickname: rider\nother: x\n"
        );
    }

    #[test]
    fn test_preserved_keys_survive_and_win() {
        let doc = "appearance:\n  locale: en\n  dashboard:\n    # widgets\n    layout: null\n  theme: dark\n";
        let path = SectionPath::parse("appearance", false).unwrap();
        let out = patch_section(
            doc,
            &path,
            &data(json!({"locale": "fr", "dashboard": {"layout": []}})),
            &PatchOptions {
                preserve_nested_keys: vec!["dashboard".into()],
            },
        )
        .unwrap();
        assert_eq!(
            out,
            "appearance:\n  locale: fr\n  dashboard:\n    # widgets\n    layout: null\n"
        );
    }

    #[test]
    fn test_idempotent_for_already_formatted_data() {
        let doc = "general:\n  theme: blue\n  units: metric\nnext: 1\n";
        let out = patch(doc, "general", json!({"theme": "blue", "units": "metric"}));
        assert_eq!(out, doc);
    }

    #[test]
    fn test_invalid_yaml_is_still_patched() {
        let doc = "general:\n  theme: [unclosed\nnext: 1\n";
        let out = patch(doc, "general", json!({"theme": "blue"}));
        assert_eq!(out, "general:\n  theme: blue\nnext: 1\n");
    }

    #[test]
    fn test_empty_document_rejected() {
        let path = SectionPath::Top("general".into());
        for doc in ["", "  \n\t\n"] {
            let err = patch_section(doc, &path, &Map::new(), &PatchOptions::default()).unwrap_err();
            assert!(matches!(err, PatchError::EmptyDocument));
        }
    }

    #[test]
    fn test_invalid_widget_rejected_before_output() {
        let path = SectionPath::Top("dashboard".into());
        let err = patch_section(
            "dashboard:\n  layout: null\n",
            &path,
            &data(json!({"layout": [{"widget": "clock", "width": "fifty", "enabled": true}]})),
            &PatchOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::InvalidWidget { .. }));
    }

    #[test]
    fn test_ensure_sane_floor() {
        assert!(matches!(
            ensure_sane("a: 1\n\n  "),
            Err(PatchError::OutputTooShort { chars: 3 })
        ));
        assert!(ensure_sane("general:\n  a: 1").is_ok());
    }
}
