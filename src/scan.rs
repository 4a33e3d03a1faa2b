//! Line scanner and section locator.
//!
//! A document is handled as a sequence of classified lines; nothing here
//! parses YAML. Sections are found by exact header text and bounded by
//! indentation:
//! - A header matches when its trimmed text equals `<key>:`. Headers with an
//!   inline comment or extra spacing do not match.
//! - A body is every line after the header until a content line whose
//!   indentation is at most the header's. Blank lines and comments in between
//!   belong to the body, but trailing blank lines and trailing comments at the
//!   header's indentation or less are left to the text that follows.
//! - Missing sections are synthesized rather than reported: a missing child
//!   goes after the last content or indented comment line of its parent's
//!   block (trailing blank lines stay with the text that follows), a missing
//!   top-level section after the last non-blank line of the document.
//!
//! The locator is an explicit state machine (`SeekingHeader`,
//! `SeekingChild`, `ConsumingBody`, `Done`) with indentation comparisons as
//! the transition guards.

use crate::models::section::{SectionPath, ATHLETE_KEY, ATHLETE_PARENT};
use std::ops::Range;

/// Indentation step used for synthesized headers and section bodies.
pub const INDENT_STEP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    Content,
}

#[derive(Debug, Clone)]
/// One source line with its indentation and kind.
pub struct Line<'a> {
    pub text: &'a str,
    pub indent: usize,
    pub kind: LineKind,
}

impl<'a> Line<'a> {
    pub fn new(text: &'a str) -> Self {
        let trimmed = text.trim();
        let kind = if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.starts_with('#') {
            LineKind::Comment
        } else {
            LineKind::Content
        };
        Line {
            text,
            indent: indentation(text),
            kind,
        }
    }

    pub fn trimmed(&self) -> &'a str {
        self.text.trim()
    }

    /// True for a content line that is exactly `<key>:` once trimmed.
    pub fn is_header(&self, key: &str) -> bool {
        self.kind == LineKind::Content && self.trimmed().strip_suffix(':') == Some(key)
    }

    /// Mapping key of a content line (`key: value` or `key:`), unquoted.
    pub fn key(&self) -> Option<&'a str> {
        if self.kind != LineKind::Content {
            return None;
        }
        let (key, _) = self.trimmed().split_once(':')?;
        Some(key.trim().trim_matches(|c| c == '"' || c == '\''))
    }
}

/// Count of leading space characters.
pub fn indentation(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ').count()
}

/// A document split on `\n`. Joining `lines` with `\n` gives the text back.
pub struct Document<'a> {
    lines: Vec<Line<'a>>,
}

impl<'a> Document<'a> {
    pub fn parse(text: &'a str) -> Self {
        Document {
            lines: text.split('\n').map(Line::new).collect(),
        }
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Raw text of the lines in `range`.
    pub fn texts(&self, range: Range<usize>) -> impl Iterator<Item = &'a str> + '_ {
        self.lines[range].iter().map(|l| l.text)
    }

    fn last_non_blank(&self) -> Option<usize> {
        self.lines.iter().rposition(|l| l.kind != LineKind::Blank)
    }

    /// Shrink `range` so it does not end on blank lines.
    fn trim_trailing_blank(&self, range: Range<usize>) -> Range<usize> {
        let mut end = range.end;
        while end > range.start && self.lines[end - 1].kind == LineKind::Blank {
            end -= 1;
        }
        range.start..end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where the new section body is attached.
pub enum Anchor {
    /// The header already exists at line `header`.
    Existing { header: usize, indent: usize },
    /// The header is missing; `header_lines` are inserted before line
    /// `insert_at`. `indent` is the innermost synthesized header's.
    Synthesized {
        insert_at: usize,
        header_lines: Vec<String>,
        indent: usize,
    },
}

impl Anchor {
    /// Indentation of the section header.
    pub fn indent(&self) -> usize {
        match self {
            Anchor::Existing { indent, .. } | Anchor::Synthesized { indent, .. } => *indent,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, Anchor::Synthesized { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of locating a section.
pub struct SectionSpan {
    pub anchor: Anchor,
    /// Lines replaced by the new body. Empty for synthesized sections.
    pub body: Range<usize>,
    /// Child blocks inside `body` copied back verbatim.
    pub preserved: Vec<Range<usize>>,
}

#[derive(Debug)]
enum State {
    SeekingHeader,
    SeekingChild {
        parent_indent: usize,
        child_indent: Option<usize>,
        last_content: usize,
    },
    ConsumingBody {
        header: usize,
        indent: usize,
        last_body: Option<usize>,
        child_indent: Option<usize>,
        open_block: Option<usize>,
        preserved: Vec<Range<usize>>,
    },
    Done(SectionSpan),
}

/// Finds the span of one section inside a document.
pub struct Locator<'d, 'a> {
    doc: &'d Document<'a>,
    path: &'d SectionPath,
    preserve: &'d [String],
}

impl<'d, 'a> Locator<'d, 'a> {
    /// `preserve` only takes effect for top-level sections.
    pub fn new(doc: &'d Document<'a>, path: &'d SectionPath, preserve: &'d [String]) -> Self {
        let preserve: &'d [String] = if path.supports_preserved_keys() {
            preserve
        } else {
            &[]
        };
        Locator {
            doc,
            path,
            preserve,
        }
    }

    pub fn locate(&self) -> SectionSpan {
        let mut state = State::SeekingHeader;
        for (i, line) in self.doc.lines().iter().enumerate() {
            state = match self.step(state, i, line) {
                State::Done(span) => return span,
                next => next,
            };
        }
        self.finish(state)
    }

    fn step(&self, state: State, i: usize, line: &Line<'a>) -> State {
        match state {
            State::SeekingHeader => self.seek_header(i, line),
            State::SeekingChild {
                parent_indent,
                child_indent,
                last_content,
            } => {
                if line.kind == LineKind::Comment && line.indent > parent_indent {
                    return State::SeekingChild {
                        parent_indent,
                        child_indent,
                        last_content: i,
                    };
                }
                if line.kind != LineKind::Content {
                    return State::SeekingChild {
                        parent_indent,
                        child_indent,
                        last_content,
                    };
                }
                if line.indent <= parent_indent {
                    return State::Done(self.synthesize_child(last_content, parent_indent));
                }
                let level = child_indent.unwrap_or(line.indent);
                if line.indent == level && line.is_header(self.child_key()) {
                    return self.start_body(i, line.indent);
                }
                State::SeekingChild {
                    parent_indent,
                    child_indent: Some(level),
                    last_content: i,
                }
            }
            State::ConsumingBody {
                header,
                indent,
                mut last_body,
                mut child_indent,
                mut open_block,
                mut preserved,
            } => {
                match line.kind {
                    LineKind::Blank => {}
                    LineKind::Comment => {
                        if line.indent > indent {
                            last_body = Some(i);
                        }
                    }
                    LineKind::Content if line.indent <= indent => {
                        return State::Done(self.close_body(header, last_body, open_block, preserved));
                    }
                    LineKind::Content => {
                        last_body = Some(i);
                        if !self.preserve.is_empty() {
                            let level = *child_indent.get_or_insert(line.indent);
                            if line.indent <= level {
                                if let Some(start) = open_block.take() {
                                    preserved.push(self.doc.trim_trailing_blank(start..i));
                                }
                                if line.key().is_some_and(|k| self.preserve.iter().any(|p| p == k)) {
                                    open_block = Some(i);
                                }
                            }
                        }
                    }
                }
                State::ConsumingBody {
                    header,
                    indent,
                    last_body,
                    child_indent,
                    open_block,
                    preserved,
                }
            }
            done @ State::Done(_) => done,
        }
    }

    fn seek_header(&self, i: usize, line: &Line<'a>) -> State {
        match self.path {
            SectionPath::Top(key) if line.is_header(key) => self.start_body(i, line.indent),
            SectionPath::Athlete if line.indent == 0 && line.is_header(ATHLETE_PARENT) => {
                self.start_child_search(i, line.indent)
            }
            SectionPath::Nested { parent, .. } if line.is_header(parent) => {
                self.start_child_search(i, line.indent)
            }
            _ => State::SeekingHeader,
        }
    }

    fn start_child_search(&self, parent: usize, parent_indent: usize) -> State {
        State::SeekingChild {
            parent_indent,
            child_indent: None,
            last_content: parent,
        }
    }

    fn start_body(&self, header: usize, indent: usize) -> State {
        State::ConsumingBody {
            header,
            indent,
            last_body: None,
            child_indent: None,
            open_block: None,
            preserved: Vec::new(),
        }
    }

    fn child_key(&self) -> &str {
        match self.path {
            SectionPath::Nested { child, .. } => child,
            _ => ATHLETE_KEY,
        }
    }

    fn close_body(
        &self,
        header: usize,
        last_body: Option<usize>,
        open_block: Option<usize>,
        mut preserved: Vec<Range<usize>>,
    ) -> SectionSpan {
        let end = last_body.map_or(header + 1, |i| i + 1);
        if let Some(start) = open_block {
            preserved.push(self.doc.trim_trailing_blank(start..end));
        }
        SectionSpan {
            anchor: Anchor::Existing {
                header,
                indent: self.doc.lines()[header].indent,
            },
            body: header + 1..end,
            preserved,
        }
    }

    fn synthesize_child(&self, last_content: usize, parent_indent: usize) -> SectionSpan {
        let indent = parent_indent + INDENT_STEP;
        let insert_at = last_content + 1;
        SectionSpan {
            anchor: Anchor::Synthesized {
                insert_at,
                header_lines: vec![format!("{}{}:", " ".repeat(indent), self.child_key())],
                indent,
            },
            body: insert_at..insert_at,
            preserved: Vec::new(),
        }
    }

    fn synthesize_at_end(&self) -> SectionSpan {
        let insert_at = self.doc.last_non_blank().map_or(0, |i| i + 1);
        let pad = " ".repeat(INDENT_STEP);
        let (header_lines, indent) = match self.path {
            SectionPath::Top(key) => (vec![format!("{}:", key)], 0),
            SectionPath::Nested { parent, child } => (
                vec![format!("{}:", parent), format!("{}{}:", pad, child)],
                INDENT_STEP,
            ),
            SectionPath::Athlete => (
                vec![
                    format!("{}:", ATHLETE_PARENT),
                    format!("{}{}:", pad, ATHLETE_KEY),
                ],
                INDENT_STEP,
            ),
        };
        SectionSpan {
            anchor: Anchor::Synthesized {
                insert_at,
                header_lines,
                indent,
            },
            body: insert_at..insert_at,
            preserved: Vec::new(),
        }
    }

    fn finish(&self, state: State) -> SectionSpan {
        match state {
            State::SeekingHeader => self.synthesize_at_end(),
            State::SeekingChild {
                parent_indent,
                last_content,
                ..
            } => self.synthesize_child(last_content, parent_indent),
            State::ConsumingBody {
                header,
                last_body,
                open_block,
                preserved,
                ..
            } => self.close_body(header, last_body, open_block, preserved),
            State::Done(span) => span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(text: &str, path: SectionPath, preserve: &[&str]) -> SectionSpan {
        let doc = Document::parse(text);
        let preserve: Vec<String> = preserve.iter().map(|s| s.to_string()).collect();
        Locator::new(&doc, &path, &preserve).locate()
    }

    #[test]
    fn test_line_classification() {
        let doc = Document::parse("a:\n  # c\n\n    b: 1\r");
        let kinds: Vec<_> = doc.lines().iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Content,
                LineKind::Comment,
                LineKind::Blank,
                LineKind::Content
            ]
        );
        assert_eq!(doc.lines()[3].indent, 4);
        assert_eq!(doc.lines()[3].key(), Some("b"));
        assert!(doc.lines()[0].is_header("a"));
    }

    #[test]
    fn test_split_keeps_trailing_newline() {
        let text = "a: 1\nb: 2\n";
        let doc = Document::parse(text);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.texts(0..doc.len()).collect::<Vec<_>>().join("\n"), text);
    }

    #[test]
    fn test_top_level_body_leaves_trailing_comments() {
        let text = "# top\ngeneral:\n  theme: blue\n  # note\n  units: metric\n\n# appearance\nappearance:\n  locale: en\n";
        let span = locate(text, SectionPath::Top("general".into()), &[]);
        assert_eq!(
            span.anchor,
            Anchor::Existing {
                header: 1,
                indent: 0
            }
        );
        assert_eq!(span.body, 2..5);

        let span = locate(text, SectionPath::Top("appearance".into()), &[]);
        assert_eq!(span.body, 8..9);
    }

    #[test]
    fn test_sibling_level_comment_between_body_lines_is_consumed() {
        let text = "general:\n  a: 1\n# stray\n  b: 2\nnext: 1\n";
        let span = locate(text, SectionPath::Top("general".into()), &[]);
        assert_eq!(span.body, 1..4);
    }

    #[test]
    fn test_nested_existing_child() {
        let text = "appearance:\n  locale: en\n  dashboard:\n    layout: null\n  theme: dark\nother: 1\n";
        let span = locate(
            text,
            SectionPath::Nested {
                parent: "appearance".into(),
                child: "dashboard".into(),
            },
            &[],
        );
        assert_eq!(
            span.anchor,
            Anchor::Existing {
                header: 2,
                indent: 2
            }
        );
        assert_eq!(span.body, 3..4);
    }

    #[test]
    fn test_nested_missing_child_is_synthesized_as_last_child() {
        let text = "appearance:\n  locale: en\n\nother: 1\n";
        let span = locate(
            text,
            SectionPath::Nested {
                parent: "appearance".into(),
                child: "dashboard".into(),
            },
            &[],
        );
        assert_eq!(
            span.anchor,
            Anchor::Synthesized {
                insert_at: 2,
                header_lines: vec!["  dashboard:".into()],
                indent: 2
            }
        );
        assert!(span.body.is_empty());
    }

    #[test]
    fn test_synthesized_child_goes_after_indented_trailing_comment() {
        let text = "appearance:\n  locale: en\n  # dashboard goes here\n\n# next section\nnext: 1\n";
        let span = locate(
            text,
            SectionPath::Nested {
                parent: "appearance".into(),
                child: "dashboard".into(),
            },
            &[],
        );
        assert_eq!(
            span.anchor,
            Anchor::Synthesized {
                insert_at: 3,
                header_lines: vec!["  dashboard:".into()],
                indent: 2
            }
        );
    }

    #[test]
    fn test_deeper_key_with_child_name_is_not_a_child() {
        let text = "appearance:\n  theme:\n    dashboard:\n      x: 1\n";
        let span = locate(
            text,
            SectionPath::Nested {
                parent: "appearance".into(),
                child: "dashboard".into(),
            },
            &[],
        );
        assert!(span.anchor.is_synthesized());
        assert_eq!(span.body, 4..4);
    }

    #[test]
    fn test_athlete_requires_top_level_general() {
        let text = "settings:\n  general:\n    athlete:\n";
        let span = locate(text, SectionPath::Athlete, &[]);
        assert_eq!(
            span.anchor,
            Anchor::Synthesized {
                insert_at: 3,
                header_lines: vec!["general:".into(), "  athlete:".into()],
                indent: 2
            }
        );
    }

    #[test]
    fn test_athlete_found_under_general() {
        let text = "general:\n  theme: blue\n  athlete:\n    birthday: '1990-01-01'\n  units: metric\n";
        let span = locate(text, SectionPath::Athlete, &[]);
        assert_eq!(
            span.anchor,
            Anchor::Existing {
                header: 2,
                indent: 2
            }
        );
        assert_eq!(span.body, 3..4);
    }

    #[test]
    fn test_preserved_child_blocks() {
        let text = "appearance:\n  locale: en\n  dashboard:\n    layout: null\n\n    # keep\n  theme: dark\nnext: 1\n";
        let span = locate(text, SectionPath::Top("appearance".into()), &["dashboard"]);
        assert_eq!(span.body, 1..7);
        assert_eq!(span.preserved, vec![2..6]);
    }

    #[test]
    fn test_preserved_block_at_end_of_body() {
        let text = "appearance:\n  locale: en\n  dashboard:\n    layout: null\n\nnext: 1\n";
        let span = locate(text, SectionPath::Top("appearance".into()), &["dashboard"]);
        assert_eq!(span.body, 1..4);
        assert_eq!(span.preserved, vec![2..4]);
    }

    #[test]
    fn test_preserve_is_ignored_for_nested_paths() {
        let text = "a:\n  b:\n    keep: 1\n";
        let span = locate(
            text,
            SectionPath::Nested {
                parent: "a".into(),
                child: "b".into(),
            },
            &["keep"],
        );
        assert!(span.preserved.is_empty());
    }

    #[test]
    fn test_header_with_inline_comment_is_not_matched() {
        let text = "general: # main\n  a: 1\n";
        let span = locate(text, SectionPath::Top("general".into()), &[]);
        assert_eq!(
            span.anchor,
            Anchor::Synthesized {
                insert_at: 2,
                header_lines: vec!["general:".into()],
                indent: 0
            }
        );
    }

    #[test]
    fn test_header_with_empty_body_at_eof() {
        let span = locate("a: 1\ngeneral:", SectionPath::Top("general".into()), &[]);
        assert_eq!(span.body, 2..2);
    }
}
