use std::sync::LazyLock;

use regex::Regex;

use super::entry::parse_heading;
use super::fence::{FenceEvent, FenceTracker};
use crate::config::SegmentSettings;

static RULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]*-{4,}[ \t]*$").unwrap());

/// Text of one entry before decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCandidate<'a> {
    pub index: usize,
    /// Line number of the first line within the source document.
    pub first_line: usize,
    pub text: &'a str,
}

pub fn is_rule(line: &str) -> bool {
    RULE_RE.is_match(line)
}

#[derive(Default)]
struct Pending {
    start: Option<usize>,
    end: usize,
    first_line: usize,
    has_body: bool,
}

/// Split a source document into entries on dashed rules (and, when enabled,
/// on headings that follow body text). Rules inside code fences are content.
pub fn split_entries<'a>(doc: &'a str, settings: &SegmentSettings) -> Vec<EntryCandidate<'a>> {
    let mut entries = Vec::new();
    let mut tracker = FenceTracker::default();
    let mut pending = Pending::default();
    let mut offset = 0;

    for (line_no, raw) in doc.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw.len();
        let line = strip_newline(raw);
        let blank = line.trim().is_empty();

        let event = tracker.observe(line);
        let heading = match event {
            FenceEvent::Outside => parse_heading(line),
            _ => None,
        };

        if event == FenceEvent::Outside {
            if is_rule(line) {
                flush(doc, &mut pending, &mut entries);
                continue;
            }
            let splits_here = heading.is_some_and(|(level, _)| {
                settings.split_on_headings && level <= settings.heading_split_level
            });
            if splits_here && pending.has_body {
                flush(doc, &mut pending, &mut entries);
            }
        }

        if blank {
            continue;
        }
        if pending.start.is_none() {
            pending.start = Some(line_start);
            pending.first_line = line_no;
        }
        pending.end = line_start + line.len();
        if heading.is_none() {
            pending.has_body = true;
        }
    }

    flush(doc, &mut pending, &mut entries);
    entries
}

fn strip_newline(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}

fn flush<'a>(doc: &'a str, pending: &mut Pending, entries: &mut Vec<EntryCandidate<'a>>) {
    let taken = std::mem::take(pending);
    if let Some(start) = taken.start {
        entries.push(EntryCandidate {
            index: entries.len(),
            first_line: taken.first_line,
            text: &doc[start..taken.end],
        });
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(doc: &str) -> Vec<&str> {
        split_entries(doc, &SegmentSettings::default())
            .into_iter()
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn dashed_rule_splits() {
        let doc = "### A\n\nfirst\n\n--------------------------------\n\n### B\n\nsecond\n";
        assert_eq!(texts(doc), vec!["### A\n\nfirst", "### B\n\nsecond"]);
    }

    #[test]
    fn three_dashes_is_not_a_rule() {
        let doc = "text\n---\nmore";
        assert_eq!(texts(doc).len(), 1);
    }

    #[test]
    fn rule_inside_fence_is_content() {
        let doc = "### Table\n\n```text\nname | age\n---- | ----\n--------\n```\n\nafter";
        let e = texts(doc);
        assert_eq!(e.len(), 1);
        assert!(e[0].contains("--------"));
        assert!(e[0].ends_with("after"));
    }

    #[test]
    fn rule_inside_unterminated_fence_never_splits() {
        let doc = "```sh\n$ ls\n----------\n### Not a heading";
        assert_eq!(texts(doc).len(), 1);
    }

    #[test]
    fn heading_after_body_starts_new_entry() {
        let doc = "### A\nalpha\n### B\nbeta";
        assert_eq!(texts(doc), vec!["### A\nalpha", "### B\nbeta"]);
    }

    #[test]
    fn stacked_headings_stay_together() {
        let doc = "# Title\n## Subtitle\nbody";
        assert_eq!(texts(doc).len(), 1);
    }

    #[test]
    fn heading_inside_fence_does_not_split() {
        let doc = "### A\n```md\n### inside\n```\n";
        assert_eq!(texts(doc).len(), 1);
    }

    #[test]
    fn outer_length_close_inside_nested_fence_ends_block() {
        let doc = "### A\n````md\n```js\n````\n-----\n### B\nb\n-----\n### C\nc";
        let e = texts(doc);
        assert_eq!(e.len(), 3);
        assert_eq!(e[0], "### A\n````md\n```js\n````");
        assert_eq!(e[2], "### C\nc");
    }

    #[test]
    fn heading_split_can_be_disabled() {
        let settings = SegmentSettings {
            split_on_headings: false,
            ..Default::default()
        };
        let doc = "### A\nalpha\n### B\nbeta";
        assert_eq!(split_entries(doc, &settings).len(), 1);
    }

    #[test]
    fn deeper_headings_than_limit_do_not_split() {
        let settings = SegmentSettings {
            heading_split_level: 2,
            ..Default::default()
        };
        let doc = "## A\nalpha\n### B\nbeta";
        assert_eq!(split_entries(doc, &settings).len(), 1);
    }

    #[test]
    fn blank_candidates_dropped_and_lines_tracked() {
        let doc = "\n\n-----\n\n   \n-----\nonly\n";
        let e = split_entries(doc, &SegmentSettings::default());
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].text, "only");
        assert_eq!(e[0].first_line, 6);
        assert_eq!(e[0].index, 0);
    }

    #[test]
    fn crlf_lines() {
        let doc = "### A\r\nx\r\n-----\r\n### B\r\ny\r\n";
        assert_eq!(texts(doc), vec!["### A\r\nx", "### B\r\ny"]);
    }
}
