use std::sync::LazyLock;

use regex::Regex;

use super::fence::{FenceEvent, FenceTracker};
use super::record::{NormalizedRecord, RecordBlock};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(#{1,3})(?:[ \t]+(.*?))?[ \t]*$").unwrap());
static SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*Source:[ \t]*(\S.*?)[ \t]*$").unwrap());

/// `#`, `##` or `###` heading: (level, text).
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let caps = HEADING_RE.captures(line)?;
    let level = caps.get(1)?.as_str().len() as u8;
    let text = caps.get(2).map_or("", |m| m.as_str());
    Some((level, text))
}

/// `Source: <url>` attribution; an empty value does not count.
pub fn parse_source(line: &str) -> Option<&str> {
    SOURCE_RE.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Declared language, "" when the fence carries no tag.
    pub lang: String,
    /// Lines between the fences, verbatim, joined with `\n`.
    pub body: String,
    /// Line of the opening fence, relative to the entry.
    pub start_line: usize,
    pub unterminated: bool,
}

/// One decomposed entry, with the diagnostics the record itself drops.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub title: String,
    pub source_url: Option<String>,
    pub paragraphs: Vec<String>,
    pub code_blocks: Vec<CodeBlock>,
    pub fences_opened: usize,
    pub fences_closed: usize,
}

impl Entry {
    pub fn prose(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    pub fn to_record(&self) -> NormalizedRecord {
        NormalizedRecord {
            title: self.title.clone(),
            source_url: self.source_url.clone(),
            prose: self.prose(),
            code_blocks: self
                .code_blocks
                .iter()
                .map(|b| RecordBlock {
                    lang: b.lang.clone(),
                    body: b.body.clone(),
                    unterminated: b.unterminated,
                })
                .collect(),
        }
    }

    pub fn unterminated_block(&self) -> Option<&CodeBlock> {
        self.code_blocks.iter().find(|b| b.unterminated)
    }
}

struct OpenBlock<'a> {
    lang: &'a str,
    start_line: usize,
    lines: Vec<&'a str>,
}

impl OpenBlock<'_> {
    fn finish(self, unterminated: bool) -> CodeBlock {
        CodeBlock {
            lang: self.lang.to_string(),
            body: self.lines.join("\n"),
            start_line: self.start_line,
            unterminated,
        }
    }
}

/// Break an entry into title, attribution, prose paragraphs and code blocks.
/// Total: malformed input is repaired, never rejected.
pub fn decompose_entry(text: &str) -> Entry {
    let mut entry = Entry::default();
    let mut title: Option<String> = None;
    let mut seen_fence = false;
    let mut paragraph: Vec<&str> = Vec::new();
    let mut open: Option<OpenBlock> = None;
    let mut tracker = FenceTracker::default();

    for (i, line) in text.lines().enumerate() {
        match tracker.observe(line) {
            FenceEvent::Opened(marker) => {
                flush_paragraph(&mut paragraph, &mut entry.paragraphs);
                seen_fence = true;
                entry.fences_opened += 1;
                open = Some(OpenBlock {
                    lang: marker.lang(),
                    start_line: i,
                    lines: Vec::new(),
                });
            }
            FenceEvent::Inside => {
                if let Some(block) = open.as_mut() {
                    block.lines.push(line);
                }
            }
            FenceEvent::Closed => {
                entry.fences_closed += 1;
                if let Some(block) = open.take() {
                    entry.code_blocks.push(block.finish(false));
                }
            }
            FenceEvent::Outside => {
                if line.trim().is_empty() {
                    flush_paragraph(&mut paragraph, &mut entry.paragraphs);
                } else if let Some((_, heading)) = parse_heading(line) {
                    flush_paragraph(&mut paragraph, &mut entry.paragraphs);
                    if title.is_none() && !seen_fence {
                        title = Some(heading.to_string());
                    }
                } else if let Some(url) = parse_source(line).filter(|_| entry.source_url.is_none()) {
                    flush_paragraph(&mut paragraph, &mut entry.paragraphs);
                    entry.source_url = Some(url.to_string());
                } else {
                    paragraph.push(line);
                }
            }
        }
    }

    if let Some(block) = open.take() {
        entry.code_blocks.push(block.finish(true));
    }
    flush_paragraph(&mut paragraph, &mut entry.paragraphs);
    entry.title = title.unwrap_or_default();
    entry
}

fn flush_paragraph(lines: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join("\n");
    lines.clear();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        paragraphs.push(trimmed.to_string());
    }
}

// ── Tests ──
