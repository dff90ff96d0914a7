use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entry::decompose_entry;
use super::fence::fence_for_body;

/// Rule written between serialized entries.
pub const ENTRY_RULE: &str = "--------------------------------";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBlock {
    pub lang: String,
    pub body: String,
    pub unterminated: bool,
}

/// Canonical structured form of one entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub source_url: Option<String>,
    pub prose: String,
    pub code_blocks: Vec<RecordBlock>,
}

impl NormalizedRecord {
    pub fn has_code(&self) -> bool {
        !self.code_blocks.is_empty()
    }

    /// Distinct declared languages, sorted; untagged blocks are left out.
    pub fn code_languages(&self) -> Vec<&str> {
        self.code_blocks
            .iter()
            .map(|b| b.lang.as_str())
            .filter(|l| !l.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.source_url.is_none()
            && self.prose.is_empty()
            && self.code_blocks.is_empty()
    }
}

pub fn decompose(text: &str) -> NormalizedRecord {
    decompose_entry(text).to_record()
}

/// Canonical text for a record. Headings come out at level 3, parts are
/// separated by one blank line, and each fence is long enough that nothing in
/// its body can close it.
pub fn serialize(record: &NormalizedRecord) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !record.title.is_empty() {
        parts.push(format!("### {}", record.title));
    }
    if let Some(url) = &record.source_url {
        parts.push(format!("Source: {}", url));
    }
    if !record.prose.is_empty() {
        parts.push(record.prose.clone());
    }
    for block in &record.code_blocks {
        let fence = fence_for_body(&block.body);
        if block.unterminated {
            parts.push(format!("{}{}\n{}", fence, block.lang, block.body));
        } else {
            parts.push(format!("{}{}\n{}\n{}", fence, block.lang, block.body, fence));
        }
    }

    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

/// True when re-decomposing the serialized record gives the record back.
pub fn is_fixed_point(record: &NormalizedRecord) -> bool {
    decompose(&serialize(record)) == *record
}

/// Serialized entries of one document, joined by dashed rules.
pub fn render_document(records: &[NormalizedRecord]) -> String {
    records
        .iter()
        .map(serialize)
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n\n", ENTRY_RULE))
}

// ── Tests ──
