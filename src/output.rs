use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::parser::record::{render_document, NormalizedRecord};
use crate::parser::DocumentResult;

#[derive(Debug, Serialize)]
pub struct RecordLine<'a> {
    pub document: usize,
    pub entry: usize,
    #[serde(flatten)]
    pub record: &'a NormalizedRecord,
}

#[derive(Debug, Serialize)]
pub struct FailedLine<'a> {
    pub document: usize,
    pub error: &'a str,
}

/// One JSON Lines row: a record tagged with its position, or the error
/// marker standing in for a failed document.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JsonLine<'a> {
    Record(RecordLine<'a>),
    Failed(FailedLine<'a>),
}

pub fn json_lines(doc: &DocumentResult) -> Vec<JsonLine<'_>> {
    if let Some(error) = &doc.error {
        return vec![JsonLine::Failed(FailedLine {
            document: doc.ordinal,
            error: error.as_str(),
        })];
    }
    doc.records
        .iter()
        .enumerate()
        .map(|(entry, record)| {
            JsonLine::Record(RecordLine {
                document: doc.ordinal,
                entry,
                record,
            })
        })
        .collect()
}

/// Write every document as JSON Lines. Returns the number of lines written.
pub fn write_jsonl<W: Write>(writer: &mut W, docs: &[DocumentResult]) -> Result<usize> {
    let mut written = 0;
    for doc in docs {
        for line in json_lines(doc) {
            serde_json::to_writer(&mut *writer, &line)?;
            writer.write_all(b"\n")?;
            written += 1;
        }
    }
    writer.flush()?;
    Ok(written)
}

/// Normalized corpus text: documents separated by the sentinel on its own line.
/// Failed documents have no records and are left out.
pub fn render_corpus(docs: &[DocumentResult], sentinel: &str) -> String {
    docs.iter()
        .filter(|d| !d.records.is_empty())
        .map(|d| render_document(&d.records))
        .collect::<Vec<_>>()
        .join(&format!("{}\n", sentinel))
}
