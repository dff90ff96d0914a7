pub mod entry;
pub mod fence;
pub mod record;
pub mod sections;
pub mod splitter;

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::config::SegmentSettings;
use crate::error::{Diagnostic, SegmentError};
use record::NormalizedRecord;
use splitter::{Corpus, SourceDocument};

/// Everything produced for one source document, in entry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResult {
    pub ordinal: usize,
    pub start: usize,
    pub end: usize,
    pub records: Vec<NormalizedRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the document could not be parsed; `records` is then empty.
    pub error: Option<String>,
}

impl DocumentResult {
    fn new(doc: &SourceDocument) -> Self {
        DocumentResult {
            ordinal: doc.ordinal,
            start: doc.start,
            end: doc.end,
            records: Vec::new(),
            diagnostics: Vec::new(),
            error: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.records.is_empty()
    }
}

/// Three-stage pipeline: document → entry candidates → entries → records.
pub fn process_document(doc: &SourceDocument, settings: &SegmentSettings) -> DocumentResult {
    let mut result = DocumentResult::new(doc);

    if let Some(limit) = settings.max_document_bytes {
        if doc.text.len() > limit {
            let err = SegmentError::DocumentTooLarge {
                ordinal: doc.ordinal,
                size: doc.text.len(),
                limit,
            };
            warn!(ordinal = doc.ordinal, "{}", err);
            result.error = Some(err.to_string());
            return result;
        }
    }

    for candidate in sections::split_entries(doc.text, settings) {
        let entry = entry::decompose_entry(candidate.text);
        if let Some(block) = entry.unterminated_block() {
            let line = candidate.first_line + block.start_line;
            debug!(
                ordinal = doc.ordinal,
                entry = candidate.index,
                line,
                "closing unterminated code fence at end of entry"
            );
            result.diagnostics.push(Diagnostic::MalformedFence {
                entry: candidate.index,
                line,
            });
        }
        let record = entry.to_record();
        if record.is_empty() {
            debug!(ordinal = doc.ordinal, entry = candidate.index, "dropping empty entry");
            continue;
        }
        result.records.push(record);
    }

    if result.records.is_empty() {
        debug!(ordinal = doc.ordinal, "source document has no entries");
        result.diagnostics.push(Diagnostic::EmptySourceDocument);
    }
    result
}

/// Run one document, turning a panic into an error marker so siblings
/// still complete.
fn process_isolated<F>(doc: &SourceDocument, settings: &SegmentSettings, work: &F) -> DocumentResult
where
    F: Fn(&SourceDocument<'_>, &SegmentSettings) -> DocumentResult,
{
    panic::catch_unwind(AssertUnwindSafe(|| work(doc, settings))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "document parser panicked".to_string());
        warn!(ordinal = doc.ordinal, error = %message, "document failed");
        let mut result = DocumentResult::new(doc);
        result.error = Some(message);
        result
    })
}

#[cfg(feature = "rayon")]
fn run_documents<F>(docs: &[SourceDocument], settings: &SegmentSettings, work: F) -> Vec<DocumentResult>
where
    F: Fn(&SourceDocument<'_>, &SegmentSettings) -> DocumentResult + Sync,
{
    use rayon::prelude::*;

    if settings.parallel {
        docs.par_iter().map(|d| process_isolated(d, settings, &work)).collect()
    } else {
        docs.iter().map(|d| process_isolated(d, settings, &work)).collect()
    }
}

#[cfg(not(feature = "rayon"))]
fn run_documents<F>(docs: &[SourceDocument], settings: &SegmentSettings, work: F) -> Vec<DocumentResult>
where
    F: Fn(&SourceDocument<'_>, &SegmentSettings) -> DocumentResult + Sync,
{
    docs.iter().map(|d| process_isolated(d, settings, &work)).collect()
}

/// Parse every document, one isolated task each. Output follows input order.
pub fn process_documents(docs: &[SourceDocument], settings: &SegmentSettings) -> Vec<DocumentResult> {
    run_documents(docs, settings, process_document)
}

/// Split and parse a whole corpus. Documents with no entries are dropped;
/// output follows corpus order.
pub fn segment(corpus: &Corpus, settings: &SegmentSettings) -> Vec<DocumentResult> {
    let docs: Vec<_> = corpus.documents(&settings.sentinel).collect();
    process_documents(&docs, settings)
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect()
}

// ── Tests ──
