//! Segmentation and normalization for concatenated documentation corpora.
//!
//! A corpus is split on a literal sentinel into source documents, each
//! document into entries on dashed rules, and each entry into a
//! [`NormalizedRecord`] (title, attribution, prose, fenced code blocks).
//! [`serialize`] turns a record back into canonical text that decomposes to
//! the same record.

pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod stats;

pub use config::SegmentSettings;
pub use error::{Diagnostic, Result, SegmentError};
pub use parser::record::{decompose, serialize, NormalizedRecord, RecordBlock};
pub use parser::splitter::{Corpus, SourceDocument};
pub use parser::{process_document, process_documents, segment, DocumentResult};
pub use stats::CorpusStats;
