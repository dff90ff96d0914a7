use std::ops::Range;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SegmentError};

const BOM: char = '\u{feff}';

/// The full input text, decoded once and never mutated.
#[derive(Debug, Clone)]
pub struct Corpus {
    text: String,
}

impl Corpus {
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.starts_with(BOM) {
            text.remove(0);
        }
        Corpus { text }
    }

    /// Strict UTF-8 decode. Any invalid sequence fails the whole input.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Corpus::from_text(text)),
            Err(e) => Err(SegmentError::Encoding {
                offset: e.utf8_error().valid_up_to(),
            }),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Corpus::from_bytes(bytes)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Every sentinel-delimited span, blanks included (k sentinels → k+1 spans).
    pub fn raw_documents<'a>(&'a self, sentinel: &'a str) -> RawDocuments<'a> {
        RawDocuments::new(&self.text, sentinel)
    }

    /// Sentinel-delimited spans with whitespace-only documents dropped.
    pub fn documents<'a>(&'a self, sentinel: &'a str) -> Documents<'a> {
        Documents {
            inner: self.raw_documents(sentinel),
        }
    }
}

/// One sentinel-bounded chunk of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDocument<'a> {
    /// Position among all raw spans, blanks counted.
    pub ordinal: usize,
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

impl SourceDocument<'_> {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RawDocuments<'a> {
    corpus: &'a str,
    sentinel: &'a str,
    pos: Option<usize>,
    ordinal: usize,
}

impl<'a> RawDocuments<'a> {
    pub fn new(corpus: &'a str, sentinel: &'a str) -> Self {
        RawDocuments {
            corpus,
            sentinel,
            pos: Some(0),
            ordinal: 0,
        }
    }
}

impl<'a> Iterator for RawDocuments<'a> {
    type Item = SourceDocument<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos?;
        let rest = &self.corpus[start..];
        let found = if self.sentinel.is_empty() {
            None
        } else {
            rest.find(self.sentinel)
        };
        let end = match found {
            Some(i) => {
                self.pos = Some(start + i + self.sentinel.len());
                start + i
            }
            None => {
                self.pos = None;
                self.corpus.len()
            }
        };
        let doc = SourceDocument {
            ordinal: self.ordinal,
            start,
            end,
            text: &self.corpus[start..end],
        };
        self.ordinal += 1;
        Some(doc)
    }
}

#[derive(Debug, Clone)]
pub struct Documents<'a> {
    inner: RawDocuments<'a>,
}

impl<'a> Iterator for Documents<'a> {
    type Item = SourceDocument<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for doc in self.inner.by_ref() {
            if doc.is_blank() {
                debug!(ordinal = doc.ordinal, "dropping blank source document");
                continue;
            }
            return Some(doc);
        }
        None
    }
}
