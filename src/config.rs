use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

use crate::error::{Result, SegmentError};

pub const DEFAULT_SENTINEL: &str = "@@@CORPUS_DOC_BOUNDARY_5c1e9a7f@@@";
const DEFAULT_SETTINGS_FILE: &str = "segmenter";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SegmentSettings {
    /// Literal inter-document delimiter. Matched as plain text, never as a pattern.
    pub sentinel: String,
    /// Let a heading start a new entry even without a dashed rule before it.
    pub split_on_headings: bool,
    /// Deepest heading level (1..=3) allowed to start an entry on its own.
    pub heading_split_level: u8,
    /// Documents larger than this are reported as failed instead of parsed.
    pub max_document_bytes: Option<usize>,
    /// Fan documents out over the rayon pool (needs the `rayon` feature).
    pub parallel: bool,
}

impl Default for SegmentSettings {
    fn default() -> Self {
        SegmentSettings {
            sentinel: DEFAULT_SENTINEL.to_string(),
            split_on_headings: true,
            heading_split_level: 3,
            max_document_bytes: None,
            parallel: true,
        }
    }
}

impl SegmentSettings {
    /// Load settings from `path` (must exist) or from an optional
    /// `segmenter.toml` in the working directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };
        let settings: SegmentSettings = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sentinel.is_empty() {
            return Err(SegmentError::InvalidSettings {
                message: "sentinel must not be empty".into(),
            });
        }
        if !(1..=3).contains(&self.heading_split_level) {
            return Err(SegmentError::InvalidSettings {
                message: format!(
                    "heading_split_level must be between 1 and 3, got {}",
                    self.heading_split_level
                ),
            });
        }
        Ok(())
    }
}
