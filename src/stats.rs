use std::collections::BTreeMap;

use serde::Serialize;

use crate::parser::DocumentResult;

/// Counts and prose-length figures over a processed corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusStats {
    pub documents: usize,
    pub empty_documents: usize,
    pub failed_documents: usize,
    pub entries: usize,
    pub with_source: usize,
    pub code_blocks: usize,
    pub unterminated: usize,
    pub prose: LengthStats,
    /// Code blocks per declared language; untagged blocks count under "".
    pub languages: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LengthStats {
    pub count: usize,
    pub total_chars: usize,
    pub avg_length: f64,
    pub min_length: usize,
    pub max_length: usize,
}

impl LengthStats {
    pub fn from_lengths(lengths: &[usize]) -> Self {
        if lengths.is_empty() {
            return LengthStats::default();
        }
        let total: usize = lengths.iter().sum();
        LengthStats {
            count: lengths.len(),
            total_chars: total,
            avg_length: total as f64 / lengths.len() as f64,
            min_length: lengths.iter().copied().min().unwrap_or(0),
            max_length: lengths.iter().copied().max().unwrap_or(0),
        }
    }
}

impl CorpusStats {
    /// `docs` should include empty documents when they are to be counted.
    pub fn collect(docs: &[DocumentResult]) -> Self {
        let mut stats = CorpusStats {
            documents: docs.len(),
            ..Default::default()
        };
        let mut prose_lengths = Vec::new();

        for doc in docs {
            if doc.error.is_some() {
                stats.failed_documents += 1;
                continue;
            }
            if doc.records.is_empty() {
                stats.empty_documents += 1;
            }
            for record in &doc.records {
                stats.entries += 1;
                if record.source_url.is_some() {
                    stats.with_source += 1;
                }
                if !record.prose.is_empty() {
                    prose_lengths.push(record.prose.chars().count());
                }
                for block in &record.code_blocks {
                    stats.code_blocks += 1;
                    if block.unterminated {
                        stats.unterminated += 1;
                    }
                    *stats.languages.entry(block.lang.clone()).or_default() += 1;
                }
            }
        }

        stats.prose = LengthStats::from_lengths(&prose_lengths);
        stats
    }

    pub fn print(&self) {
        println!("Documents:    {}", self.documents);
        println!("  empty:      {}", self.empty_documents);
        println!("  failed:     {}", self.failed_documents);
        println!("Entries:      {}", self.entries);
        println!("  w/ source:  {}", self.with_source);
        println!("Code blocks:  {}", self.code_blocks);
        println!("  unclosed:   {}", self.unterminated);
        println!(
            "Prose chars:  {} total, {:.1} avg, {} min, {} max ({} entries)",
            self.prose.total_chars,
            self.prose.avg_length,
            self.prose.min_length,
            self.prose.max_length,
            self.prose.count,
        );
        if !self.languages.is_empty() {
            println!("\n--- Languages ---");
            let mut by_count: Vec<_> = self.languages.iter().collect();
            by_count.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (lang, n) in by_count {
                let name = if lang.is_empty() { "(untagged)" } else { lang.as_str() };
                println!("  {:<16} {:>6}", name, n);
            }
        }
    }
}
