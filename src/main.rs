use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use corpus_segmenter::output::{render_corpus, write_jsonl};
use corpus_segmenter::parser::record::is_fixed_point;
use corpus_segmenter::parser::sections::split_entries;
use corpus_segmenter::{process_documents, segment, Corpus, CorpusStats, SegmentSettings, SourceDocument};

#[derive(Parser)]
#[command(name = "corpus_segmenter", about = "Split documentation corpora into normalized records")]
struct Cli {
    /// Settings file (TOML). Defaults to ./segmenter.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the inter-document sentinel
    #[arg(long, global = true)]
    sentinel: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List source documents and their entry counts
    Split { input: PathBuf },
    /// Decompose every entry and write JSON Lines
    Process {
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Max documents to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Re-emit the corpus in canonical form
    Render {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that every record survives serialize → decompose unchanged
    Verify { input: PathBuf },
    /// Corpus statistics
    Stats {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = SegmentSettings::load(cli.config.as_deref())?;
    if let Some(sentinel) = cli.sentinel {
        settings = settings.with_sentinel(sentinel);
        settings.validate()?;
    }

    let result = match cli.command {
        Commands::Split { input } => {
            let corpus = load(&input)?;
            let mut count = 0;
            println!("{:>5} | {:>10} | {:>10} | {:>7}", "#", "start", "end", "entries");
            println!("{}", "-".repeat(44));
            for doc in corpus.documents(&settings.sentinel) {
                let entries = split_entries(doc.text, &settings).len();
                println!("{:>5} | {:>10} | {:>10} | {:>7}", doc.ordinal, doc.start, doc.end, entries);
                count += 1;
            }
            println!("\n{} documents", count);
            Ok(())
        }
        Commands::Process { input, output, limit } => {
            let corpus = load(&input)?;
            let mut docs: Vec<_> = corpus.documents(&settings.sentinel).collect();
            if let Some(n) = limit {
                docs.truncate(n);
            }
            let counts = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    let counts = process_to(&mut BufWriter::new(file), &docs, &settings, true)?;
                    info!(path = %path.display(), "wrote records");
                    counts
                }
                None => process_to(&mut io::stdout().lock(), &docs, &settings, false)?,
            };
            counts.print();
            Ok(())
        }
        Commands::Render { input, output } => {
            let corpus = load(&input)?;
            let docs = segment(&corpus, &settings);
            let text = render_corpus(&docs, &settings.sentinel);
            match output {
                Some(path) => std::fs::write(&path, text)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => io::stdout().lock().write_all(text.as_bytes())?,
            }
            Ok(())
        }
        Commands::Verify { input } => {
            let corpus = load(&input)?;
            verify(&corpus, &settings)
        }
        Commands::Stats { input, json } => {
            let corpus = load(&input)?;
            let docs: Vec<_> = corpus.documents(&settings.sentinel).collect();
            let stats = CorpusStats::collect(&process_documents(&docs, &settings));
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                stats.print();
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn load(path: &Path) -> anyhow::Result<Corpus> {
    let corpus =
        Corpus::from_path(path).with_context(|| format!("reading corpus {}", path.display()))?;
    info!(path = %path.display(), bytes = corpus.text().len(), "loaded corpus");
    Ok(corpus)
}

struct ProcessCounts {
    documents: usize,
    failed: usize,
    records: usize,
    lines: usize,
}

impl ProcessCounts {
    fn print(&self) {
        eprintln!(
            "Processed {} documents ({} failed): {} records, {} lines.",
            self.documents, self.failed, self.records, self.lines,
        );
    }
}

fn process_to<W: Write>(
    writer: &mut W,
    docs: &[SourceDocument],
    settings: &SegmentSettings,
    progress: bool,
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = if progress {
        let pb = ProgressBar::new(docs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut counts = ProcessCounts {
        documents: 0,
        failed: 0,
        records: 0,
        lines: 0,
    };

    for chunk in docs.chunks(500) {
        let results: Vec<_> = process_documents(chunk, settings)
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect();
        for r in &results {
            counts.documents += 1;
            counts.records += r.records.len();
            if r.error.is_some() {
                counts.failed += 1;
            }
        }
        counts.lines += write_jsonl(writer, &results)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn verify(corpus: &Corpus, settings: &SegmentSettings) -> anyhow::Result<()> {
    let docs = segment(corpus, settings);
    let mut checked = 0;
    let mut mismatches = 0;

    for doc in &docs {
        for (i, record) in doc.records.iter().enumerate() {
            checked += 1;
            if !is_fixed_point(record) {
                mismatches += 1;
                println!("document {} entry {}: round trip changed {:?}", doc.ordinal, i, record.title);
            }
        }
    }

    let rendered = Corpus::from_text(render_corpus(&docs, &settings.sentinel));
    let again = segment(&rendered, settings);
    let before: Vec<_> = docs.iter().filter(|d| d.error.is_none()).map(|d| &d.records).collect();
    let after: Vec<_> = again.iter().map(|d| &d.records).collect();
    if before != after {
        mismatches += 1;
        println!("re-segmenting the rendered corpus gave different records");
    }

    println!("Checked {} records across {} documents.", checked, docs.len());
    if mismatches > 0 {
        bail!("{} round-trip mismatches", mismatches);
    }
    println!("Round trip OK.");
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
