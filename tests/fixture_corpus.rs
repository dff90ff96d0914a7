use std::path::Path;

use corpus_segmenter::output::{render_corpus, write_jsonl};
use corpus_segmenter::parser::record::is_fixed_point;
use corpus_segmenter::{
    process_documents, segment, Corpus, CorpusStats, Diagnostic, SegmentError, SegmentSettings,
};

const FIXTURE: &str = "tests/fixtures/context7_sample.md";

fn load() -> Corpus {
    Corpus::from_path(Path::new(FIXTURE)).unwrap()
}

#[test]
fn blank_document_between_sentinels_is_dropped() {
    let corpus = load();
    let sentinel = &SegmentSettings::default().sentinel;
    assert_eq!(corpus.raw_documents(sentinel).count(), 4);
    let ordinals: Vec<_> = corpus.documents(sentinel).map(|d| d.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 3]);
}

#[test]
fn clickhouse_document() {
    let docs = segment(&load(), &SegmentSettings::default());
    let ch = &docs[0];
    assert_eq!(ch.records.len(), 3);

    let titles: Vec<_> = ch.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Example HTTP Handler Rule (XML)",
            "ClickHouse Server Unclean Restart Log Example",
            "clickhouse-benchmark Usage Examples",
        ]
    );
    assert!(ch.records.iter().all(|r| r
        .source_url
        .as_deref()
        .is_some_and(|u| u.starts_with("https://github.com/clickhouse/"))));

    let bash = &ch.records[2].code_blocks[0];
    assert_eq!(bash.lang, "bash");
    assert!(bash.body.contains("\n\n$ echo"));
}

#[test]
fn nested_fence_and_table_rules_stay_inside_blocks() {
    let docs = segment(&load(), &SegmentSettings::default());
    let widgets = &docs[1];
    assert_eq!(widgets.records.len(), 3);

    let readme = &widgets.records[0];
    assert_eq!(readme.title, "README");
    assert_eq!(readme.code_languages(), vec!["js", "sh"]);
    assert_eq!(
        readme.prose,
        "Widgets is a small library for rendering widgets.\n\nInstall it with your package manager, then import it."
    );

    let nested = &widgets.records[1];
    assert_eq!(nested.code_blocks.len(), 1);
    let body = &nested.code_blocks[0].body;
    assert_eq!(nested.code_blocks[0].lang, "markdown");
    assert!(body.starts_with("## Example"));
    assert!(body.contains("```js\nconst w = new Widget();\n```"));
    assert!(body.ends_with("--------"));

    let table = &widgets.records[2];
    assert_eq!(table.title, "Table output");
    assert!(table.source_url.is_none());
    assert!(table.code_blocks[0].body.contains("--------  ------"));
}

#[test]
fn changelog_document() {
    let docs = segment(&load(), &SegmentSettings::default());
    let log = &docs[2];
    assert_eq!(log.ordinal, 3);
    assert_eq!(log.records.len(), 3);

    assert_eq!(log.records[0].title, "Changelog");
    assert!(log.records[0].prose.starts_with("- Dropped Node 14."));

    let note = &log.records[1];
    assert_eq!(note.title, "");
    assert!(!note.has_code());
    assert_eq!(note.prose, "Free-standing note with no heading and no code.");

    let diff = &log.records[2].code_blocks[0];
    assert!(diff.unterminated);
    assert_eq!(
        diff.body,
        "- widget.render(el)\n+ widget.render({ target: el })"
    );
    assert!(matches!(
        log.diagnostics.as_slice(),
        [Diagnostic::MalformedFence { entry: 2, .. }]
    ));
}

#[test]
fn every_record_is_a_fixed_point() {
    let docs = segment(&load(), &SegmentSettings::default());
    for doc in &docs {
        for record in &doc.records {
            assert!(is_fixed_point(record), "not a fixed point: {:?}", record.title);
        }
    }
}

#[test]
fn rendered_corpus_gives_same_records() {
    let settings = SegmentSettings::default();
    let first = segment(&load(), &settings);
    let rendered = Corpus::from_text(render_corpus(&first, &settings.sentinel));
    let second = segment(&rendered, &settings);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.records, b.records);
    }
}

#[test]
fn stats_over_fixture() {
    let corpus = load();
    let settings = SegmentSettings::default();
    let docs: Vec<_> = corpus.documents(&settings.sentinel).collect();
    let stats = CorpusStats::collect(&process_documents(&docs, &settings));

    assert_eq!(stats.documents, 3);
    assert_eq!(stats.empty_documents, 0);
    assert_eq!(stats.entries, 9);
    assert_eq!(stats.with_source, 6);
    assert_eq!(stats.code_blocks, 8);
    assert_eq!(stats.unterminated, 1);
    assert_eq!(stats.languages.get("text"), Some(&2));
}

#[test]
fn jsonl_file_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.jsonl");
    let docs = segment(&load(), &SegmentSettings::default());

    let mut file = std::fs::File::create(&path).unwrap();
    let written = write_jsonl(&mut file, &docs).unwrap();
    assert_eq!(written, 9);

    let text = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[3]["document"], 1);
    assert_eq!(rows[3]["entry"], 0);
    assert_eq!(rows[3]["title"], "README");
    assert_eq!(rows[8]["code_blocks"][0]["unterminated"], true);
}

#[test]
fn invalid_utf8_file_produces_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.md");
    std::fs::write(&path, b"# Title\n\xc3\x28 broken\n").unwrap();
    match Corpus::from_path(&path) {
        Err(SegmentError::Encoding { offset }) => assert_eq!(offset, 8),
        other => panic!("expected encoding error, got {:?}", other.map(|c| c.text().len())),
    }
}
