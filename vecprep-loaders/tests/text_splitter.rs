use std::collections::HashMap;

use serde_json::json;
use vecprep_core::Document;
use vecprep_loaders::{
    ChunkBy, ChunkLimits, ErrorKind, SplitBoundary, SplitterParams, TextSplitter,
    WindowChunkEngine,
};

const DOC: &str = "Langchain is a wonderful framework to load, split, chunk
                and embed your data!!";

fn relaxed_engine() -> WindowChunkEngine {
    WindowChunkEngine::with_limits(ChunkLimits {
        min_words: 1,
        min_chars: 1,
        ..ChunkLimits::default()
    })
}

#[tokio::test]
async fn splitter_produces_chunks_for_valid_parameter_sets() {
    let parameter_sets = [
        json!({"by": "words", "max": "1000", "overlap": "200", "split": "custom",
               "custom_list": [","], "extended": "true", "normalize": "all"}),
        json!({"by": "chars", "max": "4000", "overlap": "800", "split": "NEWLINE",
               "normalize": "all"}),
        json!({"by": "chars", "max": "50", "overlap": "10", "split": "SPACE",
               "normalize": "all"}),
        json!({"by": "chars", "max": "50", "overlap": "10", "split": "SENTENCE"}),
        json!({"by": "words", "max": "10", "overlap": "2", "split": "RECURSIVELY"}),
    ];

    for params in parameter_sets {
        let splitter = TextSplitter::from_params(WindowChunkEngine::new(), &params)
            .unwrap_or_else(|err| panic!("{params} should be valid: {err}"));

        let first = splitter.split_text(DOC).await.expect("split");
        let second = splitter.split_text(DOC).await.expect("split again");

        assert!(!first.is_empty(), "{params} produced no chunks");
        assert_eq!(first, second, "{params} is not deterministic");
    }
}

#[tokio::test]
async fn splitter_respects_char_maximum() {
    let splitter = TextSplitter::new(
        WindowChunkEngine::new(),
        SplitterParams::new(ChunkBy::Chars, 50)
            .with_overlap(10)
            .with_split(SplitBoundary::Space),
    )
    .expect("valid params");

    let chunks = splitter.split_text(DOC).await.expect("split");

    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 50));
    assert!(chunks[0].starts_with("Langchain is a wonderful"));
}

#[test]
fn splitter_rejects_invalid_parameters_before_any_call() {
    for params in [
        json!({"by": "xyz"}),
        json!({"by": "chars", "max": "10", "overlap": "2", "split": "SPACE", "normalize": "all"}),
        json!({"by": "words", "max": "5", "overlap": "2", "split": "SPACE", "normalize": "all"}),
        json!({"by": "words", "max": "50", "overlap": "2", "split": "SENTENCE", "normalize": "all"}),
    ] {
        let error = TextSplitter::from_params(WindowChunkEngine::new(), &params)
            .err()
            .unwrap_or_else(|| panic!("{params} should be rejected"));
        assert_eq!(error.kind(), ErrorKind::Validation, "{params}");
    }
}

#[tokio::test]
async fn splitter_returns_nothing_for_empty_text() {
    let splitter = TextSplitter::new(WindowChunkEngine::new(), SplitterParams::default())
        .expect("defaults are valid");

    assert!(splitter.split_text("").await.expect("split").is_empty());
}

#[tokio::test]
async fn split_documents_propagates_metadata() {
    let splitter = TextSplitter::new(
        relaxed_engine(),
        SplitterParams::new(ChunkBy::Words, 2).with_split(SplitBoundary::Space),
    )
    .expect("valid params");

    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), json!("unit-test.txt"));
    let input = Document {
        id: "doc-1".to_string(),
        content: "one two three four five".to_string(),
        metadata,
    };

    let chunks = splitter.split_documents(&[input]).await.expect("split documents");

    let contents: Vec<&str> = chunks.iter().map(|doc| doc.content.as_str()).collect();
    assert_eq!(contents, vec!["one two", "three four", "five"]);
    for (index, doc) in chunks.iter().enumerate() {
        assert_eq!(doc.id, format!("doc-1#chunk{index}"));
        assert_eq!(doc.metadata.get("source"), Some(&json!("unit-test.txt")));
        assert_eq!(doc.metadata.get("parent_id"), Some(&json!("doc-1")));
        assert_eq!(doc.metadata.get("chunk_index"), Some(&json!(index)));
    }
}
