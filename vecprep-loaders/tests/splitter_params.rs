use serde_json::json;
use vecprep_loaders::{
    ChunkBy, ChunkLimits, ErrorKind, IngestionError, LoaderSource, Normalize, SplitBoundary,
    SplitterParams, ValidationError,
};

#[test]
fn splitter_params_parse_string_encoded_values() {
    let params = SplitterParams::from_value(&json!({
        "by": "words",
        "max": "1000",
        "overlap": "200",
        "split": "custom",
        "custom_list": [","],
        "extended": "true",
        "normalize": "all"
    }))
    .expect("valid params");

    assert_eq!(params.by, ChunkBy::Words);
    assert_eq!(params.max, 1000);
    assert_eq!(params.overlap, 200);
    assert_eq!(params.split, SplitBoundary::Custom(vec![",".to_string()]));
    assert!(params.extended);
    assert_eq!(params.normalize, Normalize::All);
}

#[test]
fn splitter_params_accept_numbers_and_uppercase_split() {
    let params = SplitterParams::from_value(&json!({
        "by": "chars",
        "max": 4000,
        "overlap": 800,
        "split": "NEWLINE"
    }))
    .expect("valid params");

    assert_eq!(params.by, ChunkBy::Chars);
    assert_eq!(params.split, SplitBoundary::Newline);
    assert_eq!(params.normalize, Normalize::None);
}

#[test]
fn splitter_params_default_to_recursive_words() {
    let params = SplitterParams::from_value(&json!({})).expect("empty mapping is valid");
    assert_eq!(params, SplitterParams::default());
    assert_eq!(params.max, 100);
}

#[test]
fn splitter_params_reject_unknown_by_value() {
    let error = SplitterParams::from_value(&json!({"by": "xyz"})).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!(error.to_string(), "invalid value xyz for BY parameter");
}

#[test]
fn splitter_params_reject_non_numeric_max() {
    let error = SplitterParams::from_value(&json!({"max": "lots"})).unwrap_err();
    assert!(matches!(
        error,
        IngestionError::Validation(ValidationError::InvalidMaximum(raw)) if raw == "lots"
    ));
}

#[test]
fn splitter_params_require_custom_list_for_custom_split() {
    let error = SplitterParams::from_value(&json!({"split": "custom"})).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Configuration);

    let error = SplitterParams::from_value(&json!({"split": "space", "custom_list": [";"]}))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[test]
fn splitter_params_reject_unknown_keys() {
    let error = SplitterParams::from_value(&json!({"chunk_size": 10})).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[test]
fn validation_enforces_unit_dependent_minimum() {
    let limits = ChunkLimits::default();

    let chars = SplitterParams::new(ChunkBy::Chars, 10).with_overlap(2);
    let error = chars.validate(&limits).unwrap_err();
    assert_eq!(error.to_string(), "invalid text chunking MAXIMUM - '10'");

    let words = SplitterParams::new(ChunkBy::Words, 5).with_overlap(2);
    assert_eq!(words.validate(&limits).unwrap_err().kind(), ErrorKind::Validation);

    assert!(SplitterParams::new(ChunkBy::Words, 10).validate(&limits).is_ok());
    assert!(SplitterParams::new(ChunkBy::Chars, 50).validate(&limits).is_ok());
}

#[test]
fn validation_raises_ceiling_for_extended_params() {
    let limits = ChunkLimits::default();
    let params = SplitterParams::new(ChunkBy::Chars, 8000);

    assert!(params.validate(&limits).is_err());
    assert!(params.with_extended(true).validate(&limits).is_ok());
}

#[test]
fn validation_rejects_sentence_split_by_words() {
    let params = SplitterParams::new(ChunkBy::Words, 50)
        .with_overlap(2)
        .with_split(SplitBoundary::Sentence);

    let error = params.validate(&ChunkLimits::default()).unwrap_err();
    assert!(matches!(
        error,
        IngestionError::Validation(ValidationError::InvalidSplitBy(_))
    ));
    assert_eq!(error.to_string(), "invalid text chunking SPLIT BY - SENTENCE");
}

#[test]
fn validation_rejects_overlap_not_below_max() {
    let params = SplitterParams::new(ChunkBy::Words, 10).with_overlap(10);
    let error = params.validate(&ChunkLimits::default()).unwrap_err();
    assert!(matches!(
        error,
        IngestionError::Validation(ValidationError::InvalidOverlap(_))
    ));
}

#[test]
fn params_round_trip_into_engine_mapping() {
    let params = SplitterParams::new(ChunkBy::Words, 300)
        .with_split(SplitBoundary::Custom(vec![";".to_string()]));

    assert_eq!(
        params.to_value(),
        json!({
            "by": "words",
            "max": "300",
            "overlap": "0",
            "split": "custom",
            "custom_list": [";"],
            "extended": false,
            "normalize": "none"
        })
    );
}

#[test]
fn loader_source_requires_exactly_one_selector() {
    let both = LoaderSource::from_value(&json!({"file": "a.txt", "dir": "docs"})).unwrap_err();
    assert_eq!(both.kind(), ErrorKind::Configuration);

    let none = LoaderSource::from_value(&json!({})).unwrap_err();
    assert_eq!(none.kind(), ErrorKind::Configuration);

    let partial =
        LoaderSource::from_value(&json!({"owner": "hr", "tablename": "DOCS"})).unwrap_err();
    assert!(partial.to_string().contains("colname"));

    let mixed = LoaderSource::from_value(&json!({
        "owner": "hr", "tablename": "DOCS", "colname": "TEXT", "file": "a.txt"
    }))
    .unwrap_err();
    assert_eq!(mixed.kind(), ErrorKind::Configuration);
}

#[test]
fn loader_source_parses_each_selector() {
    assert_eq!(
        LoaderSource::from_value(&json!({"owner": "hr", "tablename": "DOCS", "colname": "TEXT"}))
            .unwrap(),
        LoaderSource::table("hr", "DOCS", "TEXT")
    );
    assert_eq!(
        LoaderSource::from_value(&json!({"file": "a.txt"})).unwrap(),
        LoaderSource::file("a.txt")
    );
    assert_eq!(
        LoaderSource::from_value(&json!({"dir": "docs"})).unwrap(),
        LoaderSource::dir("docs")
    );
}
