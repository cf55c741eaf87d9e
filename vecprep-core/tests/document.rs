use serde_json::json;
use vecprep_core::Document;

#[test]
fn document_builder_collects_metadata() {
    let doc = Document::new("doc-1", "hello")
        .with_metadata("source", "unit")
        .with_metadata("row", 3);

    assert_eq!(doc.id, "doc-1");
    assert_eq!(doc.content, "hello");
    assert_eq!(doc.metadata.get("source"), Some(&json!("unit")));
    assert_eq!(doc.metadata.get("row"), Some(&json!(3)));
}

#[test]
fn document_deserializes_without_metadata() {
    let doc: Document = serde_json::from_value(json!({
        "id": "doc-2",
        "content": "no metadata here"
    }))
    .unwrap();

    assert!(doc.metadata.is_empty());
    assert_eq!(doc.content, "no metadata here");
}
