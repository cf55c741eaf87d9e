#![cfg(feature = "loaders")]

use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use vecprep::prelude::*;

#[tokio::test]
async fn prelude_covers_load_and_split() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("CREATE TABLE notes (body TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO notes (body) VALUES (?1)")
        .bind("one two three four five six seven eight nine ten eleven twelve")
        .execute(&pool)
        .await
        .unwrap();

    let loader = DocLoader::from_params(
        pool,
        &json!({"owner": "main", "tablename": "notes", "colname": "body"}),
    )
    .unwrap();
    let splitter = TextSplitter::new(
        WindowChunkEngine::new(),
        SplitterParams::new(ChunkBy::Words, 10).with_split(SplitBoundary::Space),
    )
    .unwrap();

    let chunks: Vec<Document> = load_and_split(&loader, &splitter).await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].content, "one two three four five six seven eight nine ten");
    assert_eq!(chunks[1].content, "eleven twelve");
    assert_eq!(chunks[1].metadata["chunk_index"], json!(1));
}
