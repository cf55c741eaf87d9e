use vecprep_loaders::{
    load_and_split, ChunkBy, DocLoader, LoaderSource, SplitBoundary, SplitterParams, TextSplitter,
    WindowChunkEngine,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("CREATE TABLE articles(body TEXT)")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO articles(body) VALUES (?), (?)")
        .bind("Rust is fast. It is also memory safe. Many teams ship it to production.")
        .bind("Chunking keeps each embedding request small enough for the model.")
        .execute(&pool)
        .await?;

    let loader = DocLoader::new(pool, LoaderSource::table("main", "articles", "body"))?;
    let splitter = TextSplitter::new(
        WindowChunkEngine::new(),
        SplitterParams::new(ChunkBy::Chars, 50)
            .with_overlap(10)
            .with_split(SplitBoundary::Sentence),
    )?;

    for chunk in load_and_split(&loader, &splitter).await? {
        println!("{} => {}", chunk.id, chunk.content);
    }
    Ok(())
}
