//! Document loaders and text splitters backed by a relational database.
//!
//! - [`DocLoader`] reads a table column, a file, or a directory tree into
//!   [`vecprep_core::Document`]s.
//! - [`TextSplitter`] validates chunking parameters and delegates the actual
//!   chunking to a [`ChunkEngine`]: either a procedure in the database
//!   ([`SqlChunkEngine`]) or the in-process [`WindowChunkEngine`].

mod engine;
mod error;
mod loader;
mod params;
mod splitter;
mod sql;
mod window;

use vecprep_core::Document;

pub use engine::{ChunkEngine, SqlChunkEngine};
pub use error::{ErrorKind, IngestionError, IngestionResult, ValidationError};
pub use loader::DocLoader;
pub use params::{ChunkBy, ChunkLimits, LoaderSource, Normalize, SplitBoundary, SplitterParams};
pub use splitter::TextSplitter;
pub use window::WindowChunkEngine;

/// Loads every document from `loader` and splits each one with `splitter`.
pub async fn load_and_split<DB, E>(
    loader: &DocLoader<DB>,
    splitter: &TextSplitter<E>,
) -> Result<Vec<Document>, IngestionError>
where
    DB: sqlx::Database,
    for<'q> DB::Arguments<'q>: sqlx::IntoArguments<'q, DB>,
    for<'c> &'c sqlx::Pool<DB>: sqlx::Executor<'c, Database = DB>,
    for<'r> Option<String>: sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
    E: ChunkEngine,
{
    let documents = loader.load().await?;
    splitter.split_documents(&documents).await
}
