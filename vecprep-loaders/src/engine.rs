use async_trait::async_trait;
use sqlx::{ColumnIndex, Database, Decode, Encode, Executor, IntoArguments, Pool, Row, Type};

use crate::params::{ChunkLimits, SplitterParams};
use crate::sql::classify;
use crate::IngestionError;

/// Computes chunks for already validated parameters.
///
/// The splitter checks parameters against [`ChunkEngine::limits`] before any
/// call, so implementations only see combinations inside those bounds.
#[async_trait]
pub trait ChunkEngine: Send + Sync {
    fn limits(&self) -> ChunkLimits {
        ChunkLimits::default()
    }

    async fn chunk(&self, text: &str, params: &SplitterParams)
        -> Result<Vec<String>, IngestionError>;
}

#[async_trait]
impl<E> ChunkEngine for std::sync::Arc<E>
where
    E: ChunkEngine + ?Sized,
{
    fn limits(&self) -> ChunkLimits {
        (**self).limits()
    }

    async fn chunk(
        &self,
        text: &str,
        params: &SplitterParams,
    ) -> Result<Vec<String>, IngestionError> {
        (**self).chunk(text, params).await
    }
}

/// Runs a chunking procedure that lives in the database.
///
/// `statement` receives the text as its first bind parameter and the
/// parameters mapping (see [`SplitterParams::to_value`]) as a JSON string in
/// the second, and must return one chunk per row in its first column.
pub struct SqlChunkEngine<DB: Database> {
    pool: Pool<DB>,
    statement: String,
    limits: ChunkLimits,
}

impl<DB: Database> SqlChunkEngine<DB> {
    pub fn new(pool: Pool<DB>, statement: impl Into<String>) -> Self {
        Self {
            pool,
            statement: statement.into(),
            limits: ChunkLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ChunkLimits) -> Self {
        self.limits = limits;
        self
    }
}

#[async_trait]
impl<DB> ChunkEngine for SqlChunkEngine<DB>
where
    DB: Database,
    for<'q> DB::Arguments<'q>: IntoArguments<'q, DB>,
    for<'c> &'c Pool<DB>: Executor<'c, Database = DB>,
    for<'q> String: Encode<'q, DB> + Type<DB>,
    for<'r> Option<String>: Decode<'r, DB> + Type<DB>,
    usize: ColumnIndex<DB::Row>,
{
    fn limits(&self) -> ChunkLimits {
        self.limits
    }

    async fn chunk(
        &self,
        text: &str,
        params: &SplitterParams,
    ) -> Result<Vec<String>, IngestionError> {
        let params_json = params.to_value().to_string();
        tracing::debug!(
            statement = %self.statement,
            params = %params_json,
            "running database chunking statement"
        );

        let query = sqlx::query::<DB>(&self.statement)
            .bind(text.to_string())
            .bind(params_json);
        let rows = self
            .pool
            .fetch_all(query)
            .await
            .map_err(|err| classify(err, &self.statement))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Option<String>, usize>(0)
                    .map(Option::unwrap_or_default)
                    .map_err(|err| classify(err, &self.statement))
            })
            .collect()
    }
}
