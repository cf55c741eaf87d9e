use vecprep_core::{Document, Value};

use crate::engine::ChunkEngine;
use crate::params::SplitterParams;
use crate::IngestionError;

/// Validates splitter parameters once, then forwards text to a [`ChunkEngine`].
pub struct TextSplitter<E> {
    engine: E,
    params: SplitterParams,
}

impl<E: ChunkEngine> TextSplitter<E> {
    pub fn new(engine: E, params: SplitterParams) -> Result<Self, IngestionError> {
        params.validate(&engine.limits())?;
        Ok(Self { engine, params })
    }

    pub fn from_params(engine: E, params: &Value) -> Result<Self, IngestionError> {
        Self::new(engine, SplitterParams::from_value(params)?)
    }

    pub fn params(&self) -> &SplitterParams {
        &self.params
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Chunks come back exactly as the engine produced them.
    pub async fn split_text(&self, text: &str) -> Result<Vec<String>, IngestionError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let chunks = self.engine.chunk(text, &self.params).await?;
        tracing::debug!(
            by = self.params.by.as_str(),
            max = self.params.max,
            chunks = chunks.len(),
            "split text"
        );
        Ok(chunks)
    }

    /// Each chunk inherits its parent's metadata plus `parent_id` and `chunk_index`.
    pub async fn split_documents(
        &self,
        documents: &[Document],
    ) -> Result<Vec<Document>, IngestionError> {
        let mut output = Vec::new();
        for document in documents {
            for (index, chunk) in self.split_text(&document.content).await?.into_iter().enumerate() {
                let mut metadata = document.metadata.clone();
                metadata.insert("parent_id".to_string(), Value::from(document.id.as_str()));
                metadata.insert("chunk_index".to_string(), Value::from(index));
                output.push(Document {
                    id: format!("{}#chunk{index}", document.id),
                    content: chunk,
                    metadata,
                });
            }
        }
        Ok(output)
    }
}
