use std::sync::Arc;

use async_trait::async_trait;

use vecprep_core::{Embedding, EmbeddingError};

struct TestEmbedding;

#[async_trait]
impl Embedding for TestEmbedding {
    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![0.0])
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(vec![vec![0.0]; texts.len()])
    }
}

fn assert_object_safe(_embedding: Arc<dyn Embedding>) {}

#[test]
fn embedding_trait_is_object_safe() {
    let embedding = Arc::new(TestEmbedding);
    assert_eq!(embedding.dimension(), None);
    assert_object_safe(embedding);
}

#[tokio::test]
async fn embedding_trait_returns_one_vector_per_text() {
    let embedding: Arc<dyn Embedding> = Arc::new(TestEmbedding);
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let vectors = embedding.embed_documents(&texts).await.unwrap();
    assert_eq!(vectors.len(), 3);
}
