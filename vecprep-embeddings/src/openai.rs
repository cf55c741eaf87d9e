use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use vecprep_core::{Embedding, EmbeddingError};

use crate::config::OpenAiEmbeddingsBuilder;
use crate::tokenizer::Tokenizer;
use crate::EmbeddingProviderError;

/// Client for an OpenAI-compatible `/embeddings` endpoint.
///
/// Build it through [`OpenAiEmbeddings::builder`].
#[derive(Clone)]
pub struct OpenAiEmbeddings {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) dimensions: Option<u32>,
    pub(crate) chunk_size: usize,
    pub(crate) embedding_ctx_length: usize,
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) tokenizer: Option<Arc<dyn Tokenizer>>,
    pub(crate) model_kwargs: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// One entry of the `input` array.
enum Input<'a> {
    Text(&'a str),
    Tokens(&'a [u32]),
}

impl Input<'_> {
    fn to_value(&self) -> Value {
        match self {
            Input::Text(text) => Value::from(*text),
            Input::Tokens(tokens) => Value::from(tokens.to_vec()),
        }
    }
}

impl OpenAiEmbeddings {
    pub fn builder() -> OpenAiEmbeddingsBuilder {
        OpenAiEmbeddingsBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn embedding_ctx_length(&self) -> usize {
        self.embedding_ctx_length
    }

    /// Extra fields merged into every request body.
    pub fn model_kwargs(&self) -> &Map<String, Value> {
        &self.model_kwargs
    }

    /// Request body fields shared by every call, without `input`.
    pub fn invocation_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("model".to_string(), Value::from(self.model.as_str()));
        params.insert("encoding_format".to_string(), Value::from("float"));
        if let Some(dimensions) = self.dimensions {
            params.insert("dimensions".to_string(), Value::from(dimensions));
        }
        params.extend(self.model_kwargs.clone());
        params
    }

    /// Like [`Embedding::embed_documents`] with a per-call batch size.
    pub async fn embed_documents_with_chunk_size(
        &self,
        texts: &[String],
        chunk_size: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if chunk_size == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match &self.tokenizer {
            Some(tokenizer) => self.embed_tokenized(tokenizer.as_ref(), texts, chunk_size).await,
            None => {
                let inputs: Vec<Input<'_>> =
                    texts.iter().map(|text| Input::Text(text.as_str())).collect();
                self.embed_batched(&inputs, chunk_size).await
            }
        }
    }

    /// Splits each text into pieces of at most `embedding_ctx_length` tokens,
    /// embeds every piece, and recombines pieces of the same text with a
    /// token-weighted average.
    async fn embed_tokenized(
        &self,
        tokenizer: &dyn Tokenizer,
        texts: &[String],
        chunk_size: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encoded: Vec<Vec<u32>> = texts.iter().map(|text| tokenizer.encode(text)).collect();

        let mut pieces = Vec::new();
        let mut owners = Vec::new();
        for (index, tokens) in encoded.iter().enumerate() {
            for piece in tokens.chunks(self.embedding_ctx_length) {
                pieces.push(Input::Tokens(piece));
                owners.push(index);
            }
        }

        let piece_vectors = self.embed_batched(&pieces, chunk_size).await?;

        let mut grouped: Vec<Vec<(Vec<f32>, usize)>> = vec![Vec::new(); texts.len()];
        for ((owner, vector), piece) in owners.into_iter().zip(piece_vectors).zip(&pieces) {
            let weight = match piece {
                Input::Tokens(tokens) => tokens.len(),
                Input::Text(_) => 1,
            };
            grouped[owner].push((vector, weight));
        }

        let mut empty_vector: Option<Vec<f32>> = None;
        let mut output = Vec::with_capacity(texts.len());
        for parts in grouped {
            let vector = match parts.len() {
                0 => {
                    if empty_vector.is_none() {
                        let mut single = self.embed_batched(&[Input::Text("")], 1).await?;
                        empty_vector = single.pop();
                    }
                    empty_vector.clone().ok_or_else(|| {
                        EmbeddingError::from(EmbeddingProviderError::InvalidResponse(
                            "missing embedding for empty input".to_string(),
                        ))
                    })?
                }
                1 => parts.into_iter().map(|(vector, _)| vector).next().unwrap_or_default(),
                _ => normalize(weighted_average(&parts)),
            };
            output.push(vector);
        }
        Ok(output)
    }

    /// One request per `chunk_size` inputs; results come back in input order.
    async fn embed_batched(
        &self,
        inputs: &[Input<'_>],
        chunk_size: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(inputs.len());
        for (batch_index, batch) in inputs.chunks(chunk_size).enumerate() {
            tracing::debug!(
                model = %self.model,
                batch = batch_index,
                inputs = batch.len(),
                "sending embeddings request"
            );
            vectors.extend(self.request(batch).await?);
        }
        Ok(vectors)
    }

    async fn request(&self, batch: &[Input<'_>]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut body = self.invocation_params();
        body.insert(
            "input".to_string(),
            Value::Array(batch.iter().map(Input::to_value).collect()),
        );

        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(EmbeddingError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = error_message(response.text().await);
            return Err(EmbeddingProviderError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| EmbeddingProviderError::InvalidResponse(err.to_string()))?;
        if parsed.data.len() != batch.len() {
            return Err(EmbeddingProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.data.len()
            ))
            .into());
        }
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }

    fn transport_error(&self, err: reqwest::Error) -> EmbeddingError {
        match (err.is_timeout(), self.request_timeout) {
            (true, Some(timeout)) => EmbeddingError::Timeout(timeout),
            _ => EmbeddingProviderError::Request(err.to_string()).into(),
        }
    }
}

/// `error.message` from an API error body, the raw body when it is not the
/// usual JSON shape, or the read failure itself.
fn error_message<E: std::fmt::Display>(body: Result<String, E>) -> String {
    match body {
        Ok(text) => serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text),
        Err(err) => format!("failed to read error body: {err}"),
    }
}

fn weighted_average(parts: &[(Vec<f32>, usize)]) -> Vec<f32> {
    let width = parts.iter().map(|(vector, _)| vector.len()).max().unwrap_or(0);
    let total: usize = parts.iter().map(|(_, weight)| weight).sum();
    let mut sum = vec![0f32; width];
    for (vector, weight) in parts {
        for (slot, value) in sum.iter_mut().zip(vector) {
            *slot += value * *weight as f32;
        }
    }
    if total > 0 {
        for slot in &mut sum {
            *slot /= total as f32;
        }
    }
    sum
}

fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

#[async_trait]
impl Embedding for OpenAiEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self
            .embed_documents_with_chunk_size(&[text.to_string()], self.chunk_size)
            .await?;
        vectors.pop().ok_or_else(|| {
            EmbeddingProviderError::InvalidResponse("missing embedding".to_string()).into()
        })
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed_documents_with_chunk_size(texts, self.chunk_size)
            .await
    }

    fn dimension(&self) -> Option<usize> {
        self.dimensions.map(|dimensions| dimensions as usize)
    }
}
