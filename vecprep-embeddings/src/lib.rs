//! Embedding providers for vecprep.
//!
//! [`OpenAiEmbeddings`] talks to any OpenAI-compatible `/embeddings`
//! endpoint. Inputs are sent in sub-batches of at most `chunk_size`
//! entries; with tokenization enabled each text is first cut into pieces of
//! at most `embedding_ctx_length` tokens.
//!
//! Environment variables read when the builder leaves a value unset:
//! - `OPENAI_API_KEY`
//! - `OPENAI_API_BASE` (optional)
//! - `OPENAI_ORGANIZATION` (optional)

mod error;

#[cfg(feature = "openai")]
mod config;
#[cfg(feature = "openai")]
mod openai;
#[cfg(feature = "openai")]
mod tokenizer;

pub use error::EmbeddingProviderError;

#[cfg(feature = "openai")]
pub use config::OpenAiEmbeddingsBuilder;
#[cfg(feature = "openai")]
pub use openai::OpenAiEmbeddings;
#[cfg(feature = "openai")]
pub use tokenizer::{TiktokenTokenizer, Tokenizer};
