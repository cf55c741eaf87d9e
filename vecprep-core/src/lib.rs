mod document;
mod embedding;
mod error;
mod value;

pub use document::Document;
pub use embedding::Embedding;
pub use error::EmbeddingError;
pub use value::{Metadata, Value};
