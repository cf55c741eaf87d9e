//! Text preparation for vector search: load documents, split them into
//! chunks, and embed the chunks.
//!
//! Each stage lives in its own crate and is re-exported here behind a
//! feature flag:
//!
//! | feature      | crate                |
//! |--------------|----------------------|
//! | `loaders`    | `vecprep-loaders`    |
//! | `embeddings` | `vecprep-embeddings` |
//! | `openai`     | OpenAI provider      |
//! | `pdf`        | PDF text extraction  |

pub use vecprep_core::{Document, Embedding, EmbeddingError, Metadata, Value};

#[cfg(feature = "loaders")]
pub use vecprep_loaders as loaders;

#[cfg(feature = "embeddings")]
pub use vecprep_embeddings as embeddings;

pub mod prelude {
    pub use vecprep_core::{Document, Embedding, EmbeddingError};

    #[cfg(feature = "loaders")]
    pub use vecprep_loaders::{
        load_and_split, ChunkBy, ChunkEngine, DocLoader, IngestionError, LoaderSource,
        SplitBoundary, SplitterParams, TextSplitter, WindowChunkEngine,
    };

    #[cfg(feature = "openai")]
    pub use vecprep_embeddings::{OpenAiEmbeddings, OpenAiEmbeddingsBuilder};
}
