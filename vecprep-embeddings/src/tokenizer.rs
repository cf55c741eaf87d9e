use tiktoken_rs::CoreBPE;
use vecprep_core::EmbeddingError;

/// Turns text into the token ids the embeddings endpoint accepts as input.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;
}

pub struct TiktokenTokenizer {
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    /// Encoding registered for `model`, or `cl100k_base` when tiktoken does
    /// not know the model.
    pub fn for_model(model: &str) -> Result<Self, EmbeddingError> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(_) => {
                tracing::warn!(model, "model not found in tiktoken; using cl100k_base encoding");
                tiktoken_rs::cl100k_base()
                    .map_err(|err| EmbeddingError::InvalidConfig(err.to_string()))?
            }
        };
        Ok(Self { bpe })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|token| token as u32)
            .collect()
    }
}
