use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::{Map, Value};
use vecprep_core::EmbeddingError;

use crate::openai::OpenAiEmbeddings;
use crate::tokenizer::{TiktokenTokenizer, Tokenizer};

pub(crate) const DEFAULT_MODEL: &str = "text-embedding-ada-002";
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CTX_LENGTH: usize = 8191;

/// Names the builder understands. Anything else passed through
/// [`OpenAiEmbeddingsBuilder::param`] lands in `model_kwargs`, and none of
/// these may appear inside `model_kwargs`.
const KNOWN_FIELDS: &[&str] = &[
    "model",
    "dimensions",
    "api_key",
    "openai_api_key",
    "api_base",
    "openai_api_base",
    "base_url",
    "organization",
    "openai_organization",
    "chunk_size",
    "embedding_ctx_length",
    "tiktoken_enabled",
    "tiktoken_model_name",
    "request_timeout",
    "default_headers",
    "model_kwargs",
];

#[derive(Clone)]
pub struct OpenAiEmbeddingsBuilder {
    model: String,
    dimensions: Option<u32>,
    api_key: Option<String>,
    base_url: Option<String>,
    organization: Option<String>,
    chunk_size: usize,
    embedding_ctx_length: usize,
    tiktoken_enabled: bool,
    tiktoken_model_name: Option<String>,
    request_timeout: Option<Duration>,
    default_headers: BTreeMap<String, String>,
    tokenizer: Option<Arc<dyn Tokenizer>>,
    model_kwargs: Map<String, Value>,
    params: Vec<(String, Value)>,
}

impl fmt::Debug for OpenAiEmbeddingsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };

        f.debug_struct("OpenAiEmbeddingsBuilder")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &api_key)
            .field("chunk_size", &self.chunk_size)
            .field("embedding_ctx_length", &self.embedding_ctx_length)
            .field("tiktoken_enabled", &self.tiktoken_enabled)
            .field("model_kwargs", &self.model_kwargs)
            .finish_non_exhaustive()
    }
}

impl Default for OpenAiEmbeddingsBuilder {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            dimensions: None,
            api_key: None,
            base_url: None,
            organization: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            embedding_ctx_length: DEFAULT_CTX_LENGTH,
            tiktoken_enabled: true,
            tiktoken_model_name: None,
            request_timeout: None,
            default_headers: BTreeMap::new(),
            tokenizer: None,
            model_kwargs: Map::new(),
            params: Vec::new(),
        }
    }
}

impl OpenAiEmbeddingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from a mapping such as `{"model": "...", "chunk_size": 16}`.
    /// Every entry goes through [`Self::param`].
    pub fn from_params(params: &Value) -> Result<Self, EmbeddingError> {
        let map = params.as_object().ok_or_else(|| {
            EmbeddingError::InvalidConfig("embedding parameters must be a mapping".to_string())
        })?;
        Ok(map
            .iter()
            .fold(Self::new(), |builder, (key, value)| builder.param(key, value.clone())))
    }

    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.model = value.into();
        self
    }

    pub fn dimensions(mut self, value: u32) -> Self {
        self.dimensions = Some(value);
        self
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.api_key = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };
        self
    }

    pub fn api_key_from_env(mut self, var_name: &str) -> Self {
        if let Ok(value) = std::env::var(var_name) {
            self = self.api_key(value);
        }
        self
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = Some(value.into());
        self
    }

    pub fn organization(mut self, value: impl Into<String>) -> Self {
        self.organization = Some(value.into());
        self
    }

    /// Maximum number of inputs per request.
    pub fn chunk_size(mut self, value: usize) -> Self {
        self.chunk_size = value;
        self
    }

    /// Maximum number of tokens per input piece.
    pub fn embedding_ctx_length(mut self, value: usize) -> Self {
        self.embedding_ctx_length = value;
        self
    }

    /// When disabled, raw strings are sent and no length handling happens.
    pub fn tiktoken_enabled(mut self, value: bool) -> Self {
        self.tiktoken_enabled = value;
        self
    }

    pub fn tiktoken_model_name(mut self, value: impl Into<String>) -> Self {
        self.tiktoken_model_name = Some(value.into());
        self
    }

    /// Overrides the tiktoken encoding picked from the model name.
    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn request_timeout(mut self, value: Duration) -> Self {
        self.request_timeout = Some(value);
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Extra request body fields. Must not repeat a builder field.
    pub fn model_kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.model_kwargs.extend(kwargs);
        self
    }

    /// Sets a parameter by name. Unknown names are forwarded to the API
    /// through `model_kwargs`, with a warning at build time.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn build(mut self) -> Result<OpenAiEmbeddings, EmbeddingError> {
        let params = std::mem::take(&mut self.params);
        let mut extra = Map::new();
        for (name, value) in params {
            if KNOWN_FIELDS.contains(&name.as_str()) {
                self.apply_known(&name, value)?;
                continue;
            }
            if extra.contains_key(&name) || self.model_kwargs.contains_key(&name) {
                return Err(EmbeddingError::InvalidConfig(format!(
                    "Found {name} supplied twice."
                )));
            }
            tracing::warn!(
                "{name} is not default parameter. {name} was transferred to model_kwargs. \
                 Please confirm that {name} is what you intended."
            );
            extra.insert(name, value);
        }

        let reserved: Vec<&str> = self
            .model_kwargs
            .keys()
            .map(String::as_str)
            .filter(|key| KNOWN_FIELDS.contains(key))
            .collect();
        if !reserved.is_empty() {
            return Err(EmbeddingError::InvalidConfig(format!(
                "Parameters {reserved:?} should be specified explicitly. \
                 Instead they were passed in as part of `model_kwargs` parameter."
            )));
        }
        self.model_kwargs.extend(extra);

        if self.chunk_size == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.embedding_ctx_length == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "embedding_ctx_length must be greater than 0".to_string(),
            ));
        }

        let api_key = match self.api_key.take() {
            Some(key) => key,
            None => std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    EmbeddingError::InvalidConfig(
                        "api_key is required; set it on the builder or via OPENAI_API_KEY"
                            .to_string(),
                    )
                })?,
        };
        let base_url = self
            .base_url
            .take()
            .or_else(|| std::env::var("OPENAI_API_BASE").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        reqwest::Url::parse(&base_url)
            .map_err(|err| EmbeddingError::InvalidConfig(format!("invalid base_url: {err}")))?;
        let organization = self
            .organization
            .take()
            .or_else(|| std::env::var("OPENAI_ORGANIZATION").ok());

        let headers = self.headers(&api_key, organization.as_deref())?;
        let mut http = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.request_timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|err| EmbeddingError::InvalidConfig(err.to_string()))?;

        let tokenizer = match (self.tiktoken_enabled, self.tokenizer.take()) {
            (false, _) => None,
            (true, Some(tokenizer)) => Some(tokenizer),
            (true, None) => {
                let name = self.tiktoken_model_name.as_deref().unwrap_or(&self.model);
                Some(Arc::new(TiktokenTokenizer::for_model(name)?) as Arc<dyn Tokenizer>)
            }
        };

        Ok(OpenAiEmbeddings {
            http,
            base_url,
            model: self.model,
            dimensions: self.dimensions,
            chunk_size: self.chunk_size,
            embedding_ctx_length: self.embedding_ctx_length,
            request_timeout: self.request_timeout,
            tokenizer,
            model_kwargs: self.model_kwargs,
        })
    }

    fn headers(
        &self,
        api_key: &str,
        organization: Option<&str>,
    ) -> Result<HeaderMap, EmbeddingError> {
        let invalid = |name: &str| {
            EmbeddingError::InvalidConfig(format!("invalid value for header `{name}`"))
        };

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| invalid("authorization"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        if let Some(organization) = organization {
            headers.insert(
                "openai-organization",
                HeaderValue::from_str(organization).map_err(|_| invalid("openai-organization"))?,
            );
        }
        for (name, value) in &self.default_headers {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid(name))?;
            headers.insert(header, HeaderValue::from_str(value).map_err(|_| invalid(name))?);
        }
        Ok(headers)
    }

    fn apply_known(&mut self, name: &str, value: Value) -> Result<(), EmbeddingError> {
        match name {
            "model" => self.model = expect_string(name, value)?,
            "dimensions" => {
                let dimensions = expect_u64(name, &value)?;
                self.dimensions = Some(u32::try_from(dimensions).map_err(|_| {
                    EmbeddingError::InvalidConfig(format!("`{name}` is out of range"))
                })?);
            }
            "api_key" | "openai_api_key" => {
                let key = expect_string(name, value)?;
                self.api_key = Some(key).filter(|key| !key.trim().is_empty());
            }
            "api_base" | "openai_api_base" | "base_url" => {
                self.base_url = Some(expect_string(name, value)?)
            }
            "organization" | "openai_organization" => {
                self.organization = Some(expect_string(name, value)?)
            }
            "chunk_size" => self.chunk_size = expect_usize(name, &value)?,
            "embedding_ctx_length" => self.embedding_ctx_length = expect_usize(name, &value)?,
            "tiktoken_enabled" => {
                self.tiktoken_enabled = value.as_bool().ok_or_else(|| {
                    EmbeddingError::InvalidConfig(format!("`{name}` must be a boolean"))
                })?
            }
            "tiktoken_model_name" => self.tiktoken_model_name = Some(expect_string(name, value)?),
            "request_timeout" => {
                let seconds = value.as_f64().filter(|secs| *secs >= 0.0).ok_or_else(|| {
                    EmbeddingError::InvalidConfig(format!(
                        "`{name}` must be a non-negative number of seconds"
                    ))
                })?;
                let timeout = Duration::try_from_secs_f64(seconds).map_err(|_| {
                    EmbeddingError::InvalidConfig(format!("`{name}` is out of range"))
                })?;
                self.request_timeout = Some(timeout);
            }
            "default_headers" => {
                for (header, value) in expect_object(name, value)? {
                    let value = expect_string(&header, value)?;
                    self.default_headers.insert(header, value);
                }
            }
            "model_kwargs" => {
                let kwargs = expect_object(name, value)?;
                self.model_kwargs.extend(kwargs);
            }
            _ => {}
        }
        Ok(())
    }
}

fn expect_string(name: &str, value: Value) -> Result<String, EmbeddingError> {
    match value {
        Value::String(value) => Ok(value),
        _ => Err(EmbeddingError::InvalidConfig(format!(
            "`{name}` must be a string"
        ))),
    }
}

fn expect_u64(name: &str, value: &Value) -> Result<u64, EmbeddingError> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
        .ok_or_else(|| {
            EmbeddingError::InvalidConfig(format!("`{name}` must be a positive integer"))
        })
}

fn expect_usize(name: &str, value: &Value) -> Result<usize, EmbeddingError> {
    usize::try_from(expect_u64(name, value)?)
        .map_err(|_| EmbeddingError::InvalidConfig(format!("`{name}` is out of range")))
}

fn expect_object(name: &str, value: Value) -> Result<Map<String, Value>, EmbeddingError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(EmbeddingError::InvalidConfig(format!(
            "`{name}` must be a mapping"
        ))),
    }
}
