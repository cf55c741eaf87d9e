//! Typed loader and splitter parameters.
//!
//! Both types can be built directly or parsed from mapping-shaped JSON such as
//! `{"owner": "hr", "tablename": "DOCS", "colname": "TEXT"}` or
//! `{"by": "words", "max": "1000", "overlap": "200", "split": "custom", "custom_list": [","]}`.
//! Numeric and boolean values are accepted either as JSON scalars or as strings.

use std::fmt;
use std::path::PathBuf;

use serde_json::{json, Map};
use vecprep_core::Value;

use crate::sql::validate_identifier;
use crate::{IngestionError, ValidationError};

const TABLE_KEYS: [&str; 3] = ["owner", "tablename", "colname"];

/// Where a [`crate::DocLoader`] reads from. Exactly one source per loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoaderSource {
    Table {
        owner: String,
        table: String,
        column: String,
    },
    File(PathBuf),
    Dir(PathBuf),
}

impl LoaderSource {
    pub fn table(
        owner: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        LoaderSource::Table {
            owner: owner.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        LoaderSource::File(path.into())
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        LoaderSource::Dir(path.into())
    }

    pub fn from_value(value: &Value) -> Result<Self, IngestionError> {
        let map = as_object(value, "loader")?;

        for key in map.keys() {
            if !TABLE_KEYS.contains(&key.as_str()) && key != "file" && key != "dir" {
                return Err(IngestionError::Configuration(format!(
                    "unknown loader parameter `{key}`"
                )));
            }
        }

        let has_table = TABLE_KEYS.iter().any(|key| map.contains_key(*key));
        let selected = [has_table, map.contains_key("file"), map.contains_key("dir")]
            .into_iter()
            .filter(|present| *present)
            .count();
        if selected != 1 {
            return Err(IngestionError::Configuration(
                "exactly one of {owner, tablename, colname}, file or dir must be given"
                    .to_string(),
            ));
        }

        let source = if has_table {
            LoaderSource::Table {
                owner: required_str(map, "owner")?,
                table: required_str(map, "tablename")?,
                column: required_str(map, "colname")?,
            }
        } else if map.contains_key("file") {
            LoaderSource::File(PathBuf::from(required_str(map, "file")?))
        } else {
            LoaderSource::Dir(PathBuf::from(required_str(map, "dir")?))
        };

        source.validate()?;
        Ok(source)
    }

    pub(crate) fn validate(&self) -> Result<(), IngestionError> {
        match self {
            LoaderSource::Table {
                owner,
                table,
                column,
            } => {
                validate_identifier("owner", owner)?;
                validate_identifier("tablename", table)?;
                validate_identifier("colname", column)
            }
            LoaderSource::File(path) | LoaderSource::Dir(path) => {
                if path.as_os_str().is_empty() {
                    return Err(IngestionError::Configuration(
                        "source path cannot be empty".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Unit in which `max` and `overlap` are counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChunkBy {
    #[default]
    Words,
    Chars,
}

impl ChunkBy {
    fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.to_ascii_lowercase().as_str() {
            "words" | "word" => Ok(ChunkBy::Words),
            "chars" | "characters" => Ok(ChunkBy::Chars),
            _ => Err(ValidationError::InvalidBy(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkBy::Words => "words",
            ChunkBy::Chars => "chars",
        }
    }
}

/// Preferred place to end a chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SplitBoundary {
    None,
    Newline,
    Blankline,
    Space,
    Sentence,
    #[default]
    Recursively,
    Custom(Vec<String>),
}

impl SplitBoundary {
    pub fn name(&self) -> &'static str {
        match self {
            SplitBoundary::None => "NONE",
            SplitBoundary::Newline => "NEWLINE",
            SplitBoundary::Blankline => "BLANKLINE",
            SplitBoundary::Space => "SPACE",
            SplitBoundary::Sentence => "SENTENCE",
            SplitBoundary::Recursively => "RECURSIVELY",
            SplitBoundary::Custom(_) => "CUSTOM",
        }
    }
}

impl fmt::Display for SplitBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Normalize {
    #[default]
    None,
    All,
    Punctuation,
    Whitespace,
    Widechar,
}

impl Normalize {
    fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.to_ascii_lowercase().as_str() {
            "none" => Ok(Normalize::None),
            "all" => Ok(Normalize::All),
            "punctuation" => Ok(Normalize::Punctuation),
            "whitespace" => Ok(Normalize::Whitespace),
            "widechar" => Ok(Normalize::Widechar),
            _ => Err(ValidationError::InvalidNormalize(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Normalize::None => "none",
            Normalize::All => "all",
            Normalize::Punctuation => "punctuation",
            Normalize::Whitespace => "whitespace",
            Normalize::Widechar => "widechar",
        }
    }
}

/// Per-backend bounds on `max`, counted in the unit selected by [`ChunkBy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLimits {
    pub min_words: u32,
    pub max_words: u32,
    pub min_chars: u32,
    pub max_chars: u32,
    /// Upper bound on `max` when `extended` is set, in either unit.
    pub max_extended: u32,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self {
            min_words: 10,
            max_words: 1000,
            min_chars: 50,
            max_chars: 4000,
            max_extended: 32767,
        }
    }
}

impl ChunkLimits {
    pub fn range(&self, by: ChunkBy, extended: bool) -> (u32, u32) {
        let (min, max) = match by {
            ChunkBy::Words => (self.min_words, self.max_words),
            ChunkBy::Chars => (self.min_chars, self.max_chars),
        };
        if extended {
            (min, max.max(self.max_extended))
        } else {
            (min, max)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitterParams {
    pub by: ChunkBy,
    pub max: u32,
    pub overlap: u32,
    pub split: SplitBoundary,
    pub extended: bool,
    pub normalize: Normalize,
}

impl Default for SplitterParams {
    fn default() -> Self {
        Self {
            by: ChunkBy::Words,
            max: 100,
            overlap: 0,
            split: SplitBoundary::Recursively,
            extended: false,
            normalize: Normalize::None,
        }
    }
}

impl SplitterParams {
    pub fn new(by: ChunkBy, max: u32) -> Self {
        Self {
            by,
            max,
            ..Self::default()
        }
    }

    pub fn with_overlap(mut self, overlap: u32) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_split(mut self, split: SplitBoundary) -> Self {
        self.split = split;
        self
    }

    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    pub fn with_normalize(mut self, normalize: Normalize) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn from_value(value: &Value) -> Result<Self, IngestionError> {
        let map = as_object(value, "splitter")?;
        let mut params = SplitterParams::default();
        let mut split_name: Option<String> = None;
        let mut custom_list: Option<Vec<String>> = None;

        for (key, value) in map {
            match key.as_str() {
                "by" => params.by = ChunkBy::parse(&scalar_str(key, value)?)?,
                "max" => {
                    let raw = scalar_str(key, value)?;
                    params.max = raw
                        .trim()
                        .parse()
                        .map_err(|_| ValidationError::InvalidMaximum(raw.clone()))?;
                }
                "overlap" => {
                    let raw = scalar_str(key, value)?;
                    params.overlap = raw
                        .trim()
                        .parse()
                        .map_err(|_| ValidationError::InvalidOverlap(raw.clone()))?;
                }
                "split" => split_name = Some(scalar_str(key, value)?),
                "custom_list" => custom_list = Some(string_list(key, value)?),
                "extended" => params.extended = parse_bool(key, value)?,
                "normalize" => params.normalize = Normalize::parse(&scalar_str(key, value)?)?,
                other => {
                    return Err(IngestionError::Configuration(format!(
                        "unknown splitter parameter `{other}`"
                    )))
                }
            }
        }

        if let Some(name) = split_name {
            params.split = match name.to_ascii_lowercase().as_str() {
                "none" => SplitBoundary::None,
                "newline" => SplitBoundary::Newline,
                "blankline" => SplitBoundary::Blankline,
                "space" => SplitBoundary::Space,
                "sentence" => SplitBoundary::Sentence,
                "recursively" => SplitBoundary::Recursively,
                "custom" => SplitBoundary::Custom(custom_list.take().ok_or_else(|| {
                    IngestionError::Configuration(
                        "custom_list is required when split is custom".to_string(),
                    )
                })?),
                _ => return Err(ValidationError::InvalidSplit(name).into()),
            };
        }

        if custom_list.is_some() {
            return Err(IngestionError::Configuration(
                "custom_list is only allowed when split is custom".to_string(),
            ));
        }

        Ok(params)
    }

    /// Mapping form handed to engines that live outside the process.
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "by": self.by.as_str(),
            "max": self.max.to_string(),
            "overlap": self.overlap.to_string(),
            "split": self.split.name().to_ascii_lowercase(),
            "extended": self.extended,
            "normalize": self.normalize.as_str(),
        });
        if let (SplitBoundary::Custom(list), Some(map)) = (&self.split, value.as_object_mut()) {
            map.insert("custom_list".to_string(), json!(list));
        }
        value
    }

    pub fn validate(&self, limits: &ChunkLimits) -> Result<(), IngestionError> {
        let (min, max) = limits.range(self.by, self.extended);
        if self.max < min || self.max > max {
            return Err(ValidationError::InvalidMaximum(self.max.to_string()).into());
        }
        if self.overlap >= self.max {
            return Err(ValidationError::InvalidOverlap(self.overlap.to_string()).into());
        }
        if self.split == SplitBoundary::Sentence && self.by != ChunkBy::Chars {
            return Err(ValidationError::InvalidSplitBy(self.split.to_string()).into());
        }
        if let SplitBoundary::Custom(list) = &self.split {
            if list.is_empty() || list.iter().any(String::is_empty) {
                return Err(IngestionError::Configuration(
                    "custom_list must hold at least one non-empty delimiter".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, IngestionError> {
    value.as_object().ok_or_else(|| {
        IngestionError::Configuration(format!("{what} parameters must be a mapping"))
    })
}

fn required_str(map: &Map<String, Value>, key: &str) -> Result<String, IngestionError> {
    match map.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(IngestionError::Configuration(format!(
            "`{key}` must be a string"
        ))),
        None => Err(IngestionError::Configuration(format!(
            "missing `{key}` for table source"
        ))),
    }
}

fn scalar_str(key: &str, value: &Value) -> Result<String, IngestionError> {
    match value {
        Value::String(value) => Ok(value.clone()),
        Value::Number(value) => Ok(value.to_string()),
        Value::Bool(value) => Ok(value.to_string()),
        _ => Err(IngestionError::Configuration(format!(
            "`{key}` must be a scalar value"
        ))),
    }
}

fn parse_bool(key: &str, value: &Value) -> Result<bool, IngestionError> {
    match scalar_str(key, value)?.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(IngestionError::Configuration(format!(
            "`{key}` must be a boolean, got `{other}`"
        ))),
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>, IngestionError> {
    let items = value.as_array().ok_or_else(|| {
        IngestionError::Configuration(format!("`{key}` must be a list of strings"))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                IngestionError::Configuration(format!("`{key}` must be a list of strings"))
            })
        })
        .collect()
}
