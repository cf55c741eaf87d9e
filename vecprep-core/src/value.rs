use std::collections::HashMap;

pub type Value = serde_json::Value;

/// Free-form key/value pairs attached to a [`crate::Document`].
pub type Metadata = HashMap<String, Value>;
