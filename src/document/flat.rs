//! The flat record list exchanged with the translation service (`new_to_lingo.json`).
//!
//! ```json
//! [{ "key": "home_title", "zh_CN": "首页", "en_US": "Home", "ja_JP": "" }]
//! ```

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use super::{
    DiffDocument,
    to_pretty_json,
};
use crate::error::DocumentError;

/// One key with a field per service locale code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFlatRecord {
    pub key: String,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl ExternalFlatRecord {
    #[must_use]
    pub fn value(&self, code: &str) -> Option<&str> {
        self.values.get(code).and_then(Value::as_str)
    }
}

/// Service codes every exported record carries.
#[derive(Debug, Clone)]
pub struct ExportLocales<'a> {
    /// Code of the language `diff.json` is written in.
    pub source: &'a str,
    /// Code of the language the translate step produced.
    pub default: &'a str,
    /// Every service code, including the two above.
    pub all: &'a [String],
}

/// One record per diff key, in key order.
///
/// Fields are `key`, the source value, the default-language value (empty when the translated
/// diff lacks the key) and an empty string for every other code.
#[must_use]
pub fn diff_to_records(
    diff: &DiffDocument,
    translated: &DiffDocument,
    locales: &ExportLocales<'_>,
) -> Vec<ExternalFlatRecord> {
    diff.entries()
        .iter()
        .map(|(key, source_value)| {
            let mut values = Map::new();
            values.insert(locales.source.to_string(), source_value.clone());
            if locales.default != locales.source {
                let default_value = translated
                    .entries()
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()));
                values.insert(locales.default.to_string(), default_value);
            }
            for code in locales.all {
                if !values.contains_key(code) {
                    values.insert(code.clone(), Value::String(String::new()));
                }
            }
            ExternalFlatRecord { key: key.clone(), values }
        })
        .collect()
}

/// Pretty JSON array with a trailing newline.
///
/// # Errors
/// Serialization failure.
pub fn records_to_string(records: &[ExternalFlatRecord]) -> Result<String, DocumentError> {
    to_pretty_json(&records)
}

/// # Errors
/// `DocumentError::Json` when the text is not a record array.
pub fn parse_records(text: &str) -> Result<Vec<ExternalFlatRecord>, DocumentError> {
    Ok(serde_json::from_str(text)?)
}
