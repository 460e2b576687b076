//! Translation records as the service returns them.

use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceTranslation {
    /// Service locale code (`zh_CN`, `en_US`, ...).
    pub code: String,
    pub value: String,
}

/// One key with its translations in every service locale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceRecord {
    pub key: String,
    #[serde(default)]
    pub languages: Vec<ServiceTranslation>,
}

/// Either a bare record list or the service's `{ "data": [...] }` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsPayload {
    List(Vec<ServiceRecord>),
    Envelope { data: Vec<ServiceRecord> },
}

/// Parses a records file.
///
/// # Errors
/// The JSON error when the text is neither shape.
pub fn parse_records(text: &str) -> Result<Vec<ServiceRecord>, serde_json::Error> {
    Ok(match serde_json::from_str(text)? {
        RecordsPayload::List(records) | RecordsPayload::Envelope { data: records } => records,
    })
}

/// Regroups records into service locale -> key -> value.
///
/// A key listed twice keeps its last value.
#[must_use]
pub fn group_by_locale(records: &[ServiceRecord]) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut grouped: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for record in records {
        for translation in &record.languages {
            grouped
                .entry(translation.code.clone())
                .or_default()
                .insert(record.key.clone(), translation.value.clone());
        }
    }
    grouped
}
