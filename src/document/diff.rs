//! Key-set difference between freshly generated fragments and the source-locale baseline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{
    Map,
    Value,
};

use super::{
    CanonicalDocument,
    parse_object,
    to_pretty_json,
};
use crate::error::DocumentError;
use crate::types::is_metadata_key;

/// One generated `.arb` fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub path: PathBuf,
    pub entries: Map<String, Value>,
}

impl Fragment {
    /// # Errors
    /// Invalid JSON or a non-object document.
    pub fn from_json_str(path: impl Into<PathBuf>, text: &str) -> Result<Self, DocumentError> {
        Ok(Self { path: path.into(), entries: parse_object(text)? })
    }
}

/// Combines fragments in file-name order; a later fragment overwrites an earlier one's key.
///
/// `@` annotations are dropped.
#[must_use]
pub fn merge_fragments(fragments: &[Fragment]) -> BTreeMap<String, Value> {
    let mut ordered: Vec<&Fragment> = fragments.iter().collect();
    ordered.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    let mut merged = BTreeMap::new();
    for fragment in ordered {
        for (key, value) in &fragment.entries {
            if is_metadata_key(key) {
                continue;
            }
            if let Some(previous) = merged.insert(key.clone(), value.clone())
                && previous != *value
            {
                tracing::debug!(key = %key, fragment = %fragment.path.display(), "Fragment overrides an earlier value");
            }
        }
    }
    merged
}

/// Keys present in the merged fragments but not in the source-locale baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffDocument {
    entries: BTreeMap<String, Value>,
}

/// `keys(merged) - keys(baseline)`, with values taken from `merged`.
///
/// Keys present in both are never reported, whatever their values.
#[must_use]
pub fn compute_diff(merged: &BTreeMap<String, Value>, baseline: &CanonicalDocument) -> DiffDocument {
    let entries = merged
        .iter()
        .filter(|(key, _)| !is_metadata_key(key) && !baseline.contains_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    DiffDocument { entries }
}

impl DiffDocument {
    /// # Errors
    /// Invalid JSON or a non-object document.
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        let entries = parse_object(text)?
            .into_iter()
            .filter(|(key, _)| !is_metadata_key(key))
            .collect();
        Ok(Self { entries })
    }

    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Adds every entry to `document`, as a translator accepting the diff would.
    pub fn merge_into(&self, document: &mut CanonicalDocument) {
        for (key, value) in &self.entries {
            document.insert(key.clone(), value.clone());
        }
    }

    /// Flat JSON object in key order.
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_pretty_string(&self) -> Result<String, DocumentError> {
        to_pretty_json(&self.entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    use super::*;

    fn fragment(name: &str, value: &Value) -> Fragment {
        Fragment::from_json_str(format!("build/localizations/arb/{name}"), &value.to_string()).unwrap()
    }

    fn baseline(value: &Value) -> CanonicalDocument {
        CanonicalDocument::from_json_str("zh_Hans_CN", &value.to_string()).unwrap()
    }

    #[rstest]
    fn merge_fragments_last_file_name_wins() {
        // given out of order on purpose
        let fragments = vec![
            fragment("b_settings.arb", &json!({"shared": "from b", "b": "B"})),
            fragment("a_home.arb", &json!({"shared": "from a", "a": "A", "@a": {"description": "x"}})),
        ];

        let merged = merge_fragments(&fragments);

        assert_eq!(
            Value::Object(merged.into_iter().collect()),
            json!({"a": "A", "b": "B", "shared": "from b"})
        );
    }

    #[rstest]
    fn compute_diff_is_key_set_difference() {
        let merged = merge_fragments(&[fragment(
            "app.arb",
            &json!({"kept": "changed text", "new_b": "B", "new_a": "A"}),
        )]);
        let baseline = baseline(&json!({"@@locale": "zh_Hans_CN", "kept": "old text", "gone": "x"}));

        let diff = compute_diff(&merged, &baseline);

        assert_that!(diff.keys().collect::<Vec<_>>(), elements_are![eq(&"new_a"), eq(&"new_b")]);
        assert_that!(diff.to_pretty_string().unwrap(), eq("{\n  \"new_a\": \"A\",\n  \"new_b\": \"B\"\n}\n"));
    }

    #[rstest]
    fn compute_diff_is_idempotent_after_merge() {
        let merged = merge_fragments(&[fragment("app.arb", &json!({"x": "1", "y": "2"}))]);
        let mut baseline = baseline(&json!({"@@locale": "zh_Hans_CN", "x": "1"}));

        let first = compute_diff(&merged, &baseline);
        first.merge_into(&mut baseline);
        let second = compute_diff(&merged, &baseline);

        assert_that!(first.len(), eq(1));
        assert_that!(second.is_empty(), eq(true));
        assert_eq!(compute_diff(&merged, &baseline), second);
    }

    #[rstest]
    fn compute_diff_ignores_baseline_annotations() {
        let merged = merge_fragments(&[fragment("app.arb", &json!({"title": "T"}))]);
        let baseline = baseline(&json!({"@@locale": "zh_Hans_CN", "@title": {}}));

        let diff = compute_diff(&merged, &baseline);

        assert_that!(diff.keys().collect::<Vec<_>>(), elements_are![eq(&"title")]);
    }

    #[rstest]
    fn diff_document_from_json_str() {
        let diff = DiffDocument::from_json_str(r#"{"b": "2", "a": "1", "@@locale": "x"}"#).unwrap();

        assert_that!(diff.keys().collect::<Vec<_>>(), elements_are![eq(&"a"), eq(&"b")]);
        assert!(matches!(DiffDocument::from_json_str("[]"), Err(DocumentError::NotAnObject)));
    }
}
