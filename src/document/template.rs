//! The feature template document (`<i18n-dir>/<template-json-file>`).
//!
//! Only keys owned by a configured feature ever enter the template, and nothing is removed
//! from it. Edits go through a concrete syntax tree so hand formatting survives.

use std::collections::BTreeSet;

use jsonc_parser::ParseOptions;
use jsonc_parser::cst::{
    CstInputValue,
    CstRootNode,
};
use serde_json::Value;

use super::CanonicalDocument;
use crate::error::DocumentError;
use crate::feature::FeaturePrefixes;
use crate::types::is_metadata_key;

/// Result of extending the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUpdate {
    pub new_text: String,
    /// Keys appended, in the order they were written.
    pub added: Vec<String>,
    /// Source keys no feature owns.
    pub skipped: Vec<String>,
}

impl TemplateUpdate {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty()
    }
}

/// Top-level keys of a template. Blank text is an empty template.
///
/// # Errors
/// `DocumentError::Template` when the text is not a JSON object.
pub fn template_keys(text: &str) -> Result<BTreeSet<String>, DocumentError> {
    match jsonc_parser::parse_to_serde_value(text, &ParseOptions::default())
        .map_err(|error| DocumentError::Template(error.to_string()))?
    {
        None => Ok(BTreeSet::new()),
        Some(Value::Object(map)) => Ok(map.into_iter().map(|(key, _)| key).collect()),
        Some(_) => Err(DocumentError::NotAnObject),
    }
}

/// Appends every source key a feature owns and the template lacks.
///
/// # Errors
/// `DocumentError` when the template does not parse.
pub fn extend_template(
    text: &str,
    source: &CanonicalDocument,
    features: &FeaturePrefixes,
) -> Result<TemplateUpdate, DocumentError> {
    let existing = template_keys(text)?;
    let text = if text.trim().is_empty() { "{}\n" } else { text };

    let root = CstRootNode::parse(text, &ParseOptions::default())
        .map_err(|error| DocumentError::Template(error.to_string()))?;
    let object = root.object_value_or_set();

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    for (key, value) in source.string_entries() {
        if existing.contains(key) {
            continue;
        }
        match features.owner(key) {
            Some(feature) => {
                tracing::debug!(key, feature, "Adding key to template");
                object.append(key, CstInputValue::String(value.to_string()));
                added.push(key.to_string());
            }
            None => skipped.push(key.to_string()),
        }
    }

    Ok(TemplateUpdate { new_text: root.to_string(), added, skipped })
}

/// Template keys the source document no longer has. They are reported, never removed.
///
/// # Errors
/// `DocumentError` when the template does not parse.
pub fn stale_template_keys(
    text: &str,
    source: &CanonicalDocument,
) -> Result<Vec<String>, DocumentError> {
    Ok(template_keys(text)?
        .into_iter()
        .filter(|key| !is_metadata_key(key) && !source.contains_key(key))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used)]
mod tests {
    use std::collections::BTreeMap;

    use googletest::prelude::*;
    use rstest::*;
    use serde_json::json;

    use super::*;

    fn features() -> FeaturePrefixes {
        FeaturePrefixes::new(&BTreeMap::from([("app_strings".to_string(), "app_strings".to_string())]))
            .unwrap()
    }

    fn source() -> CanonicalDocument {
        CanonicalDocument::from_json_str(
            "zh_Hans_CN",
            &json!({
                "@@locale": "zh_Hans_CN",
                "appstrings_home_title": "首页",
                "appstrings_old": "旧",
                "settings_home_title": "设置",
                "@appstrings_home_title": {"description": "title"}
            })
            .to_string(),
        )
        .unwrap()
    }

    #[googletest::test]
    fn extend_template_adds_only_owned_keys() {
        let template = "{\n  \"appstrings_old\": \"旧\"\n}\n";

        let update = extend_template(template, &source(), &features()).expect("template parses");

        expect_that!(update.added, elements_are![eq("appstrings_home_title")]);
        expect_that!(update.skipped, elements_are![eq("settings_home_title")]);
        expect_that!(update.new_text, contains_substring("\"appstrings_home_title\": \"首页\""));
        expect_that!(update.new_text, not(contains_substring("settings_home_title")));
        expect_that!(update.new_text, not(contains_substring("@appstrings_home_title")));
    }

    #[googletest::test]
    fn extend_template_is_additive() {
        let template = "{\n  \"appstrings_removed_upstream\": \"x\",\n  \"appstrings_old\": \"edited\"\n}\n";

        let update = extend_template(template, &source(), &features()).expect("template parses");

        expect_that!(update.new_text, contains_substring("\"appstrings_removed_upstream\": \"x\""));
        expect_that!(update.new_text, contains_substring("\"appstrings_old\": \"edited\""));
        expect_that!(template_keys(&update.new_text).unwrap(), len(eq(3)));
    }

    #[googletest::test]
    fn extend_template_preserves_formatting() {
        let template = "{\n    // curated keys\n    \"appstrings_old\": \"旧\"\n}\n";

        let update = extend_template(template, &source(), &features()).expect("template parses");

        expect_that!(update.new_text, contains_substring("    // curated keys"));
        expect_that!(update.new_text, contains_substring("    \"appstrings_old\""));
    }

    #[googletest::test]
    fn extend_template_from_empty_text() {
        let update = extend_template("", &source(), &features()).expect("template parses");

        expect_that!(update.added, len(eq(2)));
        expect_that!(template_keys(&update.new_text).unwrap(), len(eq(2)));
    }

    #[rstest]
    fn extend_template_unchanged_when_complete() {
        let template = "{\"appstrings_home_title\": \"首页\", \"appstrings_old\": \"旧\"}";

        let update = extend_template(template, &source(), &features()).unwrap();

        assert!(update.is_unchanged());
        assert_that!(update.new_text, eq(template));
    }

    #[rstest]
    fn extend_template_rejects_non_object() {
        assert!(matches!(
            extend_template("[1, 2]", &source(), &features()),
            Err(DocumentError::NotAnObject)
        ));
        assert!(matches!(
            extend_template("{ \"a\": ", &source(), &features()),
            Err(DocumentError::Template(_))
        ));
    }

    #[rstest]
    fn stale_template_keys_lists_missing_source_keys() {
        let template = "{\"appstrings_old\": \"x\", \"appstrings_gone\": \"y\"}";

        let stale = stale_template_keys(template, &source()).unwrap();

        assert_that!(stale, elements_are![eq("appstrings_gone")]);
    }
}
