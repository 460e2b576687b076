//! Feature ownership of translation keys.
//!
//! Every feature in `feature-strings` owns the keys starting with its normalized prefix:
//! underscores are dropped from the raw token and a single `_` is appended, so the token
//! `app_strings` owns `appstrings_home_title`.

use std::collections::BTreeMap;

use crate::config::ValidationError;

/// Separator removed from raw tokens and appended as the prefix terminator.
const SEPARATOR: char = '_';

/// Converts a raw prefix token into the prefix keys actually carry.
///
/// # Examples
/// ```
/// use lingo_sync::feature::normalize_prefix;
///
/// assert_eq!(normalize_prefix("app_strings"), "appstrings_");
/// assert_eq!(normalize_prefix("home"), "home_");
/// ```
#[must_use]
pub fn normalize_prefix(raw: &str) -> String {
    let mut prefix: String = raw.chars().filter(|c| *c != SEPARATOR).collect();
    prefix.push(SEPARATOR);
    prefix
}

/// A feature and the key prefix it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePrefix {
    pub feature: String,
    pub prefix: String,
}

/// Validated feature prefix table.
///
/// No prefix is a prefix of another one, so at most one feature owns any key.
#[derive(Debug, Clone, Default)]
pub struct FeaturePrefixes {
    prefixes: Vec<FeaturePrefix>,
}

impl FeaturePrefixes {
    /// Builds the table from `feature-strings`.
    ///
    /// # Errors
    /// Every empty token and every pair of overlapping prefixes, keyed by
    /// `feature-strings.<feature>`.
    pub fn new(table: &BTreeMap<String, String>) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut prefixes: Vec<FeaturePrefix> = Vec::with_capacity(table.len());

        for (feature, raw) in table {
            if raw.chars().all(|c| c == SEPARATOR) {
                errors.push(ValidationError::new(
                    format!("feature-strings.{feature}"),
                    format!("The prefix token '{raw}' is empty once '{SEPARATOR}' is removed"),
                ));
                continue;
            }

            let prefix = normalize_prefix(raw);
            for other in &prefixes {
                if prefix.starts_with(&other.prefix) || other.prefix.starts_with(&prefix) {
                    errors.push(ValidationError::new(
                        format!("feature-strings.{feature}"),
                        format!(
                            "Prefix '{prefix}' overlaps prefix '{}' of feature '{}'",
                            other.prefix, other.feature
                        ),
                    ));
                }
            }
            prefixes.push(FeaturePrefix { feature: feature.clone(), prefix });
        }

        if errors.is_empty() { Ok(Self { prefixes }) } else { Err(errors) }
    }

    /// Returns the feature owning `key`, if any.
    #[must_use]
    pub fn owner(&self, key: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|entry| key.starts_with(&entry.prefix))
            .map(|entry| entry.feature.as_str())
    }

    #[must_use]
    pub fn owns(&self, key: &str) -> bool {
        self.owner(key).is_some()
    }
}
