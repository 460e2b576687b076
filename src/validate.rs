//! Structural validation across the canonical documents.
//!
//! Every problem is collected before anything fails, so one run shows the complete list.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::document::CanonicalDocument;
use crate::types::{
    LOCALE_KEY,
    is_metadata_key,
};

/// A `{token}` placeholder; group 1 is the token.
#[allow(clippy::expect_used)]
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("placeholder regex is valid"));

/// A `{token}` is valid when it is entirely alphanumeric or starts with `_`.
///
/// # Examples
/// ```
/// use lingo_sync::validate::is_valid_placeholder;
///
/// assert!(is_valid_placeholder("name"));
/// assert!(is_valid_placeholder("_count-2"));
/// assert!(!is_valid_placeholder("na-me"));
/// ```
#[must_use]
pub fn is_valid_placeholder(token: &str) -> bool {
    token.starts_with('_') || (!token.is_empty() && token.chars().all(char::is_alphanumeric))
}

/// Placeholder tokens in `value` that are not valid.
#[must_use]
pub fn invalid_placeholders(value: &str) -> Vec<&str> {
    PLACEHOLDER_REGEX
        .captures_iter(value)
        .filter_map(|captures| captures.get(1))
        .map(|token| token.as_str())
        .filter(|token| !is_valid_placeholder(token))
        .collect()
}

/// One problem found in the canonical documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A declared locale has no document.
    MissingDocument { locale: String, file: PathBuf },
    MissingLocale { file: PathBuf },
    LocaleMismatch { file: PathBuf, expected: String, found: String },
    /// Keys other documents have and this one lacks.
    MissingKeys { file: PathBuf, keys: Vec<String> },
    NonStringValue { file: PathBuf, key: String },
    InvalidPlaceholder { file: PathBuf, key: String, placeholder: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDocument { locale, file } => {
                write!(f, "{}: no document for declared locale '{locale}'", file.display())
            }
            Self::MissingLocale { file } => write!(f, "{}: missing '{LOCALE_KEY}'", file.display()),
            Self::LocaleMismatch { file, expected, found } => write!(
                f,
                "{}: '{LOCALE_KEY}' is '{found}' but the file name says '{expected}'",
                file.display()
            ),
            Self::MissingKeys { file, keys } => {
                write!(f, "{}: missing {} key(s): {}", file.display(), keys.len(), keys.join(", "))
            }
            Self::NonStringValue { file, key } => {
                write!(f, "{}: value of '{key}' is not a string", file.display())
            }
            Self::InvalidPlaceholder { file, key, placeholder } => write!(
                f,
                "{}: '{key}' has invalid placeholder '{{{placeholder}}}'",
                file.display()
            ),
        }
    }
}

/// Every issue found in one validation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Translation validation failed with {} issue(s):", self.issues.len())?;
        for (i, issue) in self.issues.iter().enumerate() {
            write!(f, "\n  {}. {issue}", i + 1)?;
        }
        Ok(())
    }
}

/// A document together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: CanonicalDocument,
}

/// Checks locale fields, key parity, value types and placeholders.
///
/// `missing` lists declared locales without a document (with the path that was expected).
///
/// # Errors
/// A `ValidationReport` with every issue found.
pub fn validate_documents(
    documents: &[LoadedDocument],
    missing: &[(String, PathBuf)],
) -> Result<(), ValidationReport> {
    let mut issues: Vec<ValidationIssue> = missing
        .iter()
        .map(|(locale, file)| ValidationIssue::MissingDocument { locale: locale.clone(), file: file.clone() })
        .collect();

    let all_keys: BTreeSet<&str> =
        documents.iter().flat_map(|loaded| loaded.document.translation_keys()).collect();

    for LoadedDocument { path, document } in documents {
        match document.locale() {
            None => issues.push(ValidationIssue::MissingLocale { file: path.clone() }),
            Some(found) if found != document.identity() => issues.push(ValidationIssue::LocaleMismatch {
                file: path.clone(),
                expected: document.identity().to_string(),
                found: found.to_string(),
            }),
            Some(_) => {}
        }

        let own_keys = document.key_set();
        let missing_keys: Vec<String> =
            all_keys.difference(&own_keys).map(|key| (*key).to_string()).collect();
        if !missing_keys.is_empty() {
            issues.push(ValidationIssue::MissingKeys { file: path.clone(), keys: missing_keys });
        }

        for (key, value) in document.entries() {
            if is_metadata_key(key) {
                continue;
            }
            let Value::String(text) = value else {
                issues.push(ValidationIssue::NonStringValue { file: path.clone(), key: key.clone() });
                continue;
            };
            for placeholder in invalid_placeholders(text) {
                issues.push(ValidationIssue::InvalidPlaceholder {
                    file: path.clone(),
                    key: key.clone(),
                    placeholder: placeholder.to_string(),
                });
            }
        }

        tracing::debug!(file = %path.display(), keys = own_keys.len(), "Checked document");
    }

    if issues.is_empty() { Ok(()) } else { Err(ValidationReport { issues }) }
}
