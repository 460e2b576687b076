//! Per-locale canonical translation documents (`intl_<locale>.arb`).

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::path::{
    Path,
    PathBuf,
};

use serde_json::{
    Map,
    Value,
};

use super::{
    parse_object,
    read_file,
    to_pretty_json,
    write_file,
};
use crate::error::{
    DocumentError,
    SyncError,
};
use crate::types::{
    LOCALE_KEY,
    is_metadata_key,
};

const FILE_PREFIX: &str = "intl_";
const FILE_EXTENSION: &str = "arb";

/// One locale's translations.
///
/// `identity` is the locale the file name claims; `locale` is what its `@@locale` field says,
/// if it has one. Every other field lives in `entries`, which keeps them sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDocument {
    identity: String,
    locale: Option<String>,
    entries: BTreeMap<String, Value>,
}

impl CanonicalDocument {
    /// An empty document whose `@@locale` matches its identity.
    #[must_use]
    pub fn new(locale: impl Into<String>) -> Self {
        let locale = locale.into();
        Self { identity: locale.clone(), locale: Some(locale), entries: BTreeMap::new() }
    }

    /// # Errors
    /// Invalid JSON, a non-object document, or a non-string `@@locale`.
    pub fn from_json_str(identity: impl Into<String>, text: &str) -> Result<Self, DocumentError> {
        let mut object = parse_object(text)?;
        let locale = match object.remove(LOCALE_KEY) {
            None => None,
            Some(Value::String(locale)) => Some(locale),
            Some(_) => return Err(DocumentError::InvalidLocaleField),
        };

        Ok(Self { identity: identity.into(), locale, entries: object.into_iter().collect() })
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Sets `@@locale` to the document's identity.
    pub fn stamp_locale(&mut self) {
        self.locale = Some(self.identity.clone());
    }

    /// All fields except `@@locale`, sorted, annotations included.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    /// Translatable keys: everything not starting with `@`.
    pub fn translation_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str).filter(|key| !is_metadata_key(key))
    }

    #[must_use]
    pub fn key_set(&self) -> BTreeSet<&str> {
        self.translation_keys().collect()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[cfg(test)]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Inserts an entry. `@@locale` cannot be set this way; use `stamp_locale`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        if key == LOCALE_KEY {
            return None;
        }
        self.entries.insert(key, value.into())
    }

    /// Translatable entries with string values.
    pub fn string_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(key, _)| !is_metadata_key(key))
            .filter_map(|(key, value)| Some((key.as_str(), value.as_str()?)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.translation_keys().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.translation_keys().next().is_none()
    }

    /// Canonical form: `@@locale` first, then every other key in lexicographic order,
    /// two-space indentation and a trailing newline.
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_pretty_string(&self) -> Result<String, DocumentError> {
        let mut object = Map::new();
        if let Some(locale) = &self.locale {
            object.insert(LOCALE_KEY.to_string(), Value::String(locale.clone()));
        }
        for (key, value) in &self.entries {
            object.insert(key.clone(), value.clone());
        }
        to_pretty_json(&object)
    }
}

/// The translations directory holding one `intl_<locale>.arb` per locale.
#[derive(Debug, Clone)]
pub struct CanonicalStore {
    dir: PathBuf,
}

impl CanonicalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path(&self, locale: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{locale}.{FILE_EXTENSION}"))
    }

    /// The locale a canonical file name claims (`intl_en_US.arb` -> `en_US`).
    #[must_use]
    pub fn locale_of(path: &Path) -> Option<String> {
        if path.extension()? != FILE_EXTENSION {
            return None;
        }
        let locale = path.file_stem()?.to_str()?.strip_prefix(FILE_PREFIX)?;
        (!locale.is_empty()).then(|| locale.to_string())
    }

    /// Glob matching every canonical file in the store.
    #[must_use]
    pub fn file_pattern() -> String {
        format!("{FILE_PREFIX}*.{FILE_EXTENSION}")
    }

    /// # Errors
    /// `MissingArtifact` when the file does not exist, `Malformed` when it does not parse.
    pub fn load(&self, locale: &str) -> Result<CanonicalDocument, SyncError> {
        let path = self.path(locale);
        if !path.exists() {
            return Err(SyncError::missing(
                path,
                format!("Create it or run `lingo-sync import` to fetch '{locale}'."),
            ));
        }
        Self::load_path(&path, locale)
    }

    /// Loads a document from an explicit path.
    ///
    /// # Errors
    /// `Io` or `Malformed`.
    pub fn load_path(path: &Path, identity: &str) -> Result<CanonicalDocument, SyncError> {
        let text = read_file(path)?;
        tracing::debug!(path = %path.display(), "Loaded canonical document");
        CanonicalDocument::from_json_str(identity, &text).map_err(|error| SyncError::malformed(path, error))
    }

    /// Writes the document in canonical form under its identity's file name.
    ///
    /// # Errors
    /// Serialization or IO failure.
    pub fn save(&self, document: &CanonicalDocument) -> Result<PathBuf, SyncError> {
        let path = self.path(document.identity());
        let text = document.to_pretty_string().map_err(|error| SyncError::malformed(&path, error))?;
        write_file(&path, &text)?;
        tracing::debug!(path = %path.display(), keys = document.len(), "Wrote canonical document");
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn canonicalize(identity: &str, text: &str) -> String {
        CanonicalDocument::from_json_str(identity, text).unwrap().to_pretty_string().unwrap()
    }

    #[rstest]
    fn to_pretty_string_puts_locale_first_then_sorted_keys() {
        let text = r#"{"zeta": "z", "alpha": "a", "@@locale": "en_US", "@alpha": {"description": "d"}, "Beta": "b"}"#;

        let canonical = canonicalize("en_US", text);

        assert_eq!(
            canonical,
            "{\n  \"@@locale\": \"en_US\",\n  \"@alpha\": {\n    \"description\": \"d\"\n  },\n  \"Beta\": \"b\",\n  \"alpha\": \"a\",\n  \"zeta\": \"z\"\n}\n"
        );
    }

    #[rstest]
    fn canonicalize_is_stable() {
        let once = canonicalize("ja_JP", r#"{"b": "2", "@@locale": "ja_JP", "a": "1"}"#);
        let twice = canonicalize("ja_JP", &once);

        assert_eq!(once, twice);
    }

    #[rstest]
    fn from_json_str_splits_metadata() {
        let document = CanonicalDocument::from_json_str(
            "en_US",
            r#"{"@@locale": "en_GB", "@@x-extra": "1", "@home": {}, "home": "Home"}"#,
        )
        .unwrap();

        assert_that!(document.identity(), eq("en_US"));
        assert_that!(document.locale(), some(eq("en_GB")));
        assert_that!(document.translation_keys().collect::<Vec<_>>(), elements_are![eq(&"home")]);
        assert_that!(document.entries().len(), eq(3));
        assert_that!(document.len(), eq(1));
    }

    #[rstest]
    fn from_json_str_rejects_non_string_locale() {
        let result = CanonicalDocument::from_json_str("en_US", r#"{"@@locale": 1}"#);

        assert!(matches!(result, Err(DocumentError::InvalidLocaleField)));
    }

    #[rstest]
    fn insert_ignores_locale_key() {
        let mut document = CanonicalDocument::new("en_US");

        document.insert(LOCALE_KEY, "fr_FR");
        document.insert("k", json!("v"));

        assert_that!(document.locale(), some(eq("en_US")));
        assert_that!(document.get_str("k"), some(eq("v")));
        assert_that!(document.contains_key(LOCALE_KEY), eq(false));
    }

    #[rstest]
    fn string_entries_skip_metadata_and_non_strings() {
        let document = CanonicalDocument::from_json_str(
            "en_US",
            r#"{"@a": "note", "a": "A", "n": 1}"#,
        )
        .unwrap();

        assert_that!(document.string_entries().collect::<Vec<_>>(), elements_are![eq(&("a", "A"))]);
    }

    #[rstest]
    #[case("intl_en_US.arb", Some("en_US"))]
    #[case("intl_zh_Hans_CN.arb", Some("zh_Hans_CN"))]
    #[case("intl_.arb", None)]
    #[case("en_US.arb", None)]
    #[case("intl_en_US.json", None)]
    fn locale_of_cases(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(CanonicalStore::locale_of(Path::new(name)).as_deref(), expected);
    }

    #[rstest]
    fn test_store_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CanonicalStore::new(dir.path().join("assets/translations"));
        let mut document = CanonicalDocument::new("zh_Hans_CN");
        document.insert("b", "乙");
        document.insert("a", "甲");

        let path = store.save(&document).unwrap();
        let loaded = store.load("zh_Hans_CN").unwrap();

        assert_that!(path.ends_with("intl_zh_Hans_CN.arb"), eq(true));
        assert_eq!(loaded, document);
        assert_that!(
            std::fs::read_to_string(&path).unwrap(),
            eq("{\n  \"@@locale\": \"zh_Hans_CN\",\n  \"a\": \"甲\",\n  \"b\": \"乙\"\n}\n")
        );
    }

    #[rstest]
    fn test_store_load_missing_is_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = CanonicalStore::new(dir.path());

        assert!(matches!(store.load("en_US"), Err(SyncError::MissingArtifact { .. })));
    }

    #[rstest]
    fn test_store_load_malformed() {
        let dir = TempDir::new().unwrap();
        let store = CanonicalStore::new(dir.path());
        std::fs::write(store.path("en_US"), "{ not json").unwrap();

        let result = store.load("en_US");

        assert!(matches!(result, Err(SyncError::Malformed { .. })));
    }
}
