//! Where every document lives, resolved against the project root.

use std::path::{
    Path,
    PathBuf,
};

use super::ProjectSettings;
use crate::document::CanonicalStore;

/// Fragment files the generators write, relative to the build directory.
const FRAGMENTS_DIR: &str = "arb";
const DIFF_FILE: &str = "diff.json";
const FLAT_EXPORT_FILE: &str = "new_to_lingo.json";
const SERVICE_RECORDS_FILE: &str = "service_records.json";
const LOCALE_FILE_EXTENSION: &str = "js";

/// Absolute paths of the project's documents.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    translations_dir: PathBuf,
    build_dir: PathBuf,
    i18n_dir: PathBuf,
    template_json_file: String,
    output_localization_file: String,
    locales_dir: PathBuf,
}

impl ProjectLayout {
    #[must_use]
    pub fn new(root: &Path, settings: &ProjectSettings) -> Self {
        Self {
            translations_dir: root.join(&settings.translations_dir),
            build_dir: root.join(&settings.build_dir),
            i18n_dir: root.join(&settings.i18n_dir),
            template_json_file: settings.template_json_file.clone(),
            output_localization_file: settings.output_localization_file.clone(),
            locales_dir: root.join(&settings.lingo.locales_dir),
        }
    }

    #[must_use]
    pub fn canonical_store(&self) -> CanonicalStore {
        CanonicalStore::new(&self.translations_dir)
    }

    #[must_use]
    pub fn fragments_dir(&self) -> PathBuf {
        self.build_dir.join(FRAGMENTS_DIR)
    }

    #[must_use]
    pub fn diff_path(&self) -> PathBuf {
        self.build_dir.join(DIFF_FILE)
    }

    /// The diff translated into `default_locale` by the translate step.
    #[must_use]
    pub fn translated_diff_path(&self, default_locale: &str) -> PathBuf {
        self.build_dir.join(format!("diff_{default_locale}.json"))
    }

    #[must_use]
    pub fn flat_export_path(&self) -> PathBuf {
        self.build_dir.join(FLAT_EXPORT_FILE)
    }

    #[must_use]
    pub fn service_records_path(&self) -> PathBuf {
        self.build_dir.join(SERVICE_RECORDS_FILE)
    }

    #[must_use]
    pub fn template_path(&self) -> PathBuf {
        self.i18n_dir.join(&self.template_json_file)
    }

    /// Bindings file the generate steps write.
    #[must_use]
    pub fn generated_output_path(&self) -> PathBuf {
        self.i18n_dir.join(&self.output_localization_file)
    }

    #[must_use]
    pub fn locales_dir(&self) -> &Path {
        &self.locales_dir
    }

    /// The service locale file for an external code (`zh_CN` -> `.../zh_CN.js`).
    #[must_use]
    pub fn locale_file(&self, external_code: &str) -> PathBuf {
        self.locales_dir.join(format!("{external_code}.{LOCALE_FILE_EXTENSION}"))
    }

    /// Glob matching every service locale file.
    #[must_use]
    pub fn locale_file_pattern() -> String {
        format!("*.{LOCALE_FILE_EXTENSION}")
    }

    /// The external code a locale file is named after.
    #[must_use]
    pub fn external_code_of(path: &Path) -> Option<String> {
        if path.extension()? != LOCALE_FILE_EXTENSION {
            return None;
        }
        path.file_stem()?.to_str().map(str::to_string)
    }
}
