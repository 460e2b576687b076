use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::external::region::EntryTemplate;
use crate::feature::FeaturePrefixes;
use crate::locale::FanOutPolicy;

/// Name of the project configuration file, looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "as_i18n.yaml";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// Path to the field (e.g., "feature-strings.app", "pipeline.generate[0].program")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error(transparent)]
    Matcher(#[from] super::MatcherError),
}

impl From<ValidationError> for ConfigError {
    fn from(error: ValidationError) -> Self {
        Self::ValidationErrors(vec![error])
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of `as_i18n.yaml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProjectSettings {
    /// Declared canonical locales (e.g. `zh_Hans_CN`). Required.
    pub locales: Vec<String>,

    /// Feature name -> raw prefix token (e.g. `app: app_strings`). Required.
    pub feature_strings: BTreeMap<String, String>,

    pub i18n_dir: String,
    pub template_json_file: String,
    /// Generated bindings file, consumed only by external generators.
    pub output_localization_file: String,

    /// Credential handed to the translate step.
    pub openai_api_key: Option<String>,

    /// Canonical locale the source strings are written in.
    pub source_locale: String,
    /// Language every exported record carries a translation for.
    pub default_locale: String,

    pub translations_dir: String,
    pub build_dir: String,

    pub lingo: LingoConfig,
    pub pipeline: PipelineConfig,
}

/// Translation-service exchange settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LingoConfig {
    /// Only service keys starting with this prefix are imported; the prefix is stripped.
    pub prefix: String,
    pub locales_dir: String,
    pub fan_out: FanOutPolicy,
    pub start_tag: String,
    pub end_tag: String,
    /// Line template for managed-region entries, with `{{key}}` and `{{value}}` slots.
    pub entry_template: String,
    pub key_replaces: Vec<Replacement>,
    pub value_replaces: Vec<Replacement>,
    pub value_to_unicode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PipelineConfig {
    /// Per-attempt limit for every external step.
    pub timeout_secs: u64,
    /// Extra attempts after a timeout. Failures other than timeouts are never retried.
    pub retries: u32,
    pub generate: Vec<ExternalStep>,
    pub translate: Option<ExternalStep>,
    pub pull: Option<ExternalStep>,
}

/// A command the pipeline runs as an opaque external step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExternalStep {
    #[serde(default)]
    pub name: Option<String>,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory, relative to the project root.
    #[serde(default)]
    pub cwd: Option<String>,
}

impl ExternalStep {
    /// Name used in logs and errors.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.program)
    }
}

impl ProjectSettings {
    /// Checks every field and returns the feature prefix table built along the way.
    ///
    /// # Errors
    /// - Required field is empty
    /// - Overlapping feature prefixes
    /// - Source locale not declared
    /// - Invalid managed-region settings
    /// - Invalid external step
    pub fn validate(&self) -> Result<FeaturePrefixes, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut feature_prefixes = None;

        if self.locales.is_empty() {
            errors.push(ValidationError::new(
                "locales",
                "At least one locale is required. Example: [zh_Hans_CN, en_US]",
            ));
        }

        for (index, locale) in self.locales.iter().enumerate() {
            if locale.trim().is_empty() {
                errors.push(ValidationError::new(format!("locales[{index}]"), "Locale cannot be empty"));
            }
        }

        if self.feature_strings.is_empty() {
            errors.push(ValidationError::new(
                "feature-strings",
                "At least one feature is required. Example: {app: app_strings}",
            ));
        } else {
            match FeaturePrefixes::new(&self.feature_strings) {
                Ok(prefixes) => feature_prefixes = Some(prefixes),
                Err(prefix_errors) => errors.extend(prefix_errors),
            }
        }

        if self.source_locale.is_empty() {
            errors.push(ValidationError::new("source-locale", "The source locale cannot be empty"));
        } else if !self.locales.is_empty() && !self.locales.contains(&self.source_locale) {
            errors.push(ValidationError::new(
                "source-locale",
                format!("'{}' must be one of the declared locales", self.source_locale),
            ));
        }

        if self.default_locale.is_empty() {
            errors.push(ValidationError::new(
                "default-locale",
                "The default locale cannot be empty. Example: en_US",
            ));
        }

        if self.template_json_file.is_empty() {
            errors.push(ValidationError::new(
                "template-json-file",
                "The file name cannot be empty. Example: as_i18n.json",
            ));
        }

        self.lingo.validate(&mut errors);
        self.pipeline.validate(&mut errors);

        match feature_prefixes {
            Some(prefixes) if errors.is_empty() => Ok(prefixes),
            _ => Err(errors),
        }
    }
}

impl LingoConfig {
    fn validate(&self, errors: &mut Vec<ValidationError>) {
        if self.start_tag.trim().is_empty() {
            errors.push(ValidationError::new("lingo.start-tag", "The tag cannot be empty"));
        }
        if self.end_tag.trim().is_empty() {
            errors.push(ValidationError::new("lingo.end-tag", "The tag cannot be empty"));
        }
        if !self.start_tag.is_empty() && self.start_tag == self.end_tag {
            errors.push(ValidationError::new(
                "lingo.end-tag",
                "The end tag must differ from the start tag",
            ));
        }
        if let Err(message) = EntryTemplate::parse(&self.entry_template) {
            errors.push(ValidationError::new("lingo.entry-template", message));
        }
        for (index, replace) in self.key_replaces.iter().enumerate() {
            if replace.from.is_empty() {
                errors.push(ValidationError::new(
                    format!("lingo.key-replaces[{index}].from"),
                    "The pattern cannot be empty",
                ));
            }
        }
        for (index, replace) in self.value_replaces.iter().enumerate() {
            if replace.from.is_empty() {
                errors.push(ValidationError::new(
                    format!("lingo.value-replaces[{index}].from"),
                    "The pattern cannot be empty",
                ));
            }
        }
    }
}

impl PipelineConfig {
    fn validate(&self, errors: &mut Vec<ValidationError>) {
        if self.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "pipeline.timeout-secs",
                "The timeout must be at least 1 second",
            ));
        }

        for (index, step) in self.generate.iter().enumerate() {
            if step.program.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("pipeline.generate[{index}].program"),
                    "The program cannot be empty",
                ));
            }
        }
        if let Some(step) = &self.translate
            && step.program.trim().is_empty()
        {
            errors.push(ValidationError::new("pipeline.translate.program", "The program cannot be empty"));
        }
        if let Some(step) = &self.pull
            && step.program.trim().is_empty()
        {
            errors.push(ValidationError::new("pipeline.pull.program", "The program cannot be empty"));
        }
    }
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            locales: Vec::new(),
            feature_strings: BTreeMap::new(),
            i18n_dir: "lib/localizations/".to_string(),
            template_json_file: "as_i18n.json".to_string(),
            output_localization_file: "app_localizations.dart".to_string(),
            openai_api_key: None,
            source_locale: "zh_Hans_CN".to_string(),
            default_locale: "en_US".to_string(),
            translations_dir: "assets/translations".to_string(),
            build_dir: "build/localizations".to_string(),
            lingo: LingoConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for LingoConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            locales_dir: "lingo-sync/src/locales".to_string(),
            fan_out: FanOutPolicy::default(),
            start_tag: "// lingo-start".to_string(),
            end_tag: "// lingo-end".to_string(),
            entry_template: "\"{{key}}\": \"{{value}}\",".to_string(),
            key_replaces: Vec::new(),
            value_replaces: Vec::new(),
            value_to_unicode: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { timeout_secs: 300, retries: 1, generate: Vec::new(), translate: None, pull: None }
    }
}
