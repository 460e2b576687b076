//! The sync stages.
//!
//! Each stage reads its inputs through the project layout, writes its outputs as whole files
//! and returns a summary of what it did. Nothing is written when a stage fails before its
//! final step.

use std::path::{
    Path,
    PathBuf,
};

use super::runner::{
    ExternalCallError,
    StepRunner,
};
use crate::config::{
    ConfigError,
    ConfigManager,
    FileMatcher,
    ProjectLayout,
    ValidationError,
};
use crate::document::diff::{
    Fragment,
    compute_diff,
    merge_fragments,
};
use crate::document::flat::{
    ExportLocales,
    diff_to_records,
    parse_records,
    records_to_string,
};
use crate::document::template::{
    extend_template,
    stale_template_keys,
};
use crate::document::{
    CanonicalDocument,
    CanonicalStore,
    DiffDocument,
    read_file,
    write_file,
};
use crate::error::SyncError;
use crate::external::import::Importer;
use crate::external::region::{
    RenderOptions,
    skeleton,
    splice_region,
};
use crate::external::service;
use crate::validate::{
    LoadedDocument,
    validate_documents,
};

/// Pattern of the fragments the generate steps write.
const FRAGMENT_PATTERN: &str = "*.arb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSummary {
    pub path: PathBuf,
    pub fragments: usize,
    /// New keys, sorted.
    pub keys: Vec<String>,
}

/// Merges the generated fragments and writes the keys the source-locale document lacks.
///
/// The diff file is always rewritten, so an empty diff clears the previous one.
pub fn diff(config: &ConfigManager) -> Result<DiffSummary, SyncError> {
    let layout = config.layout();
    let fragments_dir = layout.fragments_dir();
    let files = FileMatcher::new(&fragments_dir, &[FRAGMENT_PATTERN]).map_err(ConfigError::from)?.find_files();
    if files.is_empty() {
        return Err(SyncError::missing(
            fragments_dir,
            "No generated fragments. Run the generate steps with `lingo-sync sync` first.",
        ));
    }

    let fragments = files
        .iter()
        .map(|path| {
            let text = read_file(path)?;
            Fragment::from_json_str(path, &text).map_err(|error| SyncError::malformed(path, error))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let baseline = layout.canonical_store().load(&config.settings().source_locale)?;
    let diff = compute_diff(&merge_fragments(&fragments), &baseline);

    let path = layout.diff_path();
    let text = diff.to_pretty_string().map_err(|error| SyncError::malformed(&path, error))?;
    write_file(&path, &text)?;

    tracing::info!(fragments = fragments.len(), new_keys = diff.len(), path = %path.display(), "Wrote diff");
    Ok(DiffSummary { path, fragments: fragments.len(), keys: diff.keys().map(str::to_string).collect() })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// `None` when the diff was empty and nothing was written.
    pub path: Option<PathBuf>,
    pub records: usize,
}

/// Converts the diff and its translation into the flat record list for the service.
pub fn export(config: &ConfigManager) -> Result<ExportSummary, SyncError> {
    let layout = config.layout();
    let settings = config.settings();

    let diff = load_diff(&layout.diff_path(), "Run `lingo-sync diff` first.")?;
    if diff.is_empty() {
        tracing::info!("Diff is empty, nothing to export");
        return Ok(ExportSummary { path: None, records: 0 });
    }

    let mapper = config.locale_mapper();
    let source = mapper.to_external(&settings.source_locale);
    let default = mapper.to_external(&settings.default_locale);
    let translated = if default == source {
        DiffDocument::default()
    } else {
        load_diff(
            &layout.translated_diff_path(&settings.default_locale),
            "Run the translate step with `lingo-sync sync` first.",
        )?
    };

    let all = config.external_locales();
    let locales = ExportLocales { source: &source, default: &default, all: &all };
    let records = diff_to_records(&diff, &translated, &locales);

    let path = layout.flat_export_path();
    let text = records_to_string(&records).map_err(|error| SyncError::malformed(&path, error))?;
    write_file(&path, &text)?;

    tracing::info!(records = records.len(), path = %path.display(), "Wrote service export");
    Ok(ExportSummary { path: Some(path), records: records.len() })
}

/// Reads a diff document, or `MissingArtifact` with `hint` when the file is absent.
fn load_diff(path: &Path, hint: &str) -> Result<DiffDocument, SyncError> {
    if !path.exists() {
        return Err(SyncError::missing(path, hint));
    }
    let text = read_file(path)?;
    DiffDocument::from_json_str(&text).map_err(|error| SyncError::malformed(path, error))
}

/// Runs the translate step on the diff. Returns the translated diff it wrote.
pub async fn translate(config: &ConfigManager, runner: &StepRunner) -> Result<PathBuf, SyncError> {
    let settings = config.settings();
    let step = settings
        .pipeline
        .translate
        .as_ref()
        .ok_or_else(|| ExternalCallError::NotConfigured("translate".to_string()))?;
    let api_key = settings
        .openai_api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ConfigError::from(ValidationError::new("openai-api-key", "Required by the translate step")))?;

    let layout = config.layout();
    let diff_path = layout.diff_path();
    if !diff_path.exists() {
        return Err(SyncError::missing(diff_path, "Run `lingo-sync diff` first."));
    }
    let output = layout.translated_diff_path(&settings.default_locale);

    runner
        .run(
            step,
            &[
                ("OPENAI_API_KEY", api_key.to_string()),
                ("LINGO_DIFF_FILE", diff_path.display().to_string()),
                ("LINGO_TRANSLATED_FILE", output.display().to_string()),
                ("LINGO_TARGET_LOCALE", settings.default_locale.clone()),
            ],
        )
        .await?;

    if !output.exists() {
        return Err(SyncError::missing(output, "The translate step finished without writing it."));
    }
    Ok(output)
}

/// Where imported content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImportSource {
    /// The service locale files under `lingo.locales-dir`.
    #[default]
    LocaleFiles,
    /// A flat record list in the export format.
    Records(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub written: Vec<PathBuf>,
    /// Inputs that failed to parse.
    pub skipped: Vec<PathBuf>,
    pub undeclared: Vec<String>,
    pub unpopulated: Vec<String>,
}

/// Replaces the canonical documents with the service content.
///
/// Malformed locale files are skipped. Documents that end up without any key are not written.
pub fn import(config: &ConfigManager, source: &ImportSource) -> Result<ImportSummary, SyncError> {
    let settings = config.settings();
    let layout = config.layout();
    let mut importer =
        Importer::new(config.locale_mapper(), settings.lingo.fan_out, &settings.lingo.prefix, &settings.locales);
    let mut summary = ImportSummary::default();

    match source {
        ImportSource::LocaleFiles => {
            create_skeletons(config, &layout)?;
            let pattern = ProjectLayout::locale_file_pattern();
            let matcher =
                FileMatcher::new(layout.locales_dir(), &[pattern.as_str()]).map_err(ConfigError::from)?;
            for path in matcher.find_files() {
                let Some(code) = ProjectLayout::external_code_of(&path) else {
                    continue;
                };
                let text = read_file(&path)?;
                if let Err(error) = importer.add_locale_file(&path.display().to_string(), &code, &text) {
                    tracing::warn!(%error, "Skipping malformed locale file");
                    summary.skipped.push(path);
                }
            }
        }
        ImportSource::Records(path) => {
            if !path.exists() {
                return Err(SyncError::missing(path, "Pass the record list the translation service returned."));
            }
            let text = read_file(path)?;
            let records = parse_records(&text).map_err(|error| SyncError::malformed(path, error))?;
            importer.add_records(&records);
        }
    }

    let outcome = importer.finish();
    for locale in &outcome.undeclared {
        tracing::warn!(locale = %locale, "Not importing content for an undeclared locale");
    }
    for locale in &outcome.unpopulated {
        tracing::warn!(
            locale = %locale,
            policy = ?settings.lingo.fan_out,
            "Declared fan-out target received no content"
        );
    }

    let store = layout.canonical_store();
    for document in outcome.documents.values() {
        if document.is_empty() {
            tracing::warn!(locale = document.identity(), "Imported document has no keys, keeping the current one");
            continue;
        }
        summary.written.push(store.save(document)?);
    }
    summary.undeclared = outcome.undeclared.into_iter().collect();
    summary.unpopulated = outcome.unpopulated.into_iter().collect();

    tracing::info!(written = summary.written.len(), skipped = summary.skipped.len(), "Imported service content");
    Ok(summary)
}

/// Creates an empty locale file for every service locale that has none.
fn create_skeletons(config: &ConfigManager, layout: &ProjectLayout) -> Result<usize, SyncError> {
    let lingo = &config.settings().lingo;
    let mut created = 0;
    for code in config.external_locales() {
        let path = layout.locale_file(&code);
        if path.exists() {
            continue;
        }
        write_file(&path, &skeleton(&lingo.start_tag, &lingo.end_tag))?;
        tracing::info!(path = %path.display(), "Created locale file");
        created += 1;
    }
    Ok(created)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub path: PathBuf,
    pub added: Vec<String>,
    /// Template keys the source document no longer has.
    pub stale: Vec<String>,
}

/// Adds the feature-owned source keys the template lacks.
///
/// A missing template file starts out empty. The file is only written when keys were added.
pub fn template(config: &ConfigManager) -> Result<TemplateSummary, SyncError> {
    let layout = config.layout();
    let source = layout.canonical_store().load(&config.settings().source_locale)?;
    let path = layout.template_path();
    let text = if path.exists() { read_file(&path)? } else { String::new() };

    let update = extend_template(&text, &source, config.feature_prefixes())
        .map_err(|error| SyncError::malformed(&path, error))?;
    let stale = stale_template_keys(&text, &source).map_err(|error| SyncError::malformed(&path, error))?;

    for key in &stale {
        tracing::warn!(key = %key, "Template key is missing from the source document");
    }
    if !update.skipped.is_empty() {
        tracing::debug!(count = update.skipped.len(), "Source keys owned by no feature were left out");
    }

    if update.is_unchanged() {
        tracing::info!(path = %path.display(), "Template is up to date");
    } else {
        write_file(&path, &update.new_text)?;
        tracing::info!(added = update.added.len(), path = %path.display(), "Updated template");
    }
    Ok(TemplateSummary { path, added: update.added, stale })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateSummary {
    pub documents: usize,
    /// Documents whose on-disk form was not yet canonical.
    pub rewritten: Vec<PathBuf>,
}

/// Validates every canonical document and, when all pass, rewrites them in canonical order.
pub fn validate(config: &ConfigManager) -> Result<ValidateSummary, SyncError> {
    let store = config.layout().canonical_store();
    let pattern = CanonicalStore::file_pattern();
    let files = FileMatcher::new(store.dir(), &[pattern.as_str()]).map_err(ConfigError::from)?.find_files();

    let mut documents = Vec::with_capacity(files.len());
    let mut originals = Vec::with_capacity(files.len());
    for path in files {
        let Some(locale) = CanonicalStore::locale_of(&path) else {
            continue;
        };
        let text = read_file(&path)?;
        let document = CanonicalDocument::from_json_str(locale, &text)
            .map_err(|error| SyncError::malformed(&path, error))?;
        documents.push(LoadedDocument { path, document });
        originals.push(text);
    }

    let missing: Vec<(String, PathBuf)> = config
        .settings()
        .locales
        .iter()
        .filter(|locale| !documents.iter().any(|loaded| loaded.document.identity() == locale.as_str()))
        .map(|locale| (locale.clone(), store.path(locale)))
        .collect();

    validate_documents(&documents, &missing)?;

    let mut rewritten = Vec::new();
    for (LoadedDocument { path, document }, original) in documents.iter().zip(&originals) {
        let text = document.to_pretty_string().map_err(|error| SyncError::malformed(path, error))?;
        if text != *original {
            write_file(path, &text)?;
            rewritten.push(path.clone());
        }
    }

    tracing::info!(documents = documents.len(), rewritten = rewritten.len(), "Translations are valid");
    Ok(ValidateSummary { documents: documents.len(), rewritten })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub written: Vec<PathBuf>,
    /// Locale files without a managed region.
    pub skipped: Vec<PathBuf>,
}

/// Runs the pull step, if one is configured, then renders the service records.
pub async fn apply(config: &ConfigManager, runner: &StepRunner) -> Result<ApplySummary, SyncError> {
    if let Some(step) = &config.settings().pipeline.pull {
        let layout = config.layout();
        runner
            .run(
                step,
                &[
                    ("LINGO_RECORDS_FILE", layout.service_records_path().display().to_string()),
                    ("LINGO_LOCALES", config.external_locales().join(",")),
                ],
            )
            .await?;
    }
    render_service_records(config)
}

/// Writes the service records into the managed region of each locale file.
///
/// A file missing either tag is skipped; the others are still written.
pub fn render_service_records(config: &ConfigManager) -> Result<ApplySummary, SyncError> {
    let layout = config.layout();
    let lingo = &config.settings().lingo;

    let path = layout.service_records_path();
    if !path.exists() {
        return Err(SyncError::missing(path, "Configure a pull step or place the service records there."));
    }
    let text = read_file(&path)?;
    let records = service::parse_records(&text).map_err(|error| SyncError::malformed(&path, error))?;
    let options = RenderOptions::from_config(lingo)
        .map_err(|message| ConfigError::from(ValidationError::new("lingo.entry-template", message)))?;

    let mut summary = ApplySummary::default();
    for (code, entries) in service::group_by_locale(&records) {
        let file = layout.locale_file(&code);
        let current = if file.exists() { read_file(&file)? } else { skeleton(&lingo.start_tag, &lingo.end_tag) };
        match splice_region(&current, &lingo.start_tag, &lingo.end_tag, &options.render_entries(&entries)) {
            Ok(updated) => {
                write_file(&file, &updated)?;
                tracing::debug!(locale = %code, entries = entries.len(), "Rendered locale file");
                summary.written.push(file);
            }
            Err(error) => {
                tracing::warn!(file = %file.display(), %error, "Skipping locale file");
                summary.skipped.push(file);
            }
        }
    }

    tracing::info!(written = summary.written.len(), skipped = summary.skipped.len(), "Applied service records");
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub diff: DiffSummary,
    /// `None` when there was nothing new to translate.
    pub export: Option<ExportSummary>,
}

/// Generate steps, diff, and when there are new keys, translate and export.
pub async fn sync(config: &ConfigManager, runner: &StepRunner) -> Result<SyncSummary, SyncError> {
    let layout = config.layout();
    let generator_env = [
        ("LINGO_TEMPLATE_FILE", layout.template_path().display().to_string()),
        ("LINGO_OUTPUT_FILE", layout.generated_output_path().display().to_string()),
        ("LINGO_FRAGMENTS_DIR", layout.fragments_dir().display().to_string()),
    ];
    for step in &config.settings().pipeline.generate {
        runner.run(step, &generator_env).await?;
    }

    let diff = diff(config)?;
    if diff.keys.is_empty() {
        tracing::info!("No new keys, skipping translate and export");
        return Ok(SyncSummary { diff, export: None });
    }

    translate(config, runner).await?;
    let export = export(config)?;
    Ok(SyncSummary { diff, export: Some(export) })
}
