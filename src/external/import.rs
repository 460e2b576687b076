//! Turning service-side content back into canonical documents.
//!
//! Content arrives keyed by service locale code, either as a locale file or as flat records.
//! Only keys carrying the configured prefix are kept (with the prefix stripped), and each
//! service code lands in the canonical locales the fan-out policy selects.

use std::collections::{
    BTreeMap,
    BTreeSet,
};

use serde_json::{
    Map,
    Value,
};

use super::{
    ParseError,
    parse_locale_file,
};
use crate::document::{
    CanonicalDocument,
    ExternalFlatRecord,
};
use crate::locale::{
    FanOutPolicy,
    LocaleMapper,
};

/// Keeps the entries whose key starts with `prefix`, with the prefix removed.
///
/// A key equal to the prefix would become the empty key, so it is dropped.
#[must_use]
pub fn strip_prefixed(entries: &Map<String, Value>, prefix: &str) -> BTreeMap<String, Value> {
    entries
        .iter()
        .filter_map(|(key, value)| {
            let stripped = key.strip_prefix(prefix)?;
            if stripped.is_empty() {
                tracing::debug!(key = %key, "Dropping key that is only the prefix");
                return None;
            }
            Some((stripped.to_string(), value.clone()))
        })
        .collect()
}

/// What an import produced.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Documents for declared locales, keyed by canonical code.
    pub documents: BTreeMap<String, CanonicalDocument>,
    /// Canonical codes that received content but are not declared.
    pub undeclared: BTreeSet<String>,
    /// Declared fan-out targets the policy left without content.
    pub unpopulated: BTreeSet<String>,
}

/// Collects service content into canonical documents.
#[derive(Debug)]
pub struct Importer<'a> {
    mapper: &'a LocaleMapper,
    policy: FanOutPolicy,
    prefix: &'a str,
    declared: &'a [String],
    outcome: ImportOutcome,
    /// Every canonical code some imported service code could reach.
    reachable: BTreeSet<String>,
}

impl<'a> Importer<'a> {
    #[must_use]
    pub fn new(mapper: &'a LocaleMapper, policy: FanOutPolicy, prefix: &'a str, declared: &'a [String]) -> Self {
        Self {
            mapper,
            policy,
            prefix,
            declared,
            outcome: ImportOutcome::default(),
            reachable: BTreeSet::new(),
        }
    }

    /// Adds the content of one service locale.
    pub fn add(&mut self, external_code: &str, entries: &Map<String, Value>) {
        let kept = strip_prefixed(entries, self.prefix);
        tracing::debug!(
            locale = external_code,
            total = entries.len(),
            kept = kept.len(),
            "Filtered service entries by prefix"
        );

        self.reachable.extend(self.mapper.to_canonical(external_code));
        for target in self.mapper.targets(external_code, self.policy) {
            if !self.declared.contains(&target) {
                self.outcome.undeclared.insert(target);
                continue;
            }
            let document = self
                .outcome
                .documents
                .entry(target.clone())
                .or_insert_with(|| CanonicalDocument::new(target.clone()));
            for (key, value) in &kept {
                document.insert(key.clone(), value.clone());
            }
        }
    }

    /// Parses a locale file and adds its content.
    ///
    /// # Errors
    /// `ParseError` when the file is not a valid locale literal; nothing is added then.
    pub fn add_locale_file(
        &mut self,
        source_name: &str,
        external_code: &str,
        text: &str,
    ) -> Result<(), ParseError> {
        let literal = parse_locale_file(source_name, text)?;
        self.add(external_code, &literal.entries);
        Ok(())
    }

    /// Adds every locale field of the records.
    pub fn add_records(&mut self, records: &[ExternalFlatRecord]) {
        let mut by_code: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
        for record in records {
            for (code, value) in &record.values {
                by_code.entry(code.as_str()).or_default().insert(record.key.clone(), value.clone());
            }
        }
        for (code, entries) in &by_code {
            self.add(code, entries);
        }
    }

    #[must_use]
    pub fn finish(mut self) -> ImportOutcome {
        self.outcome.unpopulated = self
            .reachable
            .iter()
            .filter(|locale| {
                self.declared.contains(*locale) && !self.outcome.documents.contains_key(*locale)
            })
            .cloned()
            .collect();
        self.outcome
    }
}
