//! Mapping between canonical locale codes (`zh_Hans_CN`) and the simplified codes the
//! translation service uses (`zh_CN`).

use std::collections::BTreeSet;

use serde::{
    Deserialize,
    Serialize,
};

/// Which canonical documents receive content when one service code maps to several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FanOutPolicy {
    /// Only the first canonical code listed for the service code.
    #[default]
    Primary,
    /// Every canonical code gets a copy.
    Mirror,
}

/// One row of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocaleAlias {
    canonical: String,
    external: String,
}

/// Bidirectional locale code table. Codes missing from the table map to themselves.
#[derive(Debug, Clone)]
pub struct LocaleMapper {
    aliases: Vec<LocaleAlias>,
}

impl Default for LocaleMapper {
    fn default() -> Self {
        Self::new([
            ("zh_Hans_CN", "zh_CN"),
            ("zh_Hant_HK", "zh_HK"),
            ("zh_Hant_TW", "zh_HK"),
        ])
    }
}

impl LocaleMapper {
    /// Creates a mapper from `(canonical, external)` pairs.
    ///
    /// For a service code listed more than once, the first pair is its primary target.
    pub fn new<C, E>(aliases: impl IntoIterator<Item = (C, E)>) -> Self
    where
        C: Into<String>,
        E: Into<String>,
    {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(canonical, external)| LocaleAlias {
                    canonical: canonical.into(),
                    external: external.into(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn to_external(&self, canonical: &str) -> String {
        self.aliases
            .iter()
            .find(|alias| alias.canonical == canonical)
            .map_or_else(|| canonical.to_string(), |alias| alias.external.clone())
    }

    /// All canonical codes for a service code, sorted and deduplicated.
    #[must_use]
    pub fn to_canonical(&self, external: &str) -> Vec<String> {
        let codes: BTreeSet<String> = self
            .aliases
            .iter()
            .filter(|alias| alias.external == external)
            .map(|alias| alias.canonical.clone())
            .collect();

        if codes.is_empty() { vec![external.to_string()] } else { codes.into_iter().collect() }
    }

    /// The canonical code that always receives content for `external`.
    #[must_use]
    pub fn primary_canonical(&self, external: &str) -> String {
        self.aliases
            .iter()
            .find(|alias| alias.external == external)
            .map_or_else(|| external.to_string(), |alias| alias.canonical.clone())
    }

    /// Canonical codes that receive content for `external` under `policy`.
    #[must_use]
    pub fn targets(&self, external: &str, policy: FanOutPolicy) -> Vec<String> {
        match policy {
            FanOutPolicy::Primary => vec![self.primary_canonical(external)],
            FanOutPolicy::Mirror => self.to_canonical(external),
        }
    }

    /// Service codes for the declared locales.
    ///
    /// `default_locale` is always included; the result is sorted and deduplicated.
    #[must_use]
    pub fn external_locales(&self, declared: &[String], default_locale: &str) -> Vec<String> {
        declared
            .iter()
            .map(|locale| self.to_external(locale))
            .chain(std::iter::once(self.to_external(default_locale)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    #[case("zh_Hans_CN", "zh_CN")]
    #[case("zh_Hant_HK", "zh_HK")]
    #[case("zh_Hant_TW", "zh_HK")]
    #[case::identity("en_US", "en_US")]
    #[case::identity_unknown("xx_YY", "xx_YY")]
    fn to_external_cases(#[case] canonical: &str, #[case] expected: &str) {
        assert_that!(LocaleMapper::default().to_external(canonical), eq(expected));
    }

    #[rstest]
    fn to_canonical_round_trip() {
        let mapper = LocaleMapper::default();

        assert_that!(mapper.to_canonical("zh_CN"), elements_are![eq("zh_Hans_CN")]);
        assert_that!(mapper.to_external(&mapper.to_canonical("zh_CN")[0]), eq("zh_CN"));
    }

    #[rstest]
    fn to_canonical_fans_out_sorted() {
        let mapper = LocaleMapper::new([("b_TW", "x"), ("a_HK", "x"), ("b_TW", "x")]);

        assert_that!(mapper.to_canonical("x"), elements_are![eq("a_HK"), eq("b_TW")]);
        assert_that!(mapper.primary_canonical("x"), eq("b_TW"));
    }

    #[rstest]
    fn to_canonical_includes_hong_kong() {
        let mapper = LocaleMapper::default();

        assert_that!(mapper.to_canonical("zh_HK"), contains(eq("zh_Hant_HK")));
        assert_that!(mapper.to_canonical("zh_HK"), len(eq(2)));
        assert_that!(mapper.to_canonical("ja_JP"), elements_are![eq("ja_JP")]);
    }

    #[rstest]
    fn targets_follow_policy() {
        let mapper = LocaleMapper::default();

        assert_that!(mapper.targets("zh_HK", FanOutPolicy::Primary), elements_are![eq("zh_Hant_HK")]);
        assert_that!(
            mapper.targets("zh_HK", FanOutPolicy::Mirror),
            elements_are![eq("zh_Hant_HK"), eq("zh_Hant_TW")]
        );
        assert_that!(mapper.targets("fr_FR", FanOutPolicy::Mirror), elements_are![eq("fr_FR")]);
    }

    #[rstest]
    fn external_locales_adds_default_and_dedupes() {
        let mapper = LocaleMapper::default();
        let declared = vec![
            "zh_Hant_TW".to_string(),
            "zh_Hans_CN".to_string(),
            "zh_Hant_HK".to_string(),
            "ja_JP".to_string(),
        ];

        let locales = mapper.external_locales(&declared, "en_US");

        assert_that!(locales, elements_are![eq("en_US"), eq("ja_JP"), eq("zh_CN"), eq("zh_HK")]);
    }
}
