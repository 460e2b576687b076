//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    ProjectLayout,
    ProjectSettings,
    loader,
};
use crate::feature::FeaturePrefixes;
use crate::locale::LocaleMapper;

/// 検証済みの設定とプロジェクトルートを保持する
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 検証済みの設定
    settings: ProjectSettings,

    /// プロジェクトのルートパス
    project_root: PathBuf,

    /// 検証済みの機能プレフィックス
    feature_prefixes: FeaturePrefixes,

    /// ロケールコード変換表
    locale_mapper: LocaleMapper,
}

impl ConfigManager {
    /// プロジェクトルートの `as_i18n.yaml` を読み込み、検証する
    ///
    /// # Errors
    /// - 設定ファイルが存在しない
    /// - ファイル読み込みエラー
    /// - YAML パースエラー
    /// - バリデーションエラー
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        tracing::debug!("Loading settings for project: {:?}", project_root);

        let settings = loader::load_from_root(project_root)?;
        Self::from_settings(project_root, settings)
    }

    /// 読み込み済みの設定から作成する
    ///
    /// # Errors
    /// バリデーションエラー
    pub fn from_settings(project_root: &Path, settings: ProjectSettings) -> Result<Self, ConfigError> {
        // バリデーション
        let feature_prefixes = settings.validate().map_err(ConfigError::ValidationErrors)?;

        tracing::debug!("Settings loaded successfully: {:?}", settings);

        Ok(Self {
            settings,
            project_root: project_root.to_path_buf(),
            feature_prefixes,
            locale_mapper: LocaleMapper::default(),
        })
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// プロジェクトルートを取得
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// ドキュメントの配置を取得
    #[must_use]
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(&self.project_root, &self.settings)
    }

    #[must_use]
    pub const fn feature_prefixes(&self) -> &FeaturePrefixes {
        &self.feature_prefixes
    }

    #[must_use]
    pub const fn locale_mapper(&self) -> &LocaleMapper {
        &self.locale_mapper
    }

    /// 翻訳サービス側のロケールコード一覧 (既定言語を含む、ソート済み)
    #[must_use]
    pub fn external_locales(&self) -> Vec<String> {
        self.locale_mapper.external_locales(&self.settings.locales, &self.settings.default_locale)
    }
}
