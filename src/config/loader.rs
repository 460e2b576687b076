//! 設定ファイルの読み込み関数

use std::path::{
    Path,
    PathBuf,
};

use super::{
    CONFIG_FILE_NAME,
    ConfigError,
    ProjectSettings,
};

/// プロジェクトルートから設定を読み込む
///
/// `as_i18n.yaml` を読み込んでパースする。バリデーションは呼び出し側で行う。
///
/// # Errors
/// - 設定ファイルが存在しない (`ConfigError::NotFound`)
/// - ファイル読み込みエラー
/// - YAML パースエラー
pub(super) fn load_from_root(project_root: &Path) -> Result<ProjectSettings, ConfigError> {
    let config_path = project_root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Err(ConfigError::NotFound(config_path));
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let settings: ProjectSettings = serde_yaml::from_str(&content)?;

    Ok(settings)
}

/// `start` から親ディレクトリを辿り、`as_i18n.yaml` を含む最初のディレクトリを返す
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}
