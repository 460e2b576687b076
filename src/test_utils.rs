//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::config::{
    CONFIG_FILE_NAME,
    ConfigManager,
};

/// 最小構成の `as_i18n.yaml`
pub(crate) const MINIMAL_CONFIG: &str = "\
locales: [zh_Hans_CN, zh_Hant_HK, en_US]
feature-strings:
  app: app_strings
";

/// 一時ディレクトリ上のテスト用プロジェクト
pub(crate) struct TestProject {
    /// プロジェクトルート
    dir: TempDir,
}

impl TestProject {
    /// 指定した設定ファイルを持つプロジェクトを作成する
    pub(crate) fn new(config: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), config).unwrap();
        Self { dir }
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    /// ルートからの相対パスにファイルを書き込む (親ディレクトリも作成)
    pub(crate) fn write(&self, relative: &str, contents: &str) {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// ルートからの相対パスのファイルを読み込む
    pub(crate) fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join(relative)).unwrap()
    }

    pub(crate) fn exists(&self, relative: &str) -> bool {
        self.dir.path().join(relative).exists()
    }

    /// 設定を読み込む
    pub(crate) fn config(&self) -> ConfigManager {
        ConfigManager::load(self.dir.path()).unwrap()
    }
}
