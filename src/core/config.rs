// 設定ファイル管理
//
// パーサー設定ファイル（YAML形式）の読み込みと検証を行います。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// ドキュメント評価時のセーフモード
///
/// `Secure` ではインクルードディレクティブを一切解決せず、リンクに置き換えます。
/// それ以外のモードではインクルードはすべて登録済みのプロセッサ経由で解決され、
/// ファイルシステムへ直接アクセスすることはありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeMode {
    Unsafe,
    #[default]
    Safe,
    Server,
    Secure,
}

impl std::fmt::Display for SafeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafeMode::Unsafe => write!(f, "unsafe"),
            SafeMode::Safe => write!(f, "safe"),
            SafeMode::Server => write!(f, "server"),
            SafeMode::Secure => write!(f, "secure"),
        }
    }
}

/// パーサー設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// 対象とするチェンジログの拡張子（完全一致のサフィックス、大文字小文字を区別）
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// パーサーの優先度
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// ドキュメント評価時のセーフモード
    #[serde(default)]
    pub safe_mode: SafeMode,

    /// インクルードのネスト上限
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
}

fn default_extensions() -> Vec<String> {
    vec![".asciidoc".to_string(), ".adoc".to_string()]
}

fn default_priority() -> i32 {
    1
}

fn default_max_include_depth() -> usize {
    64
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            priority: default_priority(),
            safe_mode: SafeMode::default(),
            max_include_depth: default_max_include_depth(),
        }
    }
}

impl ParserConfig {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = ".adoc-changelog.yaml";

    /// 設定ファイルを読み込んで検証する
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: ParserConfig = content.parse()?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    /// 指定されたパスがこの設定の拡張子に一致するかどうか
    pub fn matches_extension(&self, location: &str) -> bool {
        self.extensions.iter().any(|ext| location.ends_with(ext.as_str()))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(anyhow!("At least one change log extension is required"));
        }

        if let Some(blank) = self.extensions.iter().find(|ext| ext.trim().is_empty()) {
            return Err(anyhow!("Change log extension must not be blank: {:?}", blank));
        }

        if self.max_include_depth == 0 {
            return Err(anyhow!("max_include_depth must be greater than 0"));
        }

        Ok(())
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for ParserConfig {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.priority, 1);
        assert_eq!(config.safe_mode, SafeMode::Safe);
        assert_eq!(config.max_include_depth, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_matches_extension_is_exact_suffix() {
        let config = ParserConfig::default();
        assert!(config.matches_extension("db/changelog.adoc"));
        assert!(config.matches_extension("db/changelog.asciidoc"));
        assert!(!config.matches_extension("db/changelog.ADOC"));
        assert!(!config.matches_extension("db/changelog.adoc.bak"));
        assert!(!config.matches_extension("db/changelog.xml"));
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let config = ParserConfig {
            max_include_depth: 0,
            ..ParserConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_extension() {
        let config = ParserConfig {
            extensions: vec![".adoc".to_string(), "  ".to_string()],
            ..ParserConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must not be blank"));
    }
}
