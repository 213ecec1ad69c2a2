// コマンド共通コンテキスト
//
// 設定ファイル読み込みやチェンジログパスの解決をCLI層で集約する。

use crate::adapters::resource_accessor::FileSystemResourceAccessor;
use crate::core::changelog::ChangeLog;
use crate::core::config::ParserConfig;
use crate::services::parser_registry::ChangeLogParserRegistry;
use anyhow::{anyhow, Context, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// リソース解決のルートディレクトリ
    pub root: PathBuf,
    pub config: ParserConfig,
}

impl CommandContext {
    /// 設定を読み込んでコンテキストを作成
    ///
    /// `config_path` が指定されていればそのファイルを読み込みます。
    /// 指定がない場合は作業ディレクトリの `.adoc-changelog.yaml` を探し、
    /// 存在しなければデフォルト設定を使います。
    pub fn load(
        working_dir: &Path,
        root: Option<PathBuf>,
        config_path: Option<&Path>,
    ) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Config file not found: {:?}", path));
                }
                ParserConfig::from_file(path).with_context(|| "Failed to read config file")?
            }
            None => {
                let default_path = working_dir.join(ParserConfig::DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    ParserConfig::from_file(&default_path)
                        .with_context(|| "Failed to read config file")?
                } else {
                    ParserConfig::default()
                }
            }
        };

        let root = match root {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => working_dir.join(dir),
            None => working_dir.to_path_buf(),
        };
        if !root.is_dir() {
            return Err(anyhow!("Root directory not found: {:?}", root));
        }

        debug!(root = ?root, safe_mode = %config.safe_mode, "Loaded command context");
        Ok(Self { root, config })
    }

    /// チェンジログのパスをルートからの論理パスに変換
    ///
    /// 絶対パスはルート配下にある場合だけ受け付けます。
    /// 区切り文字は常に `/` になります。
    pub fn resolve_location(&self, changelog: &Path) -> Result<String> {
        let relative = if changelog.is_absolute() {
            changelog.strip_prefix(&self.root).map_err(|_| {
                anyhow!(
                    "Change log {:?} is outside of the root directory {:?}",
                    changelog,
                    self.root
                )
            })?
        } else {
            changelog
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => {
                    return Err(anyhow!(
                        "Change log {:?} must be a path inside the root directory",
                        changelog
                    ))
                }
            }
        }

        if parts.is_empty() {
            return Err(anyhow!("Change log path is empty: {:?}", changelog));
        }
        Ok(parts.join("/"))
    }

    /// ルート配下のファイルシステムからチェンジログを解析
    pub fn parse_change_log(&self, changelog: &Path) -> Result<ChangeLog> {
        let location = self.resolve_location(changelog)?;
        let accessor = FileSystemResourceAccessor::new(&self.root);
        let registry = ChangeLogParserRegistry::with_defaults(self.config.clone());

        let parser = registry.parser_for(&location, &accessor).ok_or_else(|| {
            anyhow!(
                "No change log parser supports {}. Recognized extensions: {}",
                location,
                self.config.extensions.join(", ")
            )
        })?;

        parser
            .parse(&location, &accessor)
            .with_context(|| format!("Failed to parse change log: {}", location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_location_normalizes_separators() {
        let temp_dir = TempDir::new().unwrap();
        let context = CommandContext::load(temp_dir.path(), None, None).unwrap();

        let location = context
            .resolve_location(Path::new("./db/changelog.adoc"))
            .unwrap();
        assert_eq!(location, "db/changelog.adoc");

        let absolute = temp_dir.path().join("db").join("changelog.adoc");
        assert_eq!(context.resolve_location(&absolute).unwrap(), "db/changelog.adoc");
    }

    #[test]
    fn test_resolve_location_rejects_escape() {
        let temp_dir = TempDir::new().unwrap();
        let context = CommandContext::load(temp_dir.path(), None, None).unwrap();

        assert!(context.resolve_location(Path::new("../changelog.adoc")).is_err());
        assert!(context.resolve_location(Path::new(".")).is_err());
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let result = CommandContext::load(temp_dir.path(), Some(PathBuf::from("missing")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_file_is_picked_up() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(ParserConfig::DEFAULT_CONFIG_PATH),
            "max_include_depth: 4\n",
        )
        .unwrap();

        let context = CommandContext::load(temp_dir.path(), None, None).unwrap();
        assert_eq!(context.config.max_include_depth, 4);
    }
}
