// validateコマンドハンドラーのテスト

use adoc_changelog::cli::commands::validate::{ValidateCommand, ValidateCommandHandler};
use adoc_changelog::cli::OutputFormat;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// テスト用のプロジェクトディレクトリを作成
fn setup_test_project(changelog: &str) -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let project_path = temp_dir.path().to_path_buf();

    fs::create_dir_all(project_path.join("db"))?;
    fs::write(project_path.join("db/changelog.adoc"), changelog)?;

    Ok((temp_dir, project_path))
}

fn command(project_path: &Path, format: OutputFormat) -> ValidateCommand {
    ValidateCommand {
        project_path: project_path.to_path_buf(),
        config_path: None,
        changelog: PathBuf::from("db/changelog.adoc"),
        root: None,
        format,
    }
}

#[cfg(test)]
mod validate_command_tests {
    use super::*;

    /// 正常なチェンジログの検証が成功することを確認
    #[test]
    fn test_validate_valid_changelog() {
        let (_temp_dir, project_path) = setup_test_project(
            "[source,sql,id=1,author=alice]\n----\nSELECT 1;\n----\n\n[source,sql,id=2,author=alice]\n----\nSELECT 2;\n----\n",
        )
        .unwrap();

        let output = ValidateCommandHandler::new()
            .execute(&command(&project_path, OutputFormat::Text))
            .unwrap();

        assert!(output.contains("db/changelog.adoc is valid"));
        assert!(output.contains("2 change sets"));
        assert!(output.contains("0 includes"));
    }

    /// JSON出力の確認
    #[test]
    fn test_validate_json_output() {
        let (_temp_dir, project_path) =
            setup_test_project("[source,sql,id=1,author=alice]\n----\nSELECT 1;\n----\n").unwrap();

        let output = ValidateCommandHandler::new()
            .execute(&command(&project_path, OutputFormat::Json))
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["location"], "db/changelog.adoc");
        assert_eq!(json["valid"], true);
        assert_eq!(json["changeSetCount"], 1);
        assert_eq!(json["includedResourceCount"], 0);
    }

    /// 不正な真偽値属性があると検証が失敗することを確認
    #[test]
    fn test_validate_invalid_boolean() {
        let (_temp_dir, project_path) = setup_test_project(
            "[source,sql,id=1,author=alice,runAlways=yes]\n----\nSELECT 1;\n----\n",
        )
        .unwrap();

        let err = ValidateCommandHandler::new()
            .execute(&command(&project_path, OutputFormat::Text))
            .unwrap_err();
        let message = format!("{:#}", err);

        assert!(message.contains("Failed to parse change log: db/changelog.adoc"));
        assert!(message.contains("runAlways attribute must be set to either \"true\" or \"false\", found: yes"));
        assert!(message.contains("(db/changelog.adoc:2)"));
    }

    /// 作業ディレクトリの設定ファイルが使われることを確認
    #[test]
    fn test_validate_uses_default_config_file() {
        let (_temp_dir, project_path) =
            setup_test_project("include::db/self.adoc[]\n").unwrap();
        fs::write(project_path.join("db/self.adoc"), "include::db/self.adoc[]\n").unwrap();
        fs::write(project_path.join(".adoc-changelog.yaml"), "max_include_depth: 3\n").unwrap();

        let err = ValidateCommandHandler::new()
            .execute(&command(&project_path, OutputFormat::Text))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("maximum include depth of 3 exceeded"));
    }

    /// secure モードではインクルードが解決されないことを確認
    #[test]
    fn test_validate_secure_mode_skips_includes() {
        let (_temp_dir, project_path) =
            setup_test_project("include::db/missing.adoc[]\n").unwrap();
        fs::write(project_path.join(".adoc-changelog.yaml"), "safe_mode: secure\n").unwrap();

        let output = ValidateCommandHandler::new()
            .execute(&command(&project_path, OutputFormat::Text))
            .unwrap();
        assert!(output.contains("0 change sets"));
    }
}
