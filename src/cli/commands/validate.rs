// validateコマンドハンドラー
//
// チェンジログの検証機能を実装します。
// - チェンジログの解析（インクルード解決と属性検証を含む）
// - 検証結果のサマリー表示

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// validateコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOutput {
    pub location: String,
    pub valid: bool,
    pub change_set_count: usize,
    pub included_resource_count: usize,
    #[serde(skip)]
    pub text_message: String,
}

impl CommandOutput for ValidateOutput {
    fn to_text(&self) -> String {
        self.text_message.clone()
    }
}

/// validateコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ValidateCommand {
    /// 作業ディレクトリ（デフォルト設定ファイルの探索場所）
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// チェンジログのパス
    pub changelog: PathBuf,
    /// リソース解決のルートディレクトリ
    pub root: Option<PathBuf>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// validateコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct ValidateCommandHandler {}

impl ValidateCommandHandler {
    /// 新しいValidateCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// validateコマンドを実行
    ///
    /// 解析に失敗した場合はエラーを返し、プロセスは非ゼロで終了します。
    pub fn execute(&self, command: &ValidateCommand) -> Result<String> {
        let context = CommandContext::load(
            &command.project_path,
            command.root.clone(),
            command.config_path.as_deref(),
        )?;

        let change_log = context.parse_change_log(&command.changelog)?;

        let text_message = format!(
            "{} {} is valid ({} change set{}, {} include{})",
            "✓".green(),
            change_log.physical_file_path(),
            change_log.len(),
            if change_log.len() == 1 { "" } else { "s" },
            change_log.included_resources().len(),
            if change_log.included_resources().len() == 1 { "" } else { "s" },
        );

        let output = ValidateOutput {
            location: change_log.physical_file_path().to_string(),
            valid: true,
            change_set_count: change_log.len(),
            included_resource_count: change_log.included_resources().len(),
            text_message,
        };
        render_output(&output, &command.format)
    }
}
