// parseコマンドハンドラー
//
// チェンジログを解析し、チェンジセットの一覧を表示します。
// - 設定ファイルの読み込みとパーサーの選択
// - ルートディレクトリ配下でのインクルード解決
// - テキストまたはJSONでの出力

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::changelog::{ChangeLog, ChangeSet};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::debug;

/// parseコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutput {
    /// チェンジログの論理パス
    pub location: String,
    pub change_sets: Vec<ChangeSetEntry>,
    /// 展開されたインクルードターゲット
    pub included_resources: Vec<String>,
    /// テキスト出力メッセージ
    #[serde(skip)]
    pub text_message: String,
}

/// チェンジセットエントリ
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSetEntry {
    pub id: String,
    pub author: String,
    pub identifier: String,
    pub run_always: bool,
    pub run_on_change: bool,
    pub run_in_transaction: bool,
    pub contexts: String,
    pub dbms: String,
    pub checksum: String,
    pub sql: String,
}

impl From<&ChangeSet> for ChangeSetEntry {
    fn from(change_set: &ChangeSet) -> Self {
        Self {
            id: change_set.id().to_string(),
            author: change_set.author().to_string(),
            identifier: change_set.identifier(),
            run_always: change_set.run_always(),
            run_on_change: change_set.run_on_change(),
            run_in_transaction: change_set.run_in_transaction(),
            contexts: change_set.contexts().to_string(),
            dbms: change_set.dbms().to_string(),
            checksum: change_set.change().checksum(),
            sql: change_set.change().sql().to_string(),
        }
    }
}

impl CommandOutput for ParseOutput {
    fn to_text(&self) -> String {
        self.text_message.clone()
    }
}

/// parseコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ParseCommand {
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

/// parseコマンドハンドラー
#[derive(Debug, Default)]
pub struct ParseCommandHandler {}

impl ParseCommandHandler {
    /// 新しいParseCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// parseコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - parseコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時はチェンジセットの一覧、失敗時はエラーメッセージ
    pub fn execute(&self, command: &ParseCommand) -> Result<String> {
        let context = CommandContext::load(
            &command.project_path,
            command.root.clone(),
            command.config_path.as_deref(),
        )?;

        let change_log = context.parse_change_log(&command.changelog)?;
        debug!(
            location = %change_log.physical_file_path(),
            count = change_log.len(),
            "Parsed change log for display"
        );

        let output = ParseOutput {
            location: change_log.physical_file_path().to_string(),
            change_sets: change_log.change_sets().iter().map(ChangeSetEntry::from).collect(),
            included_resources: change_log.included_resources().to_vec(),
            text_message: self.format_change_log(&change_log),
        };
        render_output(&output, &command.format)
    }

    /// チェンジログをテキスト形式で整形
    fn format_change_log(&self, change_log: &ChangeLog) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "{} {}",
            "Change log:".bold(),
            change_log.physical_file_path()
        );

        if change_log.is_empty() {
            let _ = write!(output, "{}", "No change sets found.".yellow());
            return output;
        }

        let _ = writeln!(output, "{} {}", "Change sets:".bold(), change_log.len());
        for (index, change_set) in change_log.change_sets().iter().enumerate() {
            let _ = writeln!(output);
            let _ = writeln!(
                output,
                "  {}. {}",
                index + 1,
                change_set.identifier().cyan()
            );
            let _ = writeln!(
                output,
                "     runOnChange: {}, runAlways: {}, runInTransaction: {}",
                change_set.run_on_change(),
                change_set.run_always(),
                change_set.run_in_transaction()
            );
            if !change_set.contexts().is_empty() {
                let _ = writeln!(output, "     contexts: {}", change_set.contexts());
            }
            if !change_set.dbms().is_empty() {
                let _ = writeln!(output, "     dbms: {}", change_set.dbms());
            }
            let _ = writeln!(
                output,
                "     checksum: {}",
                change_set.change().checksum().dimmed()
            );
            for line in change_set.change().sql().lines() {
                let _ = writeln!(output, "     {} {}", "|".dimmed(), line);
            }
        }

        if !change_log.included_resources().is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "{}", "Included resources:".bold());
            for resource in change_log.included_resources() {
                let _ = writeln!(output, "  - {}", resource);
            }
        }

        output.trim_end().to_string()
    }
}
