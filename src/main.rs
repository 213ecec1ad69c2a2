use adoc_changelog::cli::commands::parse::{ParseCommand, ParseCommandHandler};
use adoc_changelog::cli::commands::validate::{ValidateCommand, ValidateCommandHandler};
use adoc_changelog::cli::{Cli, Commands};
use anyhow::Result;
use clap::Parser;
use colored::control as color_control;
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run_command(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// トレーシングサブスクライバーを初期化する
///
/// RUST_LOG が設定されていればそちらを優先します。
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // 作業ディレクトリを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Parse { changelog, root } => {
            let handler = ParseCommandHandler::new();
            let command = ParseCommand {
                project_path,
                config_path,
                changelog,
                root,
                format: cli.format,
            };
            handler.execute(&command)
        }

        Commands::Validate { changelog, root } => {
            let handler = ValidateCommandHandler::new();
            let command = ValidateCommand {
                project_path,
                config_path,
                changelog,
                root,
                format: cli.format,
            };
            handler.execute(&command)
        }
    }
}
