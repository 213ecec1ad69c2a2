// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// adoc-changelog - AsciiDoc Change Log CLI
///
/// Extract database change sets from source listings embedded in AsciiDoc documents.
#[derive(Parser, Debug)]
#[command(name = "adoc-changelog")]
#[command(author = "Adoc Changelog Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract database change sets from AsciiDoc documents")]
#[command(long_about = "adoc-changelog - AsciiDoc Change Log CLI

Treats an AsciiDoc document as a database change log.
Every source listing that declares `id` and `author` attributes becomes a change set.

adoc-changelog helps you:
  • Keep SQL change sets next to the prose that explains them
  • Split a change log across files with include directives
  • Check change set metadata before handing the log to a migration tool

Recognized extensions: .adoc, .asciidoc")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Annotate a listing:     [source,sql,id=1,author=alice]
  2. Inspect the change log:  adoc-changelog parse db/changelog.adoc
  3. Check it in CI:          adoc-changelog validate db/changelog.adoc

For detailed help on each command, use: adoc-changelog <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a change log and print its change sets
    ///
    /// Resolves include directives relative to the root directory and lists
    /// every change set in document order.
    ///
    /// EXAMPLES:
    ///   # Print a text summary
    ///   adoc-changelog parse db/changelog.adoc
    ///
    ///   # Print JSON for another tool
    ///   adoc-changelog parse db/changelog.adoc --format json
    ///
    ///   # Resolve resources from another directory
    ///   adoc-changelog parse changelog.adoc --root docs/db
    Parse {
        /// Change log path, relative to the root directory
        #[arg(value_name = "CHANGELOG")]
        changelog: PathBuf,

        /// Root directory that change log resources are resolved against
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,
    },

    /// Validate a change log
    ///
    /// Parses the change log and reports the number of change sets.
    /// Exits with a non-zero status when the change log cannot be parsed.
    ///
    /// EXAMPLES:
    ///   # Validate a change log
    ///   adoc-changelog validate db/changelog.adoc
    ///
    ///   # Validate with a custom configuration
    ///   adoc-changelog validate db/changelog.adoc --config ci/adoc-changelog.yaml
    Validate {
        /// Change log path, relative to the root directory
        #[arg(value_name = "CHANGELOG")]
        changelog: PathBuf,

        /// Root directory that change log resources are resolved against
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
}
