// adoc-changelog ライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: ドメインモデル（チェンジログ、エラー型、設定）
// - adapters: チェンジログリソースへのアクセスを抽象化
// - services: AsciiDoc 解析、インクルード解決、コードリスティング抽出

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;

pub use crate::adapters::resource_accessor::{
    FileSystemResourceAccessor, InMemoryResourceAccessor, ResourceAccessor,
};
pub use crate::core::changelog::{ChangeLog, ChangeSet, RawSqlChange};
pub use crate::core::config::{ParserConfig, SafeMode};
pub use crate::core::error::{ChangeLogParseError, IncludeError, ValidationError};
pub use crate::services::changelog_parser::AsciidocChangeLogParser;
pub use crate::services::parser_registry::ChangeLogParserRegistry;
pub use crate::services::traits::ChangeLogParser;
