// Services Layer
// ドキュメント解析とチェンジログ組み立てを行うサービス層

pub mod asciidoc;
pub mod changelog_parser;
pub mod include_resolver;
pub mod listing_extractor;
pub mod parser_registry;
pub mod traits;
