// AsciiDoc チェンジログパーサー
//
// リソースアクセサからドキュメントを読み込み、インクルードを解決しながら解析し、
// 抽出したチェンジセットを文書順に ChangeLog へ組み立てます。

use crate::adapters::resource_accessor::{read_resource, ResourceAccessor};
use crate::core::changelog::ChangeLog;
use crate::core::config::ParserConfig;
use crate::core::error::ChangeLogParseError;
use crate::services::asciidoc::{AsciidocParser, LoadOptions};
use crate::services::include_resolver::ResourceIncludeProcessor;
use crate::services::listing_extractor::ListingExtractor;
use crate::services::traits::ChangeLogParser;
use tracing::debug;

/// AsciiDoc チェンジログパーサー
///
/// 構築は一度だけ行い、複数の解析呼び出しで再利用します。
/// 呼び出しごとの状態（アクセサ）は `parse` の引数として受け取り、
/// インクルードプロセッサもその呼び出しの中だけで生成します。
#[derive(Debug, Clone)]
pub struct AsciidocChangeLogParser {
    config: ParserConfig,
    parser: AsciidocParser,
    extractor: ListingExtractor,
}

impl AsciidocChangeLogParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        let parser = AsciidocParser::new(LoadOptions::from(&config));
        Self {
            config,
            parser,
            extractor: ListingExtractor::new(),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

impl Default for AsciidocChangeLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeLogParser for AsciidocChangeLogParser {
    fn supports(&self, location: &str, _accessor: &dyn ResourceAccessor) -> bool {
        self.config.matches_extension(location)
    }

    fn priority(&self) -> i32 {
        self.config.priority
    }

    fn parse(
        &self,
        location: &str,
        accessor: &dyn ResourceAccessor,
    ) -> Result<ChangeLog, ChangeLogParseError> {
        debug!(location = %location, safe_mode = %self.config.safe_mode, "Parsing change log");

        let content = read_resource(accessor, location)
            .map_err(|source| ChangeLogParseError::Io {
                location: location.to_string(),
                source,
            })?
            .ok_or_else(|| ChangeLogParseError::ResourceNotFound {
                location: location.to_string(),
            })?;

        let processor = ResourceIncludeProcessor::new(accessor);
        let document = self
            .parser
            .load(&content, location, &processor)
            .map_err(|e| ChangeLogParseError::from_include(location, e))?;

        let change_sets = self
            .extractor
            .extract(&document, location)
            .map_err(|source| ChangeLogParseError::Validation {
                location: location.to_string(),
                source,
            })?;

        let mut change_log = ChangeLog::new(location);
        for change_set in change_sets {
            change_log.add_change_set(change_set);
        }
        change_log.set_included_resources(
            document
                .includes()
                .iter()
                .map(|include| include.target.clone())
                .collect(),
        );

        debug!(
            location = %location,
            change_sets = change_log.len(),
            includes = change_log.included_resources().len(),
            "Parsed change log"
        );
        Ok(change_log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::resource_accessor::InMemoryResourceAccessor;

    #[test]
    fn test_supports_recognized_extensions() {
        let parser = AsciidocChangeLogParser::new();
        let accessor = InMemoryResourceAccessor::new();

        assert!(parser.supports("db/changelog.adoc", &accessor));
        assert!(parser.supports("db/changelog.asciidoc", &accessor));
        assert!(!parser.supports("db/changelog.xml", &accessor));
        assert!(!parser.supports("db/changelog.Adoc", &accessor));
        assert_eq!(parser.priority(), 1);
    }

    #[test]
    fn test_parser_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AsciidocChangeLogParser>();
    }

    #[test]
    fn test_parser_is_reusable_across_accessors() {
        let parser = AsciidocChangeLogParser::new();
        let first = InMemoryResourceAccessor::new()
            .with_resource("c.adoc", "include::part.adoc[]")
            .with_resource("part.adoc", "[source,sql,id=1,author=a]\n----\nFIRST\n----");
        let second = InMemoryResourceAccessor::new()
            .with_resource("c.adoc", "include::part.adoc[]")
            .with_resource("part.adoc", "[source,sql,id=1,author=a]\n----\nSECOND\n----");

        let a = parser.parse("c.adoc", &first).unwrap();
        let b = parser.parse("c.adoc", &second).unwrap();

        assert_eq!(a.change_sets()[0].change().sql(), "FIRST");
        assert_eq!(b.change_sets()[0].change().sql(), "SECOND");
        assert_eq!(a.included_resources(), ["part.adoc".to_string()]);
    }

    #[test]
    fn test_secure_mode_does_not_resolve_includes() {
        let config = ParserConfig {
            safe_mode: crate::core::config::SafeMode::Secure,
            ..ParserConfig::default()
        };
        let parser = AsciidocChangeLogParser::with_config(config);
        let accessor = InMemoryResourceAccessor::new().with_resource("c.adoc", "include::missing.adoc[]");

        let change_log = parser.parse("c.adoc", &accessor).unwrap();
        assert!(change_log.is_empty());
        assert!(change_log.included_resources().is_empty());
    }
}
