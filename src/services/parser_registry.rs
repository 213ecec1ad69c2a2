// チェンジログパーサーレジストリ
//
// 登録済みパーサーの中から、対象チェンジログに対応し優先度が最も高いものを選びます。

use crate::adapters::resource_accessor::ResourceAccessor;
use crate::core::config::ParserConfig;
use crate::services::changelog_parser::AsciidocChangeLogParser;
use crate::services::traits::ChangeLogParser;

/// チェンジログパーサーレジストリ
#[derive(Default)]
pub struct ChangeLogParserRegistry {
    parsers: Vec<Box<dyn ChangeLogParser>>,
}

impl ChangeLogParserRegistry {
    /// 空のレジストリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// AsciiDoc パーサーを登録済みのレジストリを作成
    pub fn with_defaults(config: ParserConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AsciidocChangeLogParser::with_config(config)));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn ChangeLogParser>) {
        self.parsers.push(parser);
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// 対応するパーサーのうち優先度が最も高いものを返す
    ///
    /// 同じ優先度のパーサーが複数ある場合は先に登録されたものを返します。
    pub fn parser_for(
        &self,
        location: &str,
        accessor: &dyn ResourceAccessor,
    ) -> Option<&dyn ChangeLogParser> {
        let mut selected: Option<&dyn ChangeLogParser> = None;
        for parser in &self.parsers {
            if !parser.supports(location, accessor) {
                continue;
            }
            if selected.is_none_or(|current| parser.priority() > current.priority()) {
                selected = Some(parser.as_ref());
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::resource_accessor::InMemoryResourceAccessor;
    use crate::core::changelog::ChangeLog;
    use crate::core::error::ChangeLogParseError;

    struct FixedParser {
        priority: i32,
        name: &'static str,
    }

    impl ChangeLogParser for FixedParser {
        fn supports(&self, location: &str, _accessor: &dyn ResourceAccessor) -> bool {
            location.ends_with(".adoc")
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn parse(
            &self,
            _location: &str,
            _accessor: &dyn ResourceAccessor,
        ) -> Result<ChangeLog, ChangeLogParseError> {
            Ok(ChangeLog::new(self.name))
        }
    }

    #[test]
    fn test_highest_priority_wins() {
        let mut registry = ChangeLogParserRegistry::with_defaults(ParserConfig::default());
        registry.register(Box::new(FixedParser { priority: 5, name: "custom" }));
        registry.register(Box::new(FixedParser { priority: 5, name: "late" }));
        let accessor = InMemoryResourceAccessor::new();

        let parser = registry.parser_for("db/changelog.adoc", &accessor).unwrap();
        assert_eq!(parser.priority(), 5);
        let change_log = parser.parse("db/changelog.adoc", &accessor).unwrap();
        assert_eq!(change_log.physical_file_path(), "custom");
    }

    #[test]
    fn test_unsupported_location_has_no_parser() {
        let registry = ChangeLogParserRegistry::with_defaults(ParserConfig::default());
        let accessor = InMemoryResourceAccessor::new();

        assert_eq!(registry.len(), 1);
        assert!(registry.parser_for("db/changelog.yaml", &accessor).is_none());
        assert!(registry.parser_for("db/changelog.asciidoc", &accessor).is_some());
    }
}
