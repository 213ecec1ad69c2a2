// インクルードリゾルバー
//
// ドキュメントパーサーのインクルード拡張ポイントに差し込まれ、
// すべてのインクルードターゲットをリソースアクセサ経由で解決します。
// 解析呼び出しごとに構築し、そのときのアクセサを借用するだけで状態は持ちません。

use crate::adapters::resource_accessor::{read_resource, ResourceAccessor};
use crate::core::error::IncludeError;
use crate::services::asciidoc::{AttributeMap, IncludeProcessor, PreprocessorReader};
use tracing::debug;

/// リソースアクセサでインクルードを解決するプロセッサ
pub struct ResourceIncludeProcessor<'a> {
    accessor: &'a dyn ResourceAccessor,
}

impl<'a> ResourceIncludeProcessor<'a> {
    pub fn new(accessor: &'a dyn ResourceAccessor) -> Self {
        Self { accessor }
    }
}

impl IncludeProcessor for ResourceIncludeProcessor<'_> {
    /// すべてのターゲットを引き受ける
    fn handles(&self, _target: &str) -> bool {
        true
    }

    fn process(
        &self,
        reader: &mut PreprocessorReader<'_>,
        target: &str,
        attributes: &AttributeMap,
    ) -> Result<(), IncludeError> {
        let content = read_resource(self.accessor, target)
            .map_err(|source| IncludeError::Io {
                target: target.to_string(),
                source,
            })?
            .ok_or_else(|| IncludeError::NotFound {
                target: target.to_string(),
            })?;

        debug!(target = %target, bytes = content.len(), "Resolved include through resource accessor");
        reader.push_include(&content, target, target, 0, attributes.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::resource_accessor::InMemoryResourceAccessor;
    use crate::services::asciidoc::{AsciidocParser, BlockContext, Selector};
    use std::io::{self, Read};

    struct FailingAccessor;

    impl ResourceAccessor for FailingAccessor {
        fn open(&self, _location: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_nested_includes_are_resolved() {
        let accessor = InMemoryResourceAccessor::new()
            .with_resource("a.adoc", "include::b.adoc[]\n[source,sql]\n----\nA\n----\n")
            .with_resource("b.adoc", "[source,sql]\r\n----\r\nB\r\n----\r\n");
        let processor = ResourceIncludeProcessor::new(&accessor);

        let document = AsciidocParser::default()
            .load("include::a.adoc[]", "main.adoc", &processor)
            .unwrap();

        let listings = document.find_by(&Selector::new().context(BlockContext::Listing).style("source"));
        let sources: Vec<&str> = listings.iter().map(|b| b.source()).collect();
        assert_eq!(sources, vec!["B", "A"]);
        assert_eq!(listings[0].location().file, "b.adoc");

        let targets: Vec<&str> = document.includes().iter().map(|i| i.target.as_str()).collect();
        assert_eq!(targets, vec!["a.adoc", "b.adoc"]);
    }

    #[test]
    fn test_missing_include_is_not_found() {
        let accessor = InMemoryResourceAccessor::new();
        let processor = ResourceIncludeProcessor::new(&accessor);

        let err = AsciidocParser::default()
            .load("include::missing.adoc[]", "main.adoc", &processor)
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.target(), "missing.adoc");
        assert_eq!(err.to_string(), "could not find change log resource to include missing.adoc");
    }

    #[test]
    fn test_unreadable_include_is_io_error() {
        let accessor = FailingAccessor;
        let processor = ResourceIncludeProcessor::new(&accessor);

        let err = AsciidocParser::default()
            .load("include::broken.adoc[]", "main.adoc", &processor)
            .unwrap_err();

        assert!(err.is_io());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_include_target_with_attribute_reference() {
        let accessor = InMemoryResourceAccessor::new().with_resource("db/sql/x.sql", "SELECT 1;\n");
        let processor = ResourceIncludeProcessor::new(&accessor);

        let document = AsciidocParser::default()
            .load(":sqldir: db/sql\n\n[source,sql]\n----\ninclude::{sqldir}/x.sql[]\n----", "main.adoc", &processor)
            .unwrap();

        let listings = document.find_by(&Selector::new().context(BlockContext::Listing));
        assert_eq!(listings[0].source(), "SELECT 1;");
        assert_eq!(document.includes()[0].target, "db/sql/x.sql");
    }

    #[test]
    fn test_include_inside_listing_is_expanded() {
        let accessor = InMemoryResourceAccessor::new().with_resource("sql/create.sql", "CREATE TABLE t (id INT);\n");
        let processor = ResourceIncludeProcessor::new(&accessor);

        let document = AsciidocParser::default()
            .load("[source,sql]\n----\ninclude::sql/create.sql[]\n----", "main.adoc", &processor)
            .unwrap();

        let listings = document.find_by(&Selector::new().context(BlockContext::Listing));
        assert_eq!(listings[0].source(), "CREATE TABLE t (id INT);");
    }
}
