/// ファイルシステムリソースアクセサのテスト
///
/// このテストは、ルートディレクトリ配下のファイルだけがチェンジログの
/// リソースとして解決されることを確認します。

#[cfg(test)]
mod file_system_accessor_tests {
    use adoc_changelog::{
        AsciidocChangeLogParser, ChangeLogParser, FileSystemResourceAccessor, ResourceAccessor,
    };
    use std::fs;
    use std::io::{ErrorKind, Read};
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("root/db")).unwrap();
        fs::write(temp_dir.path().join("secret.adoc"), "[source,sql,id=x,author=y]\n----\nDROP TABLE t;\n----\n").unwrap();
        temp_dir
    }

    /// ルート配下のファイルを読み込めることを確認
    #[test]
    fn test_open_existing_resource() {
        let temp_dir = setup();
        fs::write(temp_dir.path().join("root/db/a.sql"), "SELECT 1;").unwrap();
        let accessor = FileSystemResourceAccessor::new(temp_dir.path().join("root"));

        let mut content = String::new();
        accessor
            .open("db/a.sql")
            .unwrap()
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "SELECT 1;");
    }

    /// 存在しないファイルとディレクトリは見つからない扱いになることを確認
    #[test]
    fn test_missing_resource_is_none() {
        let temp_dir = setup();
        let accessor = FileSystemResourceAccessor::new(temp_dir.path().join("root"));

        assert!(accessor.open("db/missing.adoc").unwrap().is_none());
        assert!(accessor.open("db").unwrap().is_none());
    }

    /// ルート外へのアクセスが拒否されることを確認
    #[test]
    fn test_escape_is_denied() {
        let temp_dir = setup();
        let accessor = FileSystemResourceAccessor::new(temp_dir.path().join("root"));

        let err = accessor.open("../secret.adoc").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let absolute = temp_dir.path().join("secret.adoc");
        let err = accessor.open(&absolute.to_string_lossy()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    /// ルート外を指すインクルードは解析エラーになることを確認
    #[test]
    fn test_escaping_include_fails_parse() {
        let temp_dir = setup();
        fs::write(temp_dir.path().join("root/db/changelog.adoc"), "include::../secret.adoc[]\n").unwrap();
        let accessor = FileSystemResourceAccessor::new(temp_dir.path().join("root"));

        let err = AsciidocChangeLogParser::new()
            .parse("db/changelog.adoc", &accessor)
            .unwrap_err();
        assert!(err.is_io());
        assert!(!err.is_include_not_found());
    }
}
