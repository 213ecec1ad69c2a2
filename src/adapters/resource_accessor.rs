// リソースアクセサ
//
// チェンジログ本体とインクルード対象を論理パスで取得するための抽象化。
// パスの解釈はアクセサ実装に任せ、呼び出し側は受け取ったパスをそのまま渡します。

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// 論理パスからバイトストリームを開くためのトレイト
pub trait ResourceAccessor {
    /// リソースを開く
    ///
    /// リソースが存在しない場合は `Ok(None)` を返します。
    /// 存在するが開けない場合は `Err` を返します。
    fn open(&self, location: &str) -> io::Result<Option<Box<dyn Read + '_>>>;
}

/// リソース全体を文字列として読み込む
///
/// 改行コードは LF に正規化し、末尾の改行を一つ取り除きます。
/// ストリームは読み込み完了後すぐに解放されます。
pub fn read_resource(accessor: &dyn ResourceAccessor, location: &str) -> io::Result<Option<String>> {
    let Some(mut stream) = accessor.open(location)? else {
        return Ok(None);
    };

    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    drop(stream);

    let content = String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(normalize_line_endings(&content)))
}

/// 改行コードを LF に統一する
pub fn normalize_line_endings(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if normalized.ends_with('\n') {
        normalized.pop();
    }
    normalized
}

/// ルートディレクトリ配下のファイルを提供するアクセサ
///
/// 絶対パスや `..` によるルート外へのアクセスは拒否します。
#[derive(Debug, Clone)]
pub struct FileSystemResourceAccessor {
    root: PathBuf,
}

impl FileSystemResourceAccessor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, location: &str) -> io::Result<PathBuf> {
        let relative = Path::new(location);
        let mut resolved = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        format!("resource path escapes the accessor root: {}", location),
                    ));
                }
            }
        }

        Ok(resolved)
    }
}

impl ResourceAccessor for FileSystemResourceAccessor {
    fn open(&self, location: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        let path = self.resolve(location)?;
        if !path.is_file() {
            return Ok(None);
        }

        match File::open(&path) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// メモリ上のリソースを提供するアクセサ
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceAccessor {
    resources: HashMap<String, Vec<u8>>,
}

impl InMemoryResourceAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// リソースを追加（ビルダー形式）
    pub fn with_resource(mut self, location: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(location, content);
        self
    }

    /// リソースを追加
    pub fn insert(&mut self, location: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.resources.insert(location.into(), content.into());
    }
}

impl ResourceAccessor for InMemoryResourceAccessor {
    fn open(&self, location: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        Ok(self
            .resources
            .get(location)
            .map(|bytes| Box::new(Cursor::new(bytes.as_slice())) as Box<dyn Read + '_>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc");
        assert_eq!(normalize_line_endings("a\n\n"), "a\n");
        assert_eq!(normalize_line_endings(""), "");
    }

    #[test]
    fn test_in_memory_read_resource() {
        let accessor = InMemoryResourceAccessor::new().with_resource("db/a.adoc", "line1\r\nline2\r\n");

        let content = read_resource(&accessor, "db/a.adoc").unwrap();
        assert_eq!(content.as_deref(), Some("line1\nline2"));
        assert!(read_resource(&accessor, "db/missing.adoc").unwrap().is_none());
    }

    #[test]
    fn test_read_resource_rejects_invalid_utf8() {
        let accessor = InMemoryResourceAccessor::new().with_resource("bin.adoc", vec![0xff, 0xfe, 0x00]);

        let err = read_resource(&accessor, "bin.adoc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_file_system_accessor_reads_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("db")).unwrap();
        fs::write(temp_dir.path().join("db/changelog.adoc"), "= Title\n").unwrap();

        let accessor = FileSystemResourceAccessor::new(temp_dir.path());
        let content = read_resource(&accessor, "db/changelog.adoc").unwrap();
        assert_eq!(content.as_deref(), Some("= Title"));
        assert!(read_resource(&accessor, "./db/changelog.adoc").unwrap().is_some());
    }

    #[test]
    fn test_file_system_accessor_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let accessor = FileSystemResourceAccessor::new(temp_dir.path());

        assert!(accessor.open("nothing.adoc").unwrap().is_none());
        // ディレクトリはリソースとして扱わない
        assert!(accessor.open(".").unwrap().is_none());
    }

    #[test]
    fn test_file_system_accessor_rejects_escape() {
        let temp_dir = TempDir::new().unwrap();
        let accessor = FileSystemResourceAccessor::new(temp_dir.path());

        let err = accessor.open("../outside.adoc").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        let err = accessor.open("/etc/passwd").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
