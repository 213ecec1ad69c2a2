// AsciiDoc ドキュメントパーサー
//
// チェンジログ抽出に必要なブロック構造だけを解析する最小限のパーサー。
// インクルードの解決は IncludeProcessor 拡張に完全に委譲し、
// パーサー自身はファイルシステムにアクセスしません。

pub mod ast;
pub mod attributes;
mod parser;
pub mod reader;

pub use ast::{Block, BlockContext, Document, Selector, SourceLocation};
pub use attributes::{AttributeMap, BooleanAttribute};
pub use reader::{IncludeProcessor, IncludeRecord, PreprocessorReader, SourceLine};

use crate::core::config::{ParserConfig, SafeMode};
use crate::core::error::IncludeError;
use parser::BlockParser;

/// ドキュメント読み込みオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// セーフモード
    pub safe_mode: SafeMode,
    /// インクルードのネスト上限
    pub max_include_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            safe_mode: SafeMode::Safe,
            max_include_depth: 64,
        }
    }
}

impl From<&ParserConfig> for LoadOptions {
    fn from(config: &ParserConfig) -> Self {
        Self {
            safe_mode: config.safe_mode,
            max_include_depth: config.max_include_depth,
        }
    }
}

/// AsciiDoc パーサー
///
/// 不変の設定のみを保持するため、一度構築すれば複数の解析呼び出しで
/// （スレッドをまたいでも）共有できます。
#[derive(Debug, Clone, Default)]
pub struct AsciidocParser {
    options: LoadOptions,
}

impl AsciidocParser {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// テキストを解析してドキュメントツリーを返す
    ///
    /// # Arguments
    ///
    /// * `content` - ドキュメント全文
    /// * `origin` - 行の出所として記録する論理パス
    /// * `processor` - インクルードディレクティブの展開を担うプロセッサ
    ///
    /// # Errors
    ///
    /// インクルードの展開に失敗した場合
    pub fn load(
        &self,
        content: &str,
        origin: &str,
        processor: &dyn IncludeProcessor,
    ) -> Result<Document, IncludeError> {
        let reader = PreprocessorReader::new(content, origin, processor, &self.options);
        BlockParser::new(reader).parse()
    }
}
