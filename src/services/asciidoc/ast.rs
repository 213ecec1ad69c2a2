// ドキュメントツリー
//
// ブロックパーサーが生成する読み取り専用の構造ツリー。
// 構造クエリ（find_by）は文書順（深さ優先・先行順）で結果を返します。

use super::attributes::AttributeMap;
use super::reader::IncludeRecord;

/// ブロックの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockContext {
    Section,
    Paragraph,
    Listing,
    Literal,
    Pass,
    Table,
    Example,
    Sidebar,
    Quote,
    Open,
}

impl std::fmt::Display for BlockContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BlockContext::Section => "section",
            BlockContext::Paragraph => "paragraph",
            BlockContext::Listing => "listing",
            BlockContext::Literal => "literal",
            BlockContext::Pass => "pass",
            BlockContext::Table => "table",
            BlockContext::Example => "example",
            BlockContext::Sidebar => "sidebar",
            BlockContext::Quote => "quote",
            BlockContext::Open => "open",
        };
        write!(f, "{}", name)
    }
}

/// ブロックの開始位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// 論理パス（インクルードされた行はインクルードターゲット）
    pub file: String,
    /// 行番号（1始まり）
    pub line: usize,
}

/// 構造ノード
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    context: BlockContext,
    attributes: AttributeMap,
    title: Option<String>,
    level: Option<usize>,
    source: String,
    blocks: Vec<Block>,
    location: SourceLocation,
}

impl Block {
    pub(crate) fn new(context: BlockContext, attributes: AttributeMap, location: SourceLocation) -> Self {
        Self {
            context,
            attributes,
            title: None,
            level: None,
            source: String::new(),
            blocks: Vec::new(),
            location,
        }
    }

    pub(crate) fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub(crate) fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    pub(crate) fn with_source(mut self, source: String) -> Self {
        self.source = source;
        self
    }

    pub(crate) fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn context(&self) -> BlockContext {
        self.context
    }

    /// ブロックスタイル（第1位置属性）
    pub fn style(&self) -> Option<&str> {
        self.attributes.get("style")
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// セクションレベル（セクション以外は None）
    pub fn level(&self) -> Option<usize> {
        self.level
    }

    /// 逐語ブロックの生テキスト
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// 自身と子孫からセレクタに一致するブロックを文書順に収集
    pub fn find_by<'a>(&'a self, selector: &Selector, found: &mut Vec<&'a Block>) {
        if selector.matches(self) {
            found.push(self);
        }
        for child in &self.blocks {
            child.find_by(selector, found);
        }
    }
}

/// 構造クエリ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    context: Option<BlockContext>,
    style: Option<String>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(mut self, context: BlockContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn matches(&self, block: &Block) -> bool {
        if self.context.is_some_and(|context| context != block.context()) {
            return false;
        }
        match &self.style {
            Some(style) => block.style() == Some(style.as_str()),
            None => true,
        }
    }
}

/// 解析済みドキュメント
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    title: Option<String>,
    attributes: AttributeMap,
    blocks: Vec<Block>,
    includes: Vec<IncludeRecord>,
}

impl Document {
    pub(crate) fn new(
        title: Option<String>,
        attributes: AttributeMap,
        blocks: Vec<Block>,
        includes: Vec<IncludeRecord>,
    ) -> Self {
        Self {
            title,
            attributes,
            blocks,
            includes,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// ドキュメント属性（属性エントリで定義されたもの）
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// 展開されたインクルード（展開順）
    pub fn includes(&self) -> &[IncludeRecord] {
        &self.includes
    }

    /// セレクタに一致するブロックを文書順に返す
    pub fn find_by(&self, selector: &Selector) -> Vec<&Block> {
        let mut found = Vec::new();
        for block in &self.blocks {
            block.find_by(selector, &mut found);
        }
        found
    }
}
