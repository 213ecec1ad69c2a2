// ブロックパーサー
//
// プリプロセッサリーダーから行を引き出し、ブロック構造のツリーを組み立てます。
// インライン書式は扱わず、属性リスト・タイトル・セクション・区切りブロック・段落のみを認識します。

use super::ast::{Block, BlockContext, Document, SourceLocation};
use super::attributes::{parse_attribute_list, substitute_attribute_references, AttributeMap};
use super::reader::{PreprocessorReader, SourceLine};
use crate::core::error::IncludeError;
use regex::Regex;
use std::sync::LazyLock;

static ATTRIBUTE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(!?)([A-Za-z0-9_][A-Za-z0-9_-]*)(!?):(?:\s+(.*))?$")
        .expect("attribute entry pattern is valid")
});

static SECTION_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(={1,6})\s+(\S.*)$").expect("section title pattern is valid")
});

/// 区切りブロックの種類
#[derive(Debug, Clone, PartialEq, Eq)]
enum Delimiter {
    Listing,
    Literal,
    Pass,
    Table,
    Fenced(String),
    Example,
    Sidebar,
    Quote,
    Open,
}

impl Delimiter {
    fn detect(text: &str) -> Option<Self> {
        if let Some(info) = text.strip_prefix("```") {
            return Some(Delimiter::Fenced(info.trim().to_string()));
        }
        if text == "--" {
            return Some(Delimiter::Open);
        }
        if text == "|===" {
            return Some(Delimiter::Table);
        }

        let first = text.chars().next()?;
        if text.len() < 4 || !text.chars().all(|c| c == first) {
            return None;
        }
        match first {
            '-' => Some(Delimiter::Listing),
            '.' => Some(Delimiter::Literal),
            '+' => Some(Delimiter::Pass),
            '=' => Some(Delimiter::Example),
            '*' => Some(Delimiter::Sidebar),
            '_' => Some(Delimiter::Quote),
            _ => None,
        }
    }

    /// 閉じ区切り行
    fn closing<'a>(&self, opening: &'a str) -> &'a str {
        match self {
            Delimiter::Fenced(_) => "```",
            _ => opening,
        }
    }
}

/// ブロックの前置メタデータ（属性リスト、アンカー、タイトル）
#[derive(Debug, Default)]
struct PendingMetadata {
    attributes: AttributeMap,
    title: Option<String>,
}

impl PendingMetadata {
    fn take(&mut self) -> PendingMetadata {
        std::mem::take(self)
    }
}

fn is_comment_delimiter(text: &str) -> bool {
    text.len() >= 4 && text.chars().all(|c| c == '/')
}

fn is_block_title(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next() == Some('.')
        && chars
            .next()
            .is_some_and(|c| !c.is_whitespace() && c != '.')
}

fn block_anchor(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("[[")?.strip_suffix("]]")?;
    let id = inner.split(',').next()?.trim();
    (!id.is_empty()).then_some(id)
}

fn attribute_list(text: &str) -> Option<&str> {
    if text.starts_with("[[") {
        return None;
    }
    text.strip_prefix('[')?.strip_suffix(']')
}

/// 段落を途中で打ち切る行（区切り行と属性リスト行）
fn terminates_paragraph(text: &str) -> bool {
    Delimiter::detect(text).is_some() || is_comment_delimiter(text) || attribute_list(text).is_some()
}

fn section_level(text: &str) -> Option<(usize, String)> {
    let caps = SECTION_TITLE.captures(text)?;
    Some((caps[1].len() - 1, caps[2].trim().to_string()))
}

/// 先頭・末尾の空行を取り除いて結合する
fn join_verbatim(lines: &[String]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

fn is_blank_char(b: &u8) -> bool {
    *b == b' ' || *b == b'\t'
}

/// 共通インデント（行頭の空白とタブ）を取り除く
fn dedent(lines: &[String]) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.bytes().take_while(is_blank_char).count())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            // ASCII の空白だけを数えるので、切り出し位置は常に文字境界になる
            let strip = l.bytes().take(indent).take_while(is_blank_char).count();
            l[strip..].to_string()
        })
        .collect()
}

pub(crate) struct BlockParser<'p> {
    reader: PreprocessorReader<'p>,
    peeked: Option<SourceLine>,
    title: Option<String>,
}

impl<'p> BlockParser<'p> {
    pub(crate) fn new(reader: PreprocessorReader<'p>) -> Self {
        Self {
            reader,
            peeked: None,
            title: None,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Document, IncludeError> {
        let blocks = self.parse_blocks(None, None)?;
        let attributes = self.reader.attributes().clone();
        Ok(Document::new(
            self.title,
            attributes,
            blocks,
            self.reader.into_includes(),
        ))
    }

    fn next_line(&mut self) -> Result<Option<SourceLine>, IncludeError> {
        match self.peeked.take() {
            Some(line) => Ok(Some(line)),
            None => self.reader.read_line(),
        }
    }

    fn peek_line(&mut self) -> Result<Option<&SourceLine>, IncludeError> {
        if self.peeked.is_none() {
            self.peeked = self.reader.read_line()?;
        }
        Ok(self.peeked.as_ref())
    }

    /// ブロック列を解析する
    ///
    /// `delimiter` が指定された場合はその行で終了し、
    /// `section` が指定された場合は同レベル以上のセクション見出しの手前で終了します。
    /// 閉じ区切り行を消費するのはセクション外の呼び出しだけです。
    fn parse_blocks(
        &mut self,
        delimiter: Option<&str>,
        section: Option<usize>,
    ) -> Result<Vec<Block>, IncludeError> {
        let mut blocks = Vec::new();
        let mut pending = PendingMetadata::default();

        loop {
            let (closes, ends_section) = match self.peek_line()? {
                None => break,
                Some(line) => (
                    delimiter == Some(line.text.as_str()),
                    section.is_some_and(|level| {
                        section_level(&line.text).is_some_and(|(next, _)| next <= level)
                    }),
                ),
            };
            // セクション内では閉じ区切り行を消費せず、外側の区切りブロックに返す
            if ends_section || (closes && section.is_some()) {
                break;
            }
            let Some(line) = self.next_line()? else {
                break;
            };
            if closes {
                break;
            }

            let text = line.text.as_str();
            if text.trim().is_empty() {
                continue;
            }

            if is_comment_delimiter(text) {
                let closing = text.to_string();
                while let Some(comment) = self.reader.read_raw_line() {
                    if comment.text == closing {
                        break;
                    }
                }
                continue;
            }

            if text.starts_with("//") {
                continue;
            }

            if let Some(id) = block_anchor(text) {
                pending.attributes.insert("id", id);
                continue;
            }

            if let Some(list) = attribute_list(text) {
                let list = substitute_attribute_references(list, self.reader.attributes());
                pending.attributes.merge(parse_attribute_list(&list));
                continue;
            }

            if is_block_title(text) {
                pending.title = Some(text[1..].trim().to_string());
                continue;
            }

            // リーダーが条件ディレクティブとインクルードの評価に使うため、リーダー側に記録する
            if let Some(caps) = ATTRIBUTE_ENTRY.captures(text) {
                let name = caps[2].to_string();
                let attributes = self.reader.attributes_mut();
                if !caps[1].is_empty() || !caps[3].is_empty() {
                    attributes.remove(&name);
                } else {
                    let value = caps.get(4).map_or("", |m| m.as_str()).trim();
                    let value = substitute_attribute_references(value, attributes);
                    attributes.insert(name, value);
                }
                continue;
            }

            if let Some((level, title)) = section_level(text) {
                if level == 0
                    && self.title.is_none()
                    && delimiter.is_none()
                    && section.is_none()
                    && blocks.is_empty()
                {
                    self.title = Some(title);
                    pending = PendingMetadata::default();
                    continue;
                }
                let metadata = pending.take();
                let children = self.parse_blocks(delimiter, Some(level))?;
                blocks.push(
                    Block::new(BlockContext::Section, metadata.attributes, location_of(&line))
                        .with_title(Some(title))
                        .with_level(level)
                        .with_blocks(children),
                );
                continue;
            }

            let metadata = pending.take();
            let block = match Delimiter::detect(text) {
                Some(kind) => self.parse_delimited(kind, &line, metadata)?,
                None => self.parse_paragraph(line, metadata, delimiter)?,
            };
            blocks.push(block);
        }

        Ok(blocks)
    }

    fn parse_delimited(
        &mut self,
        kind: Delimiter,
        opening: &SourceLine,
        metadata: PendingMetadata,
    ) -> Result<Block, IncludeError> {
        let location = location_of(opening);
        let PendingMetadata {
            mut attributes,
            title,
        } = metadata;

        // リテラルブロックとオープンブロックは source / listing スタイルでリスティングになる
        let verbatim_style = matches!(attributes.get("style"), Some("source") | Some("listing"));

        let context = match &kind {
            Delimiter::Example => Some(BlockContext::Example),
            Delimiter::Sidebar => Some(BlockContext::Sidebar),
            Delimiter::Quote => Some(BlockContext::Quote),
            Delimiter::Open if !verbatim_style => Some(BlockContext::Open),
            _ => None,
        };
        if let Some(context) = context {
            let children = self.parse_blocks(Some(opening.text.as_str()), None)?;
            return Ok(Block::new(context, attributes, location)
                .with_title(title)
                .with_blocks(children));
        }

        let closing = kind.closing(&opening.text).to_string();
        let mut lines = Vec::new();
        while let Some(line) = self.next_line()? {
            if line.text == closing {
                break;
            }
            lines.push(line.text);
        }
        let source = join_verbatim(&lines);

        let context = match &kind {
            Delimiter::Listing => {
                if !attributes.has("style") && attributes.has("2") {
                    attributes.insert("style", "source");
                }
                if !attributes.has("style") {
                    attributes.insert("style", "listing");
                }
                BlockContext::Listing
            }
            Delimiter::Fenced(language) => {
                attributes.insert("style", "source");
                if !language.is_empty() {
                    attributes.insert("language", language.as_str());
                }
                BlockContext::Listing
            }
            Delimiter::Literal | Delimiter::Open if verbatim_style => BlockContext::Listing,
            Delimiter::Literal => BlockContext::Literal,
            Delimiter::Pass => BlockContext::Pass,
            _ => BlockContext::Table,
        };
        apply_source_language(&mut attributes);

        Ok(Block::new(context, attributes, location)
            .with_title(title)
            .with_source(source))
    }

    fn parse_paragraph(
        &mut self,
        first: SourceLine,
        metadata: PendingMetadata,
        delimiter: Option<&str>,
    ) -> Result<Block, IncludeError> {
        let location = location_of(&first);
        let literal = first.text.starts_with(' ') || first.text.starts_with('\t');
        let mut lines = vec![first.text];

        loop {
            let stop = match self.peek_line()? {
                None => true,
                Some(line) => {
                    let text = line.text.as_str();
                    text.trim().is_empty()
                        || delimiter == Some(text)
                        || (!literal && terminates_paragraph(text))
                }
            };
            if stop {
                break;
            }
            let Some(line) = self.next_line()? else {
                break;
            };
            lines.push(line.text);
        }

        let PendingMetadata {
            mut attributes,
            title,
        } = metadata;
        let context = match attributes.get("style") {
            Some("source") | Some("listing") => BlockContext::Listing,
            Some("literal") => BlockContext::Literal,
            Some(_) => BlockContext::Paragraph,
            None if literal => BlockContext::Literal,
            None => BlockContext::Paragraph,
        };

        let source = match context {
            BlockContext::Literal | BlockContext::Listing => join_verbatim(&dedent(&lines)),
            _ => lines.join("\n"),
        };
        apply_source_language(&mut attributes);

        Ok(Block::new(context, attributes, location)
            .with_title(title)
            .with_source(source))
    }
}

/// source スタイルのブロックでは第2位置属性を言語として扱う
fn apply_source_language(attributes: &mut AttributeMap) {
    if attributes.get("style") != Some("source") || attributes.has("language") {
        return;
    }
    if let Some(language) = attributes.get("2").map(str::to_string) {
        attributes.insert("language", language);
    }
}

fn location_of(line: &SourceLine) -> SourceLocation {
    SourceLocation {
        file: line.file.clone(),
        line: line.lineno,
    }
}
