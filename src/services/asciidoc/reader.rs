// プリプロセッサリーダー
//
// 行単位でドキュメントを読み出し、`include::target[attrs]` ディレクティブを
// 登録済みの IncludeProcessor に委譲して展開します。
// インクルードされた内容はフレームとしてスタックに積まれ、ディレクティブの位置に差し込まれます。
// 条件ディレクティブ（ifdef / ifndef / ifeval / endif）もここで評価し、
// 除外された行はブロックパーサーに渡しません。

use super::attributes::{parse_attribute_list, substitute_attribute_references, AttributeMap};
use super::LoadOptions;
use crate::core::config::SafeMode;
use crate::core::error::IncludeError;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::LazyLock;
use tracing::{debug, warn};

static INCLUDE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^include::([^\s\[](?:[^\[]*[^\s\[])?)\[(.*)\]$")
        .expect("include directive pattern is valid")
});

static CONDITIONAL_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ifdef|ifndef|ifeval|endif)::(\S*?)\[(.*)\]$")
        .expect("conditional directive pattern is valid")
});

static EVAL_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*([=!><]=|[><])\s*(.+)$").expect("eval expression pattern is valid")
});

/// インクルードディレクティブの拡張ポイント
///
/// パーサーはディレクティブを見つけるたびに `handles` を問い合わせ、
/// true が返れば `process` に展開を任せます。
pub trait IncludeProcessor {
    /// このターゲットを処理するかどうか
    fn handles(&self, target: &str) -> bool;

    /// ターゲットを解決し、`reader.push_include` で内容を差し込む
    fn process(
        &self,
        reader: &mut PreprocessorReader<'_>,
        target: &str,
        attributes: &AttributeMap,
    ) -> Result<(), IncludeError>;
}

/// 読み出された1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub text: String,
    /// 行の論理的な出所
    pub file: String,
    /// 行番号（1始まり）
    pub lineno: usize,
}

/// 展開されたインクルードの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRecord {
    pub target: String,
    pub attributes: AttributeMap,
}

#[derive(Debug)]
struct Frame {
    file: String,
    lines: VecDeque<String>,
    lineno: usize,
    depth: usize,
}

impl Frame {
    fn new(content: &str, file: &str, lineno: usize, depth: usize) -> Self {
        let lines = if content.is_empty() {
            VecDeque::new()
        } else {
            content.split('\n').map(|line| line.trim_end().to_string()).collect()
        };
        Self {
            file: file.to_string(),
            lines,
            lineno,
            depth,
        }
    }
}

/// 開いている条件ブロック
#[derive(Debug)]
struct Conditional {
    target: String,
    /// このブロックの内側を読み飛ばすかどうか（外側の状態を含む）
    skipping: bool,
}

/// ifeval の比較対象
#[derive(Debug, PartialEq)]
enum Operand {
    Number(f64),
    Text(String),
}

impl Operand {
    fn compare(&self, other: &Operand) -> Option<Ordering> {
        match (self, other) {
            (Operand::Number(a), Operand::Number(b)) => a.partial_cmp(b),
            (Operand::Text(a), Operand::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// インクルード展開付きの行リーダー
///
/// ドキュメント属性もここで保持します。ブロックパーサーが属性エントリを
/// 記録し、リーダーは以降の条件ディレクティブとインクルードターゲットの評価に使います。
pub struct PreprocessorReader<'p> {
    frames: Vec<Frame>,
    processor: &'p dyn IncludeProcessor,
    safe_mode: SafeMode,
    max_depth: usize,
    includes: Vec<IncludeRecord>,
    attributes: AttributeMap,
    conditionals: Vec<Conditional>,
}

impl<'p> PreprocessorReader<'p> {
    pub fn new(
        content: &str,
        origin: &str,
        processor: &'p dyn IncludeProcessor,
        options: &LoadOptions,
    ) -> Self {
        let mut attributes = AttributeMap::new();
        attributes.insert("asciidoctor", "");
        attributes.insert("safe-mode-name", options.safe_mode.to_string());
        attributes.insert(format!("safe-mode-{}", options.safe_mode), "");

        Self {
            frames: vec![Frame::new(content, origin, 0, 0)],
            processor,
            safe_mode: options.safe_mode,
            max_depth: options.max_include_depth,
            includes: Vec::new(),
            attributes,
            conditionals: Vec::new(),
        }
    }

    /// ドキュメント属性
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    fn skipping(&self) -> bool {
        self.conditionals.last().is_some_and(|open| open.skipping)
    }

    /// 現在のインクルード深さ（最上位ドキュメントは0）
    pub fn depth(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.depth)
    }

    /// インクルード内容を現在位置に差し込む
    ///
    /// `file` は以降の行の出所、`path` は記録されるターゲット、
    /// `lineno` は先頭行の直前の行番号（オフセット）です。
    /// `attributes` は解釈せずそのまま記録します。
    pub fn push_include(
        &mut self,
        content: &str,
        file: &str,
        path: &str,
        lineno: usize,
        attributes: AttributeMap,
    ) {
        let depth = self.depth() + 1;
        self.includes.push(IncludeRecord {
            target: path.to_string(),
            attributes,
        });
        if !content.is_empty() {
            self.frames.push(Frame::new(content, file, lineno, depth));
        }
    }

    /// 展開済みインクルードの記録を取り出す
    pub fn into_includes(self) -> Vec<IncludeRecord> {
        self.includes
    }

    /// 次の行をディレクティブ処理なしで読む
    ///
    /// コメントブロックの内容はこちらで読み飛ばします。
    pub fn read_raw_line(&mut self) -> Option<SourceLine> {
        loop {
            let frame = self.frames.last_mut()?;
            match frame.lines.pop_front() {
                Some(text) => {
                    frame.lineno += 1;
                    return Some(SourceLine {
                        text,
                        file: frame.file.clone(),
                        lineno: frame.lineno,
                    });
                }
                None => {
                    self.frames.pop();
                }
            }
        }
    }

    /// 次の行を読む（インクルードは展開され、条件ディレクティブは評価される）
    pub fn read_line(&mut self) -> Result<Option<SourceLine>, IncludeError> {
        loop {
            // 読み切ったフレームを先に取り除き、ディレクティブを含むフレームの深さを正しく保つ
            while self.frames.last().is_some_and(|frame| frame.lines.is_empty()) {
                self.frames.pop();
            }
            let depth = self.depth();
            let Some(line) = self.read_raw_line() else {
                return Ok(None);
            };

            let conditional = CONDITIONAL_DIRECTIVE
                .captures(&line.text)
                .map(|caps| (caps[1].to_string(), caps[2].to_string(), caps[3].to_string()));
            if let Some((keyword, target, text)) = conditional {
                if self.preprocess_conditional(&keyword, &target, &text, &line) {
                    continue;
                }
            }
            if self.skipping() {
                continue;
            }

            if let Some(escaped) = line.text.strip_prefix('\\') {
                if INCLUDE_DIRECTIVE.is_match(escaped) || CONDITIONAL_DIRECTIVE.is_match(escaped) {
                    let text = escaped.to_string();
                    return Ok(Some(SourceLine { text, ..line }));
                }
                return Ok(Some(line));
            }

            let Some((target, raw_attributes)) = parse_include_directive(&line.text) else {
                return Ok(Some(line));
            };
            let target = substitute_attribute_references(&target, &self.attributes);
            let raw_attributes = substitute_attribute_references(&raw_attributes, &self.attributes);

            if self.safe_mode == SafeMode::Secure {
                let text = format!("link:{}[role=include]", target);
                return Ok(Some(SourceLine { text, ..line }));
            }

            if depth >= self.max_depth {
                return Err(IncludeError::DepthExceeded {
                    target,
                    max_depth: self.max_depth,
                });
            }

            let processor = self.processor;
            if !processor.handles(&target) {
                warn!(
                    file = %line.file,
                    line = line.lineno,
                    target = %target,
                    "Unresolved include directive"
                );
                let text = format!(
                    "Unresolved directive in {} - include::{}[{}]",
                    line.file, target, raw_attributes
                );
                return Ok(Some(SourceLine { text, ..line }));
            }

            debug!(target = %target, depth = depth + 1, "Expanding include directive");
            let attributes = parse_attribute_list(&raw_attributes);
            processor.process(self, &target, &attributes)?;
        }
    }

    /// 条件ディレクティブを処理する
    ///
    /// 行を消費した場合は true を返します。ディレクティブとして不正な行は
    /// false を返し、通常の行として扱わせます。
    fn preprocess_conditional(&mut self, keyword: &str, target: &str, text: &str, line: &SourceLine) -> bool {
        if keyword == "endif" {
            if !text.is_empty() {
                warn!(file = %line.file, line = line.lineno, "Malformed preprocessor directive: text is not permitted on endif");
                return false;
            }
            match self.conditionals.last() {
                None => warn!(
                    file = %line.file,
                    line = line.lineno,
                    "Unmatched preprocessor directive: endif::{}[]",
                    target
                ),
                Some(open) if target.is_empty() || open.target == target => {
                    self.conditionals.pop();
                }
                Some(open) => warn!(
                    file = %line.file,
                    line = line.lineno,
                    "Mismatched preprocessor directive: endif::{}[], expected endif::{}[]",
                    target,
                    open.target
                ),
            }
            return true;
        }

        let skip = if self.skipping() {
            true
        } else {
            let holds = match keyword {
                "ifeval" if target.is_empty() => self.evaluate(text),
                "ifdef" | "ifndef" if !target.is_empty() => {
                    Some(self.defined(target) == (keyword == "ifdef"))
                }
                _ => None,
            };
            let Some(holds) = holds else {
                warn!(file = %line.file, line = line.lineno, "Malformed preprocessor directive: {}", line.text);
                return false;
            };
            !holds
        };

        if keyword != "ifeval" && !text.is_empty() {
            // 単一行形式: 条件を満たせば角括弧内のテキストを次の行として読み直す
            if !skip {
                self.unshift(text, line.lineno);
            }
            return true;
        }

        debug!(file = %line.file, line = line.lineno, target = %target, skip, "Entering conditional block");
        self.conditionals.push(Conditional {
            target: target.to_string(),
            skipping: skip,
        });
        true
    }

    /// ifdef の条件判定（`,` はいずれか、`+` はすべての属性が定義済み）
    fn defined(&self, target: &str) -> bool {
        match target.find([',', '+']) {
            Some(index) if target[index..].starts_with(',') => {
                target.split(',').any(|name| self.attributes.has(name))
            }
            Some(_) => target.split('+').all(|name| self.attributes.has(name)),
            None => self.attributes.has(target),
        }
    }

    /// ifeval の式 `左辺 演算子 右辺` を評価する
    fn evaluate(&self, expression: &str) -> Option<bool> {
        let caps = EVAL_EXPRESSION.captures(expression.trim())?;
        let lhs = self.resolve_operand(&caps[1]);
        let rhs = self.resolve_operand(&caps[3]);
        let ordering = lhs.compare(&rhs);

        Some(match &caps[2] {
            "==" => ordering == Some(Ordering::Equal),
            "!=" => ordering != Some(Ordering::Equal),
            "<" => ordering == Some(Ordering::Less),
            "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            ">" => ordering == Some(Ordering::Greater),
            ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            _ => return None,
        })
    }

    fn resolve_operand(&self, raw: &str) -> Operand {
        let raw = raw.trim();
        let quoted = raw.len() >= 2
            && ((raw.starts_with('"') && raw.ends_with('"'))
                || (raw.starts_with('\'') && raw.ends_with('\'')));
        if quoted {
            return Operand::Text(substitute_attribute_references(&raw[1..raw.len() - 1], &self.attributes));
        }

        let value = substitute_attribute_references(raw, &self.attributes);
        match value.trim().parse::<f64>() {
            Ok(number) => Operand::Number(number),
            Err(_) => Operand::Text(value),
        }
    }

    /// 行を現在のフレームの先頭に戻す
    fn unshift(&mut self, text: &str, lineno: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.lines.push_front(text.to_string());
            frame.lineno = lineno - 1;
        }
    }
}

fn parse_include_directive(text: &str) -> Option<(String, String)> {
    let caps = INCLUDE_DIRECTIVE.captures(text)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}
