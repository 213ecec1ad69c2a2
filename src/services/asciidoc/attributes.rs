// ブロック属性
//
// 属性リスト `[source,sql,id=1,author="alice"]` の解析と、
// 文字列キーの属性マップに対する型付きアクセサを提供します。

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static ATTRIBUTE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\?\{([A-Za-z0-9_][A-Za-z0-9_-]*)\}").expect("attribute reference pattern is valid")
});

/// 真偽値属性の読み取り結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BooleanAttribute {
    /// "true" / "false"（大文字小文字を区別しない）
    Value(bool),
    /// 属性が指定されていない
    Missing,
    /// 真偽値として解釈できない値
    Invalid(String),
}

impl BooleanAttribute {
    /// 未指定ならデフォルト値を使い、不正値なら元の文字列を返す
    pub fn or_default(self, default: bool) -> Result<bool, String> {
        match self {
            BooleanAttribute::Value(value) => Ok(value),
            BooleanAttribute::Missing => Ok(default),
            BooleanAttribute::Invalid(raw) => Err(raw),
        }
    }
}

/// 値が大文字小文字を区別せず "true" と等しいか
pub fn is_case_insensitive_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// 値が大文字小文字を区別せず "false" と等しいか
pub fn is_case_insensitive_false(value: &str) -> bool {
    value.eq_ignore_ascii_case("false")
}

/// 文字列キーの属性マップ
///
/// 位置属性は "1", "2", ... のキーで保持し、第1位置属性はスタイルとして
/// "style" キーにも格納します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: BTreeMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// 属性値を取得し、存在しなければデフォルト値を返す
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 真偽値属性として読み取る
    pub fn boolean(&self, name: &str) -> BooleanAttribute {
        match self.get(name) {
            None => BooleanAttribute::Missing,
            Some(value) if is_case_insensitive_true(value) => BooleanAttribute::Value(true),
            Some(value) if is_case_insensitive_false(value) => BooleanAttribute::Value(false),
            Some(value) => BooleanAttribute::Invalid(value.to_string()),
        }
    }

    /// 別のマップの内容で上書きマージする
    pub fn merge(&mut self, other: AttributeMap) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 属性参照 `{name}` を置換する
///
/// 未定義の参照はそのまま残し、`\{name}` はエスケープとして `{name}` に変換します。
pub fn substitute_attribute_references(text: &str, attributes: &AttributeMap) -> String {
    ATTRIBUTE_REFERENCE
        .replace_all(text, |caps: &Captures<'_>| {
            let whole = &caps[0];
            if let Some(escaped) = whole.strip_prefix('\\') {
                return escaped.to_string();
            }
            match attributes.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => whole.to_string(),
            }
        })
        .into_owned()
}

/// 属性リスト（角括弧の内側）を解析する
pub fn parse_attribute_list(text: &str) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    let mut scanner = Scanner::new(text);
    let mut index = 0;

    while !scanner.at_end() {
        index += 1;
        match scanner.next_entry() {
            Entry::Named { name, value } => attributes.insert(name, value),
            Entry::Positional(value) if value.is_empty() => {}
            Entry::Positional(value) if index == 1 => apply_first_positional(&mut attributes, &value),
            Entry::Positional(value) => attributes.insert(index.to_string(), value),
        }
    }

    attributes
}

/// 第1位置属性のスタイルと省略記法（#id, .role, %option）を展開する
fn apply_first_positional(attributes: &mut AttributeMap, value: &str) {
    attributes.insert("1", value);

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut marker: Option<char> = None;
    for c in value.chars() {
        if matches!(c, '#' | '.' | '%') {
            parts.push((marker, std::mem::take(&mut current)));
            marker = Some(c);
        } else {
            current.push(c);
        }
    }
    parts.push((marker, current));

    let mut roles = Vec::new();
    let mut options = Vec::new();
    for (marker, part) in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match marker {
            None => attributes.insert("style", part),
            Some('#') => attributes.insert("id", part),
            Some('.') => roles.push(part.to_string()),
            Some(_) => {
                attributes.insert(format!("{}-option", part), "");
                options.push(part.to_string());
            }
        }
    }

    if !roles.is_empty() {
        attributes.insert("role", roles.join(" "));
    }
    if !options.is_empty() {
        attributes.insert("options", options.join(","));
    }
}

enum Entry {
    Named { name: String, value: String },
    Positional(String),
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_blanks(&mut self) {
        while self.peek().is_some_and(|c| c == ' ' || c == '\t') {
            self.pos += 1;
        }
    }

    /// 次のカンマの直後まで読み飛ばす
    fn skip_past_comma(&mut self) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == ',' {
                break;
            }
        }
    }

    fn next_entry(&mut self) -> Entry {
        self.skip_blanks();

        if let Some(quote @ ('"' | '\'')) = self.peek() {
            let value = self.read_quoted(quote);
            self.skip_past_comma();
            return Entry::Positional(value);
        }

        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ',' || c == '=' {
                break;
            }
            self.pos += 1;
        }
        let head: String = self.chars[start..self.pos].iter().collect();

        if self.peek() == Some('=') && is_attribute_name(head.trim()) {
            self.pos += 1;
            self.skip_blanks();
            let value = match self.peek() {
                Some(quote @ ('"' | '\'')) => {
                    let value = self.read_quoted(quote);
                    self.skip_past_comma();
                    value
                }
                _ => self.read_until_comma().trim().to_string(),
            };
            return Entry::Named {
                name: head.trim().to_string(),
                value,
            };
        }

        let rest = self.read_until_comma();
        Entry::Positional(format!("{}{}", head, rest).trim().to_string())
    }

    fn read_until_comma(&mut self) -> String {
        let mut value = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == ',' {
                break;
            }
            value.push(c);
        }
        value
    }

    fn read_quoted(&mut self, quote: char) -> String {
        let mut value = String::new();
        self.pos += 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\\' && self.peek() == Some(quote) {
                value.push(quote);
                self.pos += 1;
            } else if c == quote {
                break;
            } else {
                value.push(c);
            }
        }
        value
    }
}

fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}
