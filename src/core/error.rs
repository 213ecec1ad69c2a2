// エラー型定義
//
// チェンジログ解析全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、ValidationError, IncludeError, ChangeLogParseError を定義します。

use std::io;
use thiserror::Error;

/// エラー発生位置
///
/// ドキュメント内（インクルード先を含む）のエラー発生位置を表現します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    /// 論理パス（インクルード先の場合はインクルードターゲット）
    pub file: String,
    /// 行番号（1始まり）
    pub line: Option<usize>,
}

impl ErrorLocation {
    /// 新しいエラー位置を作成
    pub fn new(file: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        match self.line {
            Some(line) => format!(" ({}:{})", self.file, line),
            None => format!(" ({})", self.file),
        }
    }
}

/// 位置情報をフォーマットするヘルパー関数
fn format_location_opt(location: &Option<ErrorLocation>) -> String {
    location.as_ref().map_or(String::new(), |loc| loc.format())
}

/// バリデーションエラー
///
/// コードリスティングの属性検証時に発生するエラーを表現します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 真偽値属性に "true" / "false" 以外の値が指定された
    #[error(
        "Liquibase code listing {attribute} attribute must be set to either \"true\" or \"false\", found: {value}{}",
        format_location_opt(.location)
    )]
    InvalidBooleanAttribute {
        /// 属性名
        attribute: String,
        /// 不正な値
        value: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
    },
}

impl ValidationError {
    /// 真偽値属性エラーかどうか
    pub fn is_invalid_boolean_attribute(&self) -> bool {
        matches!(self, ValidationError::InvalidBooleanAttribute { .. })
    }

    /// 問題のある属性名を取得
    pub fn attribute(&self) -> &str {
        match self {
            ValidationError::InvalidBooleanAttribute { attribute, .. } => attribute,
        }
    }

    /// 問題のある属性値を取得
    pub fn value(&self) -> &str {
        match self {
            ValidationError::InvalidBooleanAttribute { value, .. } => value,
        }
    }

    /// エラー発生位置を取得
    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            ValidationError::InvalidBooleanAttribute { location, .. } => location.as_ref(),
        }
    }
}

/// インクルードエラー
///
/// ドキュメントパーサーがインクルードディレクティブを展開する際に発生するエラー。
#[derive(Debug, Error)]
pub enum IncludeError {
    /// インクルード対象がリソースアクセサに存在しない
    #[error("could not find change log resource to include {target}")]
    NotFound {
        /// インクルードターゲット
        target: String,
    },

    /// インクルード対象は存在するが読み込めない
    #[error("failed to read included resource {target}: {source}")]
    Io {
        /// インクルードターゲット
        target: String,
        /// 元のI/Oエラー
        #[source]
        source: io::Error,
    },

    /// インクルードのネストが上限を超えた
    #[error("maximum include depth of {max_depth} exceeded while including {target}")]
    DepthExceeded {
        /// インクルードターゲット
        target: String,
        /// 許可されている最大深さ
        max_depth: usize,
    },
}

impl IncludeError {
    /// インクルード対象が見つからないエラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, IncludeError::NotFound { .. })
    }

    /// I/Oエラーかどうか
    pub fn is_io(&self) -> bool {
        matches!(self, IncludeError::Io { .. })
    }

    /// 深さ超過エラーかどうか
    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, IncludeError::DepthExceeded { .. })
    }

    /// インクルードターゲットを取得
    pub fn target(&self) -> &str {
        match self {
            IncludeError::NotFound { target }
            | IncludeError::Io { target, .. }
            | IncludeError::DepthExceeded { target, .. } => target,
        }
    }
}

/// チェンジログ解析エラー
///
/// 解析呼び出し全体の失敗を一つの型にまとめたもの。
/// 元のエラーは `source()` から辿れます。
#[derive(Debug, Error)]
pub enum ChangeLogParseError {
    /// 最上位のチェンジログが見つからない
    #[error("could not find change log resource {location}")]
    ResourceNotFound {
        /// チェンジログの論理パス
        location: String,
    },

    /// インクルード対象が見つからない
    #[error("failed to parse change log {location}: could not find change log resource to include {target}")]
    IncludeNotFound {
        /// チェンジログの論理パス
        location: String,
        /// 見つからなかったインクルードターゲット
        target: String,
    },

    /// インクルードのネストが設定上限を超えた
    #[error("failed to parse change log {location}: maximum include depth of {max_depth} exceeded while including {target}")]
    IncludeDepthExceeded {
        /// チェンジログの論理パス
        location: String,
        /// 展開中だったインクルードターゲット
        target: String,
        /// 許可されている最大深さ
        max_depth: usize,
    },

    /// コードリスティングの属性検証に失敗した
    #[error("failed to parse change log {location}: {source}")]
    Validation {
        /// チェンジログの論理パス
        location: String,
        /// 元のバリデーションエラー
        #[source]
        source: ValidationError,
    },

    /// その他の読み込み失敗
    #[error("failed to read change log resource {location}: {source}")]
    Io {
        /// 読み込みに失敗したリソースの論理パス
        location: String,
        /// 元のI/Oエラー
        #[source]
        source: io::Error,
    },
}

impl ChangeLogParseError {
    /// インクルードエラーを解析エラーに変換
    ///
    /// インクルード先のI/Oエラーは汎用I/Oエラーとして扱い、
    /// 「見つからない」エラーとは区別します。
    pub fn from_include(location: &str, error: IncludeError) -> Self {
        match error {
            IncludeError::NotFound { target } => ChangeLogParseError::IncludeNotFound {
                location: location.to_string(),
                target,
            },
            IncludeError::Io { target, source } => ChangeLogParseError::Io {
                location: target,
                source,
            },
            IncludeError::DepthExceeded { target, max_depth } => {
                ChangeLogParseError::IncludeDepthExceeded {
                    location: location.to_string(),
                    target,
                    max_depth,
                }
            }
        }
    }

    /// リソース不在エラーかどうか
    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, ChangeLogParseError::ResourceNotFound { .. })
    }

    /// インクルード不在エラーかどうか
    pub fn is_include_not_found(&self) -> bool {
        matches!(self, ChangeLogParseError::IncludeNotFound { .. })
    }

    /// インクルード深さ超過エラーかどうか
    pub fn is_include_depth_exceeded(&self) -> bool {
        matches!(self, ChangeLogParseError::IncludeDepthExceeded { .. })
    }

    /// バリデーションエラーかどうか
    pub fn is_validation(&self) -> bool {
        matches!(self, ChangeLogParseError::Validation { .. })
    }

    /// I/Oエラーかどうか
    pub fn is_io(&self) -> bool {
        matches!(self, ChangeLogParseError::Io { .. })
    }

    /// バリデーションエラーの詳細を取得
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            ChangeLogParseError::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}
