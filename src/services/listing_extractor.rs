// コードリスティング抽出サービス
//
// 解析済みドキュメントから source スタイルのリスティングブロックを選び出し、
// 対象判定・属性検証を経てチェンジセットに変換します。

use crate::core::changelog::{ChangeSet, RawSqlChange};
use crate::core::error::{ErrorLocation, ValidationError};
use crate::services::asciidoc::attributes::is_case_insensitive_false;
use crate::services::asciidoc::{Block, BlockContext, Document, Selector};
use tracing::debug;

/// オプトアウト属性名
pub const OPT_OUT_ATTRIBUTE: &str = "liquibase";

/// 検証対象の真偽値属性と未指定時のデフォルト値（検証順）
pub const BOOLEAN_ATTRIBUTES: [(&str, bool); 3] = [
    ("runOnChange", false),
    ("runAlways", false),
    ("runInTransaction", true),
];

/// コードリスティング抽出サービス
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    selector: Selector,
}

impl ListingExtractor {
    pub fn new() -> Self {
        Self {
            selector: Selector::new()
                .context(BlockContext::Listing)
                .style("source"),
        }
    }

    /// source スタイルのリスティングブロックを文書順に返す
    pub fn find_code_listings<'d>(&self, document: &'d Document) -> Vec<&'d Block> {
        document.find_by(&self.selector)
    }

    /// ドキュメントからチェンジセットを抽出
    ///
    /// # Arguments
    ///
    /// * `document` - 解析済みドキュメント
    /// * `location` - チェンジログの論理パス（各チェンジセットの所属パス）
    ///
    /// # Errors
    ///
    /// 真偽値属性に不正な値があるブロックが一つでもあれば、ドキュメント全体が失敗します。
    pub fn extract(&self, document: &Document, location: &str) -> Result<Vec<ChangeSet>, ValidationError> {
        let mut change_sets = Vec::new();

        for block in self.find_code_listings(document) {
            let Some((id, author)) = Self::identity(block) else {
                debug!(
                    file = %block.location().file,
                    line = block.location().line,
                    "Skipping code listing without change set metadata"
                );
                continue;
            };
            change_sets.push(Self::convert_to_change_set(location, block, id, author)?);
        }

        debug!(location = %location, count = change_sets.len(), "Extracted change sets");
        Ok(change_sets)
    }

    /// 対象ブロックの (id, author) を返す
    ///
    /// `liquibase` 属性が "false"（大文字小文字を区別しない）の場合、
    /// または `id` / `author` のいずれかが欠けている場合は対象外です。
    /// それ以外の `liquibase` 値は除外理由になりません。
    fn identity(block: &Block) -> Option<(&str, &str)> {
        let attributes = block.attributes();
        if is_case_insensitive_false(attributes.get_or(OPT_OUT_ATTRIBUTE, "true")) {
            return None;
        }
        Some((attributes.get("id")?, attributes.get("author")?))
    }

    /// 真偽値属性を検証し、`BOOLEAN_ATTRIBUTES` の順で値を返す
    pub fn validate(block: &Block) -> Result<[bool; 3], ValidationError> {
        let mut flags = [false; 3];
        for (flag, (attribute, default)) in flags.iter_mut().zip(BOOLEAN_ATTRIBUTES) {
            *flag = Self::boolean_flag(block, attribute, default)?;
        }
        Ok(flags)
    }

    fn boolean_flag(block: &Block, attribute: &str, default: bool) -> Result<bool, ValidationError> {
        block
            .attributes()
            .boolean(attribute)
            .or_default(default)
            .map_err(|value| ValidationError::InvalidBooleanAttribute {
                attribute: attribute.to_string(),
                value,
                location: Some(ErrorLocation::new(
                    block.location().file.clone(),
                    Some(block.location().line),
                )),
            })
    }

    fn convert_to_change_set(
        location: &str,
        block: &Block,
        id: &str,
        author: &str,
    ) -> Result<ChangeSet, ValidationError> {
        let [run_on_change, run_always, run_in_transaction] = Self::validate(block)?;

        let attributes = block.attributes();
        Ok(ChangeSet::new(id, author, location, RawSqlChange::new(block.source()))
            .with_run_always(run_always)
            .with_run_on_change(run_on_change)
            .with_contexts(attributes.get_or("contexts", ""))
            .with_dbms(attributes.get_or("dbms", ""))
            .with_run_in_transaction(run_in_transaction))
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new()
    }
}
