// サービストレイト定義
//
// ホスト側がチェンジログパーサーを差し替え・選択できるようにするためのトレイト。

use crate::adapters::resource_accessor::ResourceAccessor;
use crate::core::changelog::ChangeLog;
use crate::core::error::ChangeLogParseError;

/// チェンジログパーサーのトレイト
pub trait ChangeLogParser: Send + Sync {
    /// このパーサーが指定されたチェンジログを扱えるかどうか
    fn supports(&self, location: &str, accessor: &dyn ResourceAccessor) -> bool;

    /// 複数のパーサーが対応する場合の優先度（大きいほど優先）
    fn priority(&self) -> i32;

    /// チェンジログを解析する
    fn parse(
        &self,
        location: &str,
        accessor: &dyn ResourceAccessor,
    ) -> Result<ChangeLog, ChangeLogParseError>;
}
