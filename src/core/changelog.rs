// チェンジログドメインモデル
//
// ドキュメントから抽出されたマイグレーション単位（ChangeSet）と、
// それらを文書順に保持する ChangeLog を表現する型。

use serde::Serialize;
use sha2::{Digest, Sha256};

/// 生SQLによる変更
///
/// コードリスティングのソーステキストをそのまま保持します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSqlChange {
    sql: String,
}

impl RawSqlChange {
    /// 新しい変更を作成
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    /// SQLテキスト
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// SQLテキストのチェックサムを計算
    ///
    /// # Returns
    ///
    /// SHA-256ハッシュ（64文字の16進数文字列）
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// チェンジセット
///
/// 一つのマイグレーション単位。`id` と `author` なしでは構築できません。
/// 実行ポリシー（runAlways など）の解釈はホスト側の責務です。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    id: String,
    author: String,
    run_always: bool,
    run_on_change: bool,
    file_path: String,
    contexts: String,
    dbms: String,
    run_in_transaction: bool,
    change: RawSqlChange,
}

impl ChangeSet {
    /// デフォルトのフラグで新しいチェンジセットを作成
    ///
    /// runAlways=false, runOnChange=false, runInTransaction=true,
    /// contexts と dbms は空文字列になります。
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        file_path: impl Into<String>,
        change: RawSqlChange,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            run_always: false,
            run_on_change: false,
            file_path: file_path.into(),
            contexts: String::new(),
            dbms: String::new(),
            run_in_transaction: true,
            change,
        }
    }

    pub fn with_run_always(mut self, run_always: bool) -> Self {
        self.run_always = run_always;
        self
    }

    pub fn with_run_on_change(mut self, run_on_change: bool) -> Self {
        self.run_on_change = run_on_change;
        self
    }

    pub fn with_run_in_transaction(mut self, run_in_transaction: bool) -> Self {
        self.run_in_transaction = run_in_transaction;
        self
    }

    pub fn with_contexts(mut self, contexts: impl Into<String>) -> Self {
        self.contexts = contexts.into();
        self
    }

    pub fn with_dbms(mut self, dbms: impl Into<String>) -> Self {
        self.dbms = dbms.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn run_always(&self) -> bool {
        self.run_always
    }

    pub fn run_on_change(&self) -> bool {
        self.run_on_change
    }

    pub fn run_in_transaction(&self) -> bool {
        self.run_in_transaction
    }

    pub fn contexts(&self) -> &str {
        &self.contexts
    }

    pub fn dbms(&self) -> &str {
        &self.dbms
    }

    /// 所属するチェンジログの論理パス
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn change(&self) -> &RawSqlChange {
        &self.change
    }

    /// ホストでの識別子（`file_path::id::author`）
    pub fn identifier(&self) -> String {
        format!("{}::{}::{}", self.file_path, self.id, self.author)
    }
}

/// チェンジログ
///
/// 一回の解析呼び出しで組み立てられ、文書順のチェンジセット列を保持します。
/// 組み立て完了後は読み取り専用です。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLog {
    physical_file_path: String,
    change_sets: Vec<ChangeSet>,
    included_resources: Vec<String>,
}

impl ChangeLog {
    /// 空のチェンジログを作成
    pub fn new(physical_file_path: impl Into<String>) -> Self {
        Self {
            physical_file_path: physical_file_path.into(),
            change_sets: Vec::new(),
            included_resources: Vec::new(),
        }
    }

    pub(crate) fn add_change_set(&mut self, change_set: ChangeSet) {
        self.change_sets.push(change_set);
    }

    pub(crate) fn set_included_resources(&mut self, included_resources: Vec<String>) {
        self.included_resources = included_resources;
    }

    pub fn physical_file_path(&self) -> &str {
        &self.physical_file_path
    }

    /// チェンジセット（文書順）
    pub fn change_sets(&self) -> &[ChangeSet] {
        &self.change_sets
    }

    /// 解析中に展開されたインクルードターゲット（展開順）
    pub fn included_resources(&self) -> &[String] {
        &self.included_resources
    }

    pub fn len(&self) -> usize {
        self.change_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.change_sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_set_defaults() {
        let change_set = ChangeSet::new(
            "1",
            "alice",
            "db/changelog.adoc",
            RawSqlChange::new("SELECT 1;"),
        );

        assert!(!change_set.run_always());
        assert!(!change_set.run_on_change());
        assert!(change_set.run_in_transaction());
        assert_eq!(change_set.contexts(), "");
        assert_eq!(change_set.dbms(), "");
        assert_eq!(change_set.identifier(), "db/changelog.adoc::1::alice");
    }

    #[test]
    fn test_checksum_is_stable_hex() {
        let change = RawSqlChange::new("ALTER TABLE t ADD COLUMN x INT;");
        let checksum = change.checksum();
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(checksum, RawSqlChange::new("ALTER TABLE t ADD COLUMN x INT;").checksum());
        assert_ne!(checksum, RawSqlChange::new("ALTER TABLE t ADD COLUMN y INT;").checksum());
    }

    #[test]
    fn test_change_log_serializes_camel_case() {
        let mut change_log = ChangeLog::new("db/changelog.adoc");
        change_log.add_change_set(
            ChangeSet::new("1", "alice", "db/changelog.adoc", RawSqlChange::new("SELECT 1;"))
                .with_run_on_change(true),
        );

        let json = serde_json::to_value(&change_log).unwrap();
        assert_eq!(json["physicalFilePath"], "db/changelog.adoc");
        assert_eq!(json["changeSets"][0]["runOnChange"], true);
        assert_eq!(json["changeSets"][0]["change"]["sql"], "SELECT 1;");
    }
}
