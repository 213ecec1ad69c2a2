// Core Domain
// チェンジログのドメインモデル、エラー型、設定

pub mod changelog;
pub mod config;
pub mod error;
