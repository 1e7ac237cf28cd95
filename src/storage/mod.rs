//! 存储模块
//!
//! 引擎的三类状态存储：节点原文快照、双向翻译记忆、变更指纹缓存。

pub mod fingerprint;
pub mod memo;
pub mod snapshot;

pub use fingerprint::{change_fingerprint, FingerprintCache};
pub use memo::TranslationMemo;
pub use snapshot::{NodeSnapshot, SnapshotStats, SnapshotStore};
