//! 文本处理管道
//!
//! 从文档树到待翻译文本集的加工链：过滤规则、候选文本收集、
//! 变更聚合与静止检测。

pub mod aggregator;
pub mod collector;
pub mod filters;

pub use aggregator::{
    AggregatorPhase, AggregatorStats, MutationAggregator, MutationRecord, PendingChanges,
    PollOutcome,
};
pub use collector::{CollectionStats, TextCollector, TextSource, TextUnit};
pub use filters::{is_pure_numeric, FilterReason, TextFilter};
