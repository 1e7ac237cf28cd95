//! # Live Translator
//!
//! 面向嵌入式浏览器宿主的实时翻译同步引擎：整页翻译、一键还原、
//! 动态内容自动跟进。宿主负责渲染页面和上报 DOM 变更，引擎负责
//! 维护原文快照、译文记忆和稳定性检测，并在合适的时机调用批量
//! 翻译服务。
//!
//! ## 模块组织
//!
//! - `engine` - 协调核心：入口操作、会话、写回、派发
//! - `pipeline` - 文本提取、过滤与变更聚合
//! - `storage` - 原文快照、译文记忆、变更指纹
//! - `provider` - 批量翻译提供方（HTTP 与离线模拟）
//! - `dom` - html5ever DOM 的读写辅助
//! - `config` - 配置加载与常量
//! - `error` - 统一错误类型
//!
//! ## 线程模型
//!
//! DOM 经由 `Rc` 共享，引擎不是 `Send`。所有 DOM 操作都在同一
//! 逻辑线程完成，异步仅用于提供方的网络请求；在 tokio 的
//! current-thread 运行时或 `LocalSet` 里驱动即可。

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod storage;

// Re-export commonly used items for convenience
pub use config::SyncConfig;
pub use engine::{
    ApplyGuard, DispatchReport, EngineStats, FetchJob, FlushOutcome, RestoreReport, SessionState,
    TranslateReport, TranslationEngine,
};
pub use error::{SyncError, SyncResult};
pub use pipeline::{MutationAggregator, MutationRecord, PollOutcome, TextCollector};
pub use provider::{
    create_provider, HttpTranslateProvider, MockTranslateProvider, TranslateProvider,
};
pub use storage::{FingerprintCache, SnapshotStore, TranslationMemo};

/// crate 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
