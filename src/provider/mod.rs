//! # 翻译提供方模块
//!
//! 把"一批原文换一批译文"抽象成 [`TranslateProvider`] 特征，
//! 引擎核心只依赖这个特征，不关心译文从哪来：
//!
//! - `http` - 对接批量翻译服务的 HTTP 客户端
//! - `mock` - 确定性的离线实现，测试与演示用
//!
//! 提供方返回的映射允许不完整（部分文本没有译文），
//! 但返回空映射视为失败，由调用方按可恢复错误处理。

pub mod http;
pub mod mock;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SyncConfig;
use crate::error::SyncResult;

pub use http::HttpTranslateProvider;
pub use mock::MockTranslateProvider;

/// 批量翻译提供方
#[async_trait]
pub trait TranslateProvider: Send + Sync {
    /// 翻译一批文本，返回 原文 → 译文 的映射
    ///
    /// 映射可以不完整，缺失的条目由调用方决定如何处理；
    /// 完全失败时返回错误而不是空映射。
    async fn translate_batch(&self, texts: &[String]) -> SyncResult<HashMap<String, String>>;

    /// 提供方名称，用于日志
    fn name(&self) -> &str;
}

/// 按配置构建提供方
pub fn create_provider(config: &SyncConfig) -> SyncResult<Arc<dyn TranslateProvider>> {
    if config.use_mock {
        tracing::info!("使用离线模拟翻译提供方");
        return Ok(Arc::new(MockTranslateProvider::new()));
    }
    let provider = HttpTranslateProvider::new(config)?;
    tracing::info!(endpoint = %config.api_url, "使用 HTTP 翻译提供方");
    Ok(Arc::new(provider))
}
