//! 离线模拟提供方
//!
//! 译文形如 `[译] 原文`，完全确定，不碰网络。
//! 可选的人为延迟用来在测试里模拟慢速接口。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::provider::TranslateProvider;

/// 确定性模拟提供方
pub struct MockTranslateProvider {
    tag: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockTranslateProvider {
    pub fn new() -> Self {
        Self::with_tag("译")
    }

    /// 自定义译文前缀标记
    pub fn with_tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// 每次调用前人为等待
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 累计被调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTranslateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslateProvider for MockTranslateProvider {
    async fn translate_batch(&self, texts: &[String]) -> SyncResult<HashMap<String, String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut result = HashMap::with_capacity(texts.len());
        for text in texts {
            result.insert(text.clone(), format!("[{}] {}", self.tag, text));
        }
        tracing::debug!(count = result.len(), "模拟翻译完成");
        Ok(result)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
