// 集成测试公共模块
//
// 提供 DOM 构造、引擎装配和几个可控的测试提供方

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use markup5ever_rcdom::{Handle, RcDom};

use live_translator::dom;
use live_translator::error::{SyncError, SyncResult};
use live_translator::{SyncConfig, TranslateProvider, TranslationEngine};

/// 初始化测试日志（幂等，RUST_LOG 可调）
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// 解析 HTML 并装配引擎
#[allow(dead_code)]
pub fn engine_with_html(
    html: &str,
    provider: Arc<dyn TranslateProvider>,
) -> (RcDom, TranslationEngine) {
    TranslationEngine::from_html(html, provider, SyncConfig::new())
        .expect("engine should build from valid config")
}

/// 子树内第一个指定名称的元素
#[allow(dead_code)]
pub fn first_element(root: &Handle, name: &str) -> Handle {
    dom::find_first_element(root, name)
        .unwrap_or_else(|| panic!("element <{}> should exist", name))
}

/// 元素的第一个文本子节点
#[allow(dead_code)]
pub fn first_text_child(element: &Handle) -> Handle {
    element
        .children
        .borrow()
        .iter()
        .find(|child| dom::node_text(child).is_some())
        .cloned()
        .expect("element should have a text child")
}

/// 子树内全部非空文本（trim 后），文档序
#[allow(dead_code)]
pub fn visible_texts(root: &Handle) -> Vec<String> {
    let mut texts = Vec::new();
    dom::for_each_node(root, &mut |node| {
        if let Some(text) = dom::node_text(node) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                texts.push(trimmed.to_string());
            }
        }
        true
    });
    texts
}

// ============================================================================
// 测试提供方
// ============================================================================

/// 记录每次请求的提供方，译文形如 `[译] 原文`
pub struct RecordingProvider {
    requests: Mutex<Vec<Vec<String>>>,
}

#[allow(dead_code)]
impl RecordingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }

    /// 提供方被调用的次数
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// 每次调用的请求文本
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }

    /// 所有请求里出现过的文本（扁平化）
    pub fn all_requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TranslateProvider for RecordingProvider {
    async fn translate_batch(&self, texts: &[String]) -> SyncResult<HashMap<String, String>> {
        self.requests.lock().unwrap().push(texts.to_vec());
        Ok(texts
            .iter()
            .map(|text| (text.clone(), format!("[译] {}", text)))
            .collect())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// 总是返回空映射的提供方
#[allow(dead_code)]
pub struct EmptyProvider {
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl EmptyProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslateProvider for EmptyProvider {
    async fn translate_batch(&self, _texts: &[String]) -> SyncResult<HashMap<String, String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HashMap::new())
    }

    fn name(&self) -> &str {
        "empty"
    }
}

/// 总是失败的提供方
#[allow(dead_code)]
pub struct FailingProvider;

#[allow(dead_code)]
impl FailingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl TranslateProvider for FailingProvider {
    async fn translate_batch(&self, _texts: &[String]) -> SyncResult<HashMap<String, String>> {
        Err(SyncError::ProviderError("模拟网络故障".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
