//! 会话状态
//!
//! 译文记忆与激活标志跨页面导航存活，按节点的快照则不跨页。
//! 宿主在导航后换入新 DOM 根时，只要会话仍处激活态，
//! 引擎就会立即用记忆中的译文重译新页面。

use url::Url;

use crate::storage::TranslationMemo;

/// 翻译会话
#[derive(Debug)]
pub struct SessionState {
    active: bool,
    memo: TranslationMemo,
    page_url: Option<Url>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            active: false,
            memo: TranslationMemo::new(),
            page_url: None,
        }
    }

    /// 会话是否处于"已翻译"状态
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 首次成功派发后激活会话
    pub fn activate(&mut self) {
        if !self.active {
            tracing::debug!("翻译会话激活");
        }
        self.active = true;
    }

    /// 还原时停用会话并清空记忆
    pub fn deactivate_and_clear(&mut self) {
        self.active = false;
        self.memo.clear();
        tracing::debug!("翻译会话停用，记忆已清空");
    }

    pub fn memo(&self) -> &TranslationMemo {
        &self.memo
    }

    pub fn memo_mut(&mut self) -> &mut TranslationMemo {
        &mut self.memo
    }

    pub fn page_url(&self) -> Option<&Url> {
        self.page_url.as_ref()
    }

    pub fn set_page_url(&mut self, url: Option<Url>) {
        self.page_url = url;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
