//! 候选文本过滤规则
//!
//! 决定一段文本是否值得送去翻译。规则按代价从低到高依次执行：
//! 空白、长度、纯数字、已是译文。任何一条命中即拒绝。

use std::sync::OnceLock;

use regex::Regex;

use crate::config::SyncConfig;
use crate::storage::TranslationMemo;

static PURE_NUMERIC_RE: OnceLock<Regex> = OnceLock::new();

fn pure_numeric_re() -> &'static Regex {
    PURE_NUMERIC_RE.get_or_init(|| {
        Regex::new(r"^[\d\s.,\-+]+$").expect("纯数字正则编译失败")
    })
}

/// 去除首尾空白后是否只含数字和分隔符（`. , - +` 与空白）
///
/// 价格、编号、日期数字一类内容翻译没有意义，直接跳过。
pub fn is_pure_numeric(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && pure_numeric_re().is_match(trimmed)
}

/// 候选文本被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// 去除空白后为空
    Blank,
    /// 短于配置的最小长度
    TooShort,
    /// 纯数字内容
    PureNumeric,
    /// 已经是本会话的译文
    AlreadyTranslated,
}

/// 文本过滤器
#[derive(Debug, Clone)]
pub struct TextFilter {
    min_text_length: usize,
}

impl TextFilter {
    pub fn new(min_text_length: usize) -> Self {
        Self { min_text_length }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.min_text_length)
    }

    /// 评估一段原始文本，返回拒绝原因；`None` 表示通过
    pub fn evaluate(&self, raw_text: &str, memo: &TranslationMemo) -> Option<FilterReason> {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return Some(FilterReason::Blank);
        }
        if trimmed.chars().count() < self.min_text_length {
            return Some(FilterReason::TooShort);
        }
        if is_pure_numeric(trimmed) {
            return Some(FilterReason::PureNumeric);
        }
        if memo.is_translated_text(trimmed) {
            return Some(FilterReason::AlreadyTranslated);
        }
        None
    }

    /// 文本是否应进入待翻译集合
    pub fn should_queue(&self, raw_text: &str, memo: &TranslationMemo) -> bool {
        self.evaluate(raw_text, memo).is_none()
    }
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new(crate::config::constants::DEFAULT_MIN_TEXT_LENGTH)
    }
}
