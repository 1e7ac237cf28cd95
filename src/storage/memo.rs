//! 双向翻译记忆
//!
//! 会话内的原文 ↔ 译文映射。正向表用于命中已有翻译，
//! 反向表用于识别"这段文本本身就是译文"，是防止反馈循环的
//! 过滤依据之一。容量随会话增长，`restore` 时整体丢弃。

use std::collections::HashMap;

/// 双向翻译记忆表
#[derive(Debug, Default)]
pub struct TranslationMemo {
    /// 原文 → 译文
    forward: HashMap<String, String>,
    /// 译文 → 原文
    reverse: HashMap<String, String>,
}

impl TranslationMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询原文对应的译文
    pub fn lookup(&self, original: &str) -> Option<&str> {
        self.forward.get(original).map(|s| s.as_str())
    }

    /// 查询译文对应的原文
    pub fn lookup_reverse(&self, translated: &str) -> Option<&str> {
        self.reverse.get(translated).map(|s| s.as_str())
    }

    /// 文本是否是本会话产出的译文
    pub fn is_translated_text(&self, text: &str) -> bool {
        self.reverse.contains_key(text)
    }

    /// 写入单个翻译对
    pub fn insert(&mut self, original: String, translated: String) {
        if let Some(stale) = self.forward.insert(original.clone(), translated.clone()) {
            // 原文换了新译文，旧的反向条目作废
            if stale != translated {
                self.reverse.remove(&stale);
            }
        }
        self.reverse.insert(translated, original);
    }

    /// 批量合并翻译结果，两个方向在一次调用内同时更新
    ///
    /// 空译文不入表。返回新增的原文条目数。
    pub fn merge(&mut self, pairs: &HashMap<String, String>) -> usize {
        let mut added = 0;
        for (original, translated) in pairs {
            if translated.is_empty() {
                tracing::debug!("忽略空译文: {:?}", original);
                continue;
            }
            if !self.forward.contains_key(original) {
                added += 1;
            }
            self.insert(original.clone(), translated.clone());
        }
        tracing::debug!("记忆表合并 {} 条，其中新增 {} 条", pairs.len(), added);
        added
    }

    /// 清空两个方向
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> HashMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_updates_both_directions() {
        let mut memo = TranslationMemo::new();
        let added = memo.merge(&pairs(&[("Hello", "你好"), ("World", "世界")]));

        assert_eq!(added, 2);
        assert_eq!(memo.lookup("Hello"), Some("你好"));
        assert_eq!(memo.lookup_reverse("你好"), Some("Hello"));
        assert_eq!(memo.lookup("World"), Some("世界"));
        assert!(memo.is_translated_text("世界"));
        assert!(!memo.is_translated_text("World"));
    }

    #[test]
    fn test_remap_removes_stale_reverse_entry() {
        let mut memo = TranslationMemo::new();
        memo.merge(&pairs(&[("Hello", "你好")]));
        memo.merge(&pairs(&[("Hello", "您好")]));

        assert_eq!(memo.lookup("Hello"), Some("您好"));
        assert_eq!(memo.lookup_reverse("您好"), Some("Hello"));
        // 旧译文不再被认作译文
        assert!(!memo.is_translated_text("你好"));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_merge_skips_empty_translations() {
        let mut memo = TranslationMemo::new();
        let added = memo.merge(&pairs(&[("Hello", ""), ("World", "世界")]));

        assert_eq!(added, 1);
        assert_eq!(memo.lookup("Hello"), None);
        assert_eq!(memo.lookup("World"), Some("世界"));
    }

    #[test]
    fn test_clear_empties_both_directions() {
        let mut memo = TranslationMemo::new();
        memo.merge(&pairs(&[("Hello", "你好")]));
        memo.clear();

        assert!(memo.is_empty());
        assert_eq!(memo.lookup("Hello"), None);
        assert_eq!(memo.lookup_reverse("你好"), None);
    }

    #[test]
    fn test_merge_counts_only_new_originals() {
        let mut memo = TranslationMemo::new();
        memo.merge(&pairs(&[("A", "甲")]));
        let added = memo.merge(&pairs(&[("A", "甲"), ("B", "乙")]));
        assert_eq!(added, 1);
        assert_eq!(memo.len(), 2);
    }
}
