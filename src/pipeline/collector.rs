//! 候选文本收集器
//!
//! 遍历子树，提取所有可能需要翻译的文本：文本节点的内容和元素上
//! 配置的可翻译属性值。提取出的候选一律先过 [`TextFilter`]，拒绝
//! 原因计入统计。收集器只读文档树，不产生任何副作用。

use markup5ever_rcdom::{Handle, NodeData};

use crate::config::SyncConfig;
use crate::dom::{self, ScanPolicy};
use crate::error::helpers;
use crate::pipeline::filters::{FilterReason, TextFilter};
use crate::storage::TranslationMemo;

/// 候选文本的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    /// 文本节点内容
    NodeText,
    /// 元素属性值，携带属性名
    Attribute(String),
}

/// 一条候选文本（已去除首尾空白）
#[derive(Debug, Clone)]
pub struct TextUnit {
    pub text: String,
    pub source: TextSource,
}

/// 收集统计
#[derive(Debug, Default, Clone)]
pub struct CollectionStats {
    /// 评估过的候选总数
    pub candidates_seen: u64,
    /// 通过过滤进入集合的数量
    pub queued: u64,
    pub filtered_blank: u64,
    pub filtered_short: u64,
    pub filtered_numeric: u64,
    pub filtered_translated: u64,
    /// 属性来源的候选数量
    pub attr_candidates: u64,
}

impl CollectionStats {
    pub fn reset(&mut self) {
        *self = CollectionStats::default();
    }
}

/// 文本收集器
#[derive(Debug)]
pub struct TextCollector {
    policy: ScanPolicy,
    filter: TextFilter,
    stats: CollectionStats,
}

impl TextCollector {
    pub fn new(policy: ScanPolicy, filter: TextFilter) -> Self {
        Self {
            policy,
            filter,
            stats: CollectionStats::default(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(ScanPolicy::from_config(config), TextFilter::from_config(config))
    }

    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    /// 收集子树内所有通过过滤的候选文本
    ///
    /// 根节点本身可以是文本节点（新插入的裸文本）也可以是元素。
    pub fn collect_subtree(&mut self, root: &Handle, memo: &TranslationMemo) -> Vec<TextUnit> {
        let mut units = Vec::new();
        self.collect_recursive(root, memo, &mut units);
        units
    }

    fn collect_recursive(&mut self, node: &Handle, memo: &TranslationMemo, out: &mut Vec<TextUnit>) {
        match node.data {
            NodeData::Text { .. } => {
                if let Some(text) = dom::node_text(node) {
                    self.consider(&text, TextSource::NodeText, memo, out);
                }
                return;
            }
            NodeData::Element { .. } => {
                if self.policy.should_skip(node) {
                    return;
                }
                for attr_name in self.policy.translatable_attrs().to_vec() {
                    if let Some(value) = dom::get_node_attr(node, &attr_name) {
                        self.stats.attr_candidates += 1;
                        self.consider(&value, TextSource::Attribute(attr_name), memo, out);
                    }
                }
            }
            _ => {}
        }
        // 子列表被占用的节点按单节点故障跳过，不中断整批收集
        let children = match node.children.try_borrow() {
            Ok(children) => children,
            Err(_) => {
                helpers::log_error(
                    &helpers::dom_error("节点子列表被占用，跳过该子树"),
                    "候选收集",
                );
                return;
            }
        };
        for child in children.iter() {
            self.collect_recursive(child, memo, out);
        }
    }

    fn consider(
        &mut self,
        raw_text: &str,
        source: TextSource,
        memo: &TranslationMemo,
        out: &mut Vec<TextUnit>,
    ) {
        self.stats.candidates_seen += 1;
        match self.filter.evaluate(raw_text, memo) {
            None => {
                self.stats.queued += 1;
                out.push(TextUnit {
                    text: raw_text.trim().to_string(),
                    source,
                });
            }
            Some(FilterReason::Blank) => self.stats.filtered_blank += 1,
            Some(FilterReason::TooShort) => self.stats.filtered_short += 1,
            Some(FilterReason::PureNumeric) => {
                tracing::trace!("过滤纯数字文本: {:?}", raw_text.trim());
                self.stats.filtered_numeric += 1;
            }
            Some(FilterReason::AlreadyTranslated) => {
                tracing::trace!("过滤已翻译文本: {:?}", raw_text.trim());
                self.stats.filtered_translated += 1;
            }
        }
    }

    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{find_body, parse_html};

    fn collect(html: &str) -> (TextCollector, Vec<TextUnit>) {
        let dom = parse_html(html);
        let body = find_body(&dom);
        let memo = TranslationMemo::new();
        let mut collector = TextCollector::new(ScanPolicy::default(), TextFilter::default());
        let units = collector.collect_subtree(&body, &memo);
        (collector, units)
    }

    fn texts(units: &[TextUnit]) -> Vec<&str> {
        units.iter().map(|u| u.text.as_str()).collect()
    }

    #[test]
    fn test_collects_text_and_attrs() {
        let (_, units) = collect(
            r#"<p>Hello</p><input placeholder="Enter name" title="Hint"><img alt="Logo">"#,
        );
        let collected = texts(&units);

        assert!(collected.contains(&"Hello"));
        assert!(collected.contains(&"Enter name"));
        assert!(collected.contains(&"Hint"));
        assert!(collected.contains(&"Logo"));
        assert_eq!(units.len(), 4);
    }

    #[test]
    fn test_skips_script_style_subtrees() {
        let (_, units) = collect(
            "<p>Visible</p><script>var hidden = 1;</script><style>.x { color: red }</style>",
        );
        assert_eq!(texts(&units), vec!["Visible"]);
    }

    #[test]
    fn test_filters_numeric_and_blank() {
        let (collector, units) = collect("<p>123</p><p>   </p><p>Real text</p><p>1,000.50</p>");

        assert_eq!(texts(&units), vec!["Real text"]);
        assert_eq!(collector.stats().filtered_numeric, 2);
        assert!(collector.stats().filtered_blank >= 1);
    }

    #[test]
    fn test_text_is_trimmed() {
        let (_, units) = collect("<p>  spaced out  </p>");
        assert_eq!(texts(&units), vec!["spaced out"]);
        assert_eq!(units[0].source, TextSource::NodeText);
    }

    #[test]
    fn test_translated_values_not_requeued() {
        let dom = parse_html("<p>Hello</p><p>你好</p>");
        let body = find_body(&dom);
        let mut memo = TranslationMemo::new();
        memo.insert("Hello".into(), "你好".into());

        let mut collector = TextCollector::new(ScanPolicy::default(), TextFilter::default());
        let units = collector.collect_subtree(&body, &memo);

        // "Hello" 是原文照常收集，"你好" 是译文被过滤
        assert_eq!(texts(&units), vec!["Hello"]);
        assert_eq!(collector.stats().filtered_translated, 1);
    }

    #[test]
    fn test_busy_subtree_skipped_without_abort() {
        let dom = parse_html("<div><span>Inner</span></div><p>After</p>");
        let body = find_body(&dom);
        let div = crate::dom::find_first_element(&body, "div").unwrap();
        // 宿主正拿着 div 的子列表，收集进不去
        let _hold = div.children.borrow_mut();

        let memo = TranslationMemo::new();
        let mut collector = TextCollector::new(ScanPolicy::default(), TextFilter::default());
        let units = collector.collect_subtree(&body, &memo);

        // div 子树收不到，同批其余节点不受影响
        assert_eq!(texts(&units), vec!["After"]);
    }

    #[test]
    fn test_bare_text_node_as_root() {
        let dom = parse_html("<div></div>");
        let body = find_body(&dom);
        let div = crate::dom::find_first_element(&body, "div").unwrap();
        let text_node = crate::dom::append_text_node(&div, "Fresh content");

        let memo = TranslationMemo::new();
        let mut collector = TextCollector::new(ScanPolicy::default(), TextFilter::default());
        let units = collector.collect_subtree(&text_node, &memo);

        assert_eq!(texts(&units), vec!["Fresh content"]);
    }
}
