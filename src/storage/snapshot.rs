//! 节点原文快照存储
//!
//! 为每个被翻译触达的节点保留一份初次见到的内容：文本节点存整段文本，
//! 元素存参与翻译的属性原值。记录按 [`NodeKey`] 建立索引，内部只持有
//! 弱引用，不延长节点生命周期；节点脱离文档后记录可以被显式清理。
//!
//! 首写保留（first-write-wins）是这里的核心约定：记录一旦建立，后续
//! 捕获都是空操作，原文只会在"恢复并清空"这一个流程里离开存储。

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node, NodeData};

use crate::dom::{self, NodeKey, ScanPolicy};
use crate::error::helpers;
use crate::storage::memo::TranslationMemo;

/// 单个节点的原文内容
#[derive(Debug, Clone)]
pub enum SnapshotContent {
    /// 文本节点的完整原文（未做任何裁剪）
    Text { original: String },
    /// 元素上各可翻译属性的原值
    Attrs { original: HashMap<String, String> },
}

/// 节点快照记录
#[derive(Debug)]
pub struct NodeSnapshot {
    node: Weak<Node>,
    pub content: SnapshotContent,
}

impl NodeSnapshot {
    /// 记录指向的节点是否仍然存活
    pub fn is_alive(&self) -> bool {
        self.node.upgrade().is_some()
    }
}

/// 快照存储统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnapshotStats {
    pub text_records: usize,
    pub attr_records: usize,
}

/// 原文快照存储
#[derive(Debug, Default)]
pub struct SnapshotStore {
    records: HashMap<NodeKey, NodeSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 节点是否已有存活的记录
    ///
    /// 指向已消亡节点的记录视同不存在，地址复用时允许重新捕获。
    pub fn contains(&self, key: NodeKey) -> bool {
        self.records
            .get(&key)
            .map(|record| record.is_alive())
            .unwrap_or(false)
    }

    pub fn get(&self, key: NodeKey) -> Option<&NodeSnapshot> {
        self.records.get(&key)
    }

    /// 捕获文本节点的原文，已有记录时保留首写值
    ///
    /// 空白文本不捕获；被识别为译文的内容不捕获，避免把译文当原文记下。
    /// 返回是否新建了记录。
    pub fn capture_text_if_absent(&mut self, node: &Handle, memo: &TranslationMemo) -> bool {
        let text = match dom::node_text(node) {
            Some(text) => text,
            None => return false,
        };
        if text.trim().is_empty() {
            return false;
        }
        if memo.is_translated_text(text.trim()) {
            return false;
        }

        let key = NodeKey::of(node);
        if self.contains(key) {
            return false;
        }

        self.records.insert(
            key,
            NodeSnapshot {
                node: Rc::downgrade(node),
                content: SnapshotContent::Text { original: text },
            },
        );
        true
    }

    /// 捕获元素可翻译属性的原值，已有记录时保留首写值
    ///
    /// 只记录实际存在且非译文的属性，没有可记录的属性时不建记录。
    pub fn capture_attrs_if_absent(
        &mut self,
        node: &Handle,
        policy: &ScanPolicy,
        memo: &TranslationMemo,
    ) -> bool {
        if dom::node_name(node).is_none() {
            return false;
        }

        let key = NodeKey::of(node);
        if self.contains(key) {
            return false;
        }

        let mut originals = HashMap::new();
        for attr_name in policy.translatable_attrs() {
            if let Some(value) = dom::get_node_attr(node, attr_name) {
                if !value.trim().is_empty() && !memo.is_translated_text(value.trim()) {
                    originals.insert(attr_name.clone(), value);
                }
            }
        }
        if originals.is_empty() {
            return false;
        }

        self.records.insert(
            key,
            NodeSnapshot {
                node: Rc::downgrade(node),
                content: SnapshotContent::Attrs { original: originals },
            },
        );
        true
    }

    /// 捕获整棵子树的原文，返回新建记录数
    ///
    /// 跳过容器（script/style 一类）整棵子树不进入。
    pub fn capture_subtree(
        &mut self,
        root: &Handle,
        policy: &ScanPolicy,
        memo: &TranslationMemo,
    ) -> usize {
        let mut captured = 0;
        self.capture_recursive(root, policy, memo, &mut captured);
        captured
    }

    fn capture_recursive(
        &mut self,
        node: &Handle,
        policy: &ScanPolicy,
        memo: &TranslationMemo,
        captured: &mut usize,
    ) {
        match node.data {
            NodeData::Text { .. } => {
                if self.capture_text_if_absent(node, memo) {
                    *captured += 1;
                }
                return;
            }
            NodeData::Element { .. } => {
                if policy.should_skip(node) {
                    return;
                }
                if self.capture_attrs_if_absent(node, policy, memo) {
                    *captured += 1;
                }
            }
            _ => {}
        }
        // 子列表被占用按单节点故障处理，剩余子树照常捕获
        let children = match node.children.try_borrow() {
            Ok(children) => children,
            Err(_) => {
                helpers::log_error(
                    &helpers::dom_error("节点子列表被占用，跳过该子树"),
                    "快照捕获",
                );
                return;
            }
        };
        for child in children.iter() {
            self.capture_recursive(child, policy, memo, captured);
        }
    }

    /// 把子树内所有有记录且内容已变化的节点恢复为原文
    ///
    /// 返回实际被覆写的节点数。已脱离文档的节点不会被遍历到，
    /// 自然跳过。
    pub fn restore_subtree(&self, root: &Handle, policy: &ScanPolicy) -> usize {
        let mut restored = 0;
        self.restore_recursive(root, policy, &mut restored);
        restored
    }

    fn restore_recursive(&self, node: &Handle, policy: &ScanPolicy, restored: &mut usize) {
        if let NodeData::Element { .. } = node.data {
            if policy.should_skip(node) {
                return;
            }
        }

        if let Some(record) = self.records.get(&NodeKey::of(node)) {
            match &record.content {
                SnapshotContent::Text { original } => {
                    let current = dom::node_text(node);
                    if current.as_deref() != Some(original.as_str()) {
                        dom::set_node_text(node, original);
                        *restored += 1;
                    }
                }
                SnapshotContent::Attrs { original } => {
                    let mut changed = false;
                    for (attr_name, original_value) in original {
                        let current = dom::get_node_attr(node, attr_name);
                        if current.as_deref() != Some(original_value.as_str()) {
                            dom::set_node_attr(node, attr_name, Some(original_value.clone()));
                            changed = true;
                        }
                    }
                    if changed {
                        *restored += 1;
                    }
                }
            }
        }

        let children = match node.children.try_borrow() {
            Ok(children) => children,
            Err(_) => {
                helpers::log_error(
                    &helpers::dom_error("节点子列表被占用，跳过该子树"),
                    "原文恢复",
                );
                return;
            }
        };
        for child in children.iter() {
            self.restore_recursive(child, policy, restored);
        }
    }

    /// 显式失效清理：删除指向已消亡节点的记录，返回删除数
    pub fn purge_detached(&mut self) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.is_alive());
        let purged = before - self.records.len();
        if purged > 0 {
            tracing::debug!("清理了 {} 条失效快照记录", purged);
        }
        purged
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> SnapshotStats {
        let mut stats = SnapshotStats::default();
        for record in self.records.values() {
            match record.content {
                SnapshotContent::Text { .. } => stats.text_records += 1,
                SnapshotContent::Attrs { .. } => stats.attr_records += 1,
            }
        }
        stats
    }
}
