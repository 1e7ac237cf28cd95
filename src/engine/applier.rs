//! 译文写回
//!
//! 遍历子树，把记忆中已有译文的文本节点和可译属性改写成译文。
//! 整个写回过程处于防护作用域内，由此产生的变更通知会被聚合器
//! 压制或按捕获一次规则忽略。写回前总是先尝试快照，保证还原
//! 永远有原文可用。

use markup5ever_rcdom::Handle;

use crate::dom::{self, ScanPolicy};
use crate::engine::guard::ApplyGuard;
use crate::error::helpers;
use crate::storage::{SnapshotStore, TranslationMemo};

/// 一次写回的结果
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplyOutcome {
    /// 发生改写的节点数
    pub nodes_changed: usize,
    /// 改写的文本节点数
    pub text_writes: usize,
    /// 改写的属性数
    pub attr_writes: usize,
}

impl ApplyOutcome {
    pub fn merge(&mut self, other: ApplyOutcome) {
        self.nodes_changed += other.nodes_changed;
        self.text_writes += other.text_writes;
        self.attr_writes += other.attr_writes;
    }
}

/// 对子树执行一次译文写回
pub fn apply_translations(
    root: &Handle,
    memo: &TranslationMemo,
    snapshots: &mut SnapshotStore,
    guard: &ApplyGuard,
    policy: &ScanPolicy,
) -> ApplyOutcome {
    let _scope = guard.enter();
    let mut outcome = ApplyOutcome::default();
    apply_recursive(root, memo, snapshots, policy, &mut outcome);
    if outcome.nodes_changed > 0 {
        tracing::debug!(
            nodes = outcome.nodes_changed,
            texts = outcome.text_writes,
            attrs = outcome.attr_writes,
            "译文写回完成"
        );
    }
    outcome
}

fn apply_recursive(
    node: &Handle,
    memo: &TranslationMemo,
    snapshots: &mut SnapshotStore,
    policy: &ScanPolicy,
    outcome: &mut ApplyOutcome,
) {
    if policy.should_skip(node) {
        return;
    }

    let mut node_changed = false;

    if let Some(text) = dom::node_text(node) {
        let trimmed = text.trim();
        if let Some(translation) = memo.lookup(trimmed) {
            if trimmed != translation {
                snapshots.capture_text_if_absent(node, memo);
                let translation = translation.to_string();
                if dom::set_node_text(node, &translation) {
                    outcome.text_writes += 1;
                    node_changed = true;
                }
            }
        }
    } else if dom::node_name(node).is_some() {
        for attr in policy.translatable_attrs() {
            let value = match dom::get_node_attr(node, attr) {
                Some(value) => value,
                None => continue,
            };
            let trimmed = value.trim();
            if let Some(translation) = memo.lookup(trimmed) {
                if trimmed != translation {
                    snapshots.capture_attrs_if_absent(node, policy, memo);
                    let translation = translation.to_string();
                    dom::set_node_attr(node, attr, Some(translation));
                    outcome.attr_writes += 1;
                    node_changed = true;
                }
            }
        }
    }

    if node_changed {
        outcome.nodes_changed += 1;
    }

    let children = match node.children.try_borrow() {
        Ok(children) => children.clone(),
        Err(_) => {
            helpers::log_error(
                &helpers::dom_error("节点子列表被占用，跳过该子树"),
                "译文写回",
            );
            return;
        }
    };
    for child in children.iter() {
        apply_recursive(child, memo, snapshots, policy, outcome);
    }
}
