//! 变更指纹缓存
//!
//! 同一轮 DOM 变更常常被宿主重复上报（滚动触发的重排、框架的重复渲染
//! 等），引擎用变更集的指纹做一层有界去重：容量固定，先进先出淘汰。
//! 被淘汰的指纹再次出现时按新变更处理，这是有意的取舍，保证内存上界
//! 的代价是极旧的重复可能再翻一次（结果幂等，无副作用）。

use std::collections::{BTreeSet, HashSet, VecDeque};

/// 计算一个变更集的指纹
///
/// 对合格新节点数、候选文本总数和排序后的候选文本做 BLAKE3 哈希。
/// 文本按字典序取前 `sample_limit` 条参与哈希，超出部分只以数量参与。
/// 采样是刻意的近似：仅在采样之外有差异的变更集会发生指纹碰撞，
/// 被当作重复丢弃。
pub fn change_fingerprint(
    new_node_count: usize,
    texts: &BTreeSet<String>,
    sample_limit: usize,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(new_node_count as u64).to_le_bytes());
    hasher.update(&(texts.len() as u64).to_le_bytes());
    for text in texts.iter().take(sample_limit) {
        // 长度前缀避免相邻文本拼接歧义
        hasher.update(&(text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// 先进先出的有界指纹缓存
#[derive(Debug)]
pub struct FingerprintCache {
    capacity: usize,
    /// 插入顺序，队首最旧
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl FingerprintCache {
    /// 创建指定容量的缓存，容量最小为 1
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.seen.contains(fingerprint)
    }

    /// 登记指纹：新指纹返回 true，重复返回 false
    ///
    /// 超出容量时淘汰最旧的一条。
    pub fn check_and_insert(&mut self, fingerprint: String) -> bool {
        if self.seen.contains(&fingerprint) {
            return false;
        }

        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        self.seen.insert(fingerprint.clone());
        self.order.push_back(fingerprint);
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
