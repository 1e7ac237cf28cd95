//! 变更聚合与静止检测
//!
//! 宿主把原始 DOM 变更通知成批喂进来，聚合器负责三件事：
//!
//! 1. **分类与捕获**：新增节点先进快照存储再提取候选文本；
//!    文本变化只在节点从未捕获过时才算数（捕获一次规则，
//!    引擎自己的写回因此天然出不了声）。
//! 2. **累积**：候选文本去重后进入待处理集合，合格新节点计数。
//! 3. **静止检测**：显式状态机 `Idle → Accumulating → Checking`，
//!    由 `observe`（变更到达）和 `poll`（定时检查）两类事件驱动。
//!    首检延迟 500ms，未静止时每 200ms 复查，距最后一次变更
//!    满 800ms 判定静止并冲刷。
//!
//! 所有时间都由调用方传入 `Instant`，状态机本身不读时钟，
//! 测试可以完全确定地驱动它。

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use markup5ever_rcdom::Handle;

use crate::config::SyncConfig;
use crate::dom::{self, NodeKey};
use crate::engine::guard::ApplyGuard;
use crate::pipeline::collector::TextCollector;
use crate::storage::{SnapshotStore, TranslationMemo};

/// 宿主上报的单条变更通知
#[derive(Debug, Clone)]
pub enum MutationRecord {
    /// 新增了一批节点（子树根）
    AddedNodes(Vec<Handle>),
    /// 某个文本节点的内容发生变化
    TextChanged(Handle),
}

/// 聚合器所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorPhase {
    /// 没有待处理变更
    Idle,
    /// 有变更在累积，等待首次检查
    Accumulating,
    /// 首检未过稳定阈值，处于复查循环
    Checking,
}

/// 累积中的变更集
#[derive(Debug, Default)]
pub struct PendingChanges {
    /// 产出了候选文本的新增节点数
    pub new_node_count: usize,
    /// 去重且有序的候选文本
    pub texts: BTreeSet<String>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.new_node_count == 0 && self.texts.is_empty()
    }
}

/// `poll` 的结果
#[derive(Debug)]
pub enum PollOutcome {
    /// 没有任何待处理变更
    Idle,
    /// 尚未静止，下次应在指定时刻再查
    NotYetStable { next_check_at: Instant },
    /// 变更已静止，交出累积的变更集
    Flush(PendingChanges),
}

/// 聚合统计
#[derive(Debug, Default, Clone)]
pub struct AggregatorStats {
    /// 收到的通知批次数
    pub batches_observed: u64,
    /// 产出候选的新增节点数
    pub nodes_added: u64,
    /// 进入待处理集合的文本条数
    pub texts_queued: u64,
    /// 因捕获一次规则被忽略的文本变化数
    pub ignored_already_captured: u64,
    /// 写回期间被压制的候选数
    pub suppressed_while_applying: u64,
    /// 冲刷次数
    pub flushes: u64,
}

/// 变更聚合器
pub struct MutationAggregator {
    initial_check_delay: Duration,
    recheck_interval: Duration,
    stability_threshold: Duration,
    phase: AggregatorPhase,
    pending: PendingChanges,
    last_change_at: Option<Instant>,
    next_check_at: Option<Instant>,
    stats: AggregatorStats,
}

impl MutationAggregator {
    pub fn new(
        initial_check_delay: Duration,
        recheck_interval: Duration,
        stability_threshold: Duration,
    ) -> Self {
        Self {
            initial_check_delay,
            recheck_interval,
            stability_threshold,
            phase: AggregatorPhase::Idle,
            pending: PendingChanges::default(),
            last_change_at: None,
            next_check_at: None,
            stats: AggregatorStats::default(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.initial_check_delay(),
            config.recheck_interval(),
            config.stability_threshold(),
        )
    }

    /// 接收一批变更通知
    ///
    /// 捕获总是执行；写回期间（防护标志置位）不累积、不排期。
    /// 任何合格的累积都会把稳定性检查重排到 `now + 首检延迟`，
    /// 包括正处于复查循环时。
    pub fn observe(
        &mut self,
        records: &[MutationRecord],
        now: Instant,
        snapshots: &mut SnapshotStore,
        memo: &TranslationMemo,
        collector: &mut TextCollector,
        guard: &ApplyGuard,
    ) {
        let applying = guard.is_applying();
        let mut qualified = false;
        self.stats.batches_observed += 1;

        for record in records {
            match record {
                MutationRecord::AddedNodes(nodes) => {
                    for node in nodes {
                        snapshots.capture_subtree(node, collector.policy(), memo);
                        let units = collector.collect_subtree(node, memo);
                        if units.is_empty() {
                            continue;
                        }
                        if applying {
                            self.stats.suppressed_while_applying += units.len() as u64;
                            continue;
                        }
                        self.pending.new_node_count += 1;
                        self.stats.nodes_added += 1;
                        for unit in units {
                            if self.pending.texts.insert(unit.text) {
                                self.stats.texts_queued += 1;
                            }
                        }
                        qualified = true;
                    }
                }
                MutationRecord::TextChanged(node) => {
                    if dom::node_text(node).is_none() {
                        continue;
                    }
                    // 捕获一次规则：有记录的节点再变文本，视为引擎写回的回声
                    if snapshots.contains(NodeKey::of(node)) {
                        self.stats.ignored_already_captured += 1;
                        continue;
                    }
                    snapshots.capture_text_if_absent(node, memo);

                    let units = collector.collect_subtree(node, memo);
                    if units.is_empty() {
                        continue;
                    }
                    if applying {
                        self.stats.suppressed_while_applying += units.len() as u64;
                        continue;
                    }
                    for unit in units {
                        if self.pending.texts.insert(unit.text) {
                            self.stats.texts_queued += 1;
                        }
                    }
                    qualified = true;
                }
            }
        }

        if qualified {
            self.last_change_at = Some(now);
            self.next_check_at = Some(now + self.initial_check_delay);
            if self.phase == AggregatorPhase::Checking {
                tracing::debug!("复查期间出现新变更，稳定性计时重置");
            }
            self.phase = AggregatorPhase::Accumulating;
        }
    }

    /// 执行一次稳定性检查
    pub fn poll(&mut self, now: Instant) -> PollOutcome {
        let next_check_at = match self.next_check_at {
            Some(at) => at,
            None => return PollOutcome::Idle,
        };
        if now < next_check_at {
            return PollOutcome::NotYetStable { next_check_at };
        }

        let last_change_at = self.last_change_at.unwrap_or(next_check_at);
        let quiet_for = now.saturating_duration_since(last_change_at);

        if quiet_for >= self.stability_threshold {
            self.phase = AggregatorPhase::Idle;
            self.next_check_at = None;
            self.last_change_at = None;
            self.stats.flushes += 1;
            let pending = std::mem::take(&mut self.pending);
            tracing::debug!(
                "变更静止 {:?}，冲刷 {} 个节点 / {} 条文本",
                quiet_for,
                pending.new_node_count,
                pending.texts.len()
            );
            PollOutcome::Flush(pending)
        } else {
            self.phase = AggregatorPhase::Checking;
            let next = now + self.recheck_interval;
            self.next_check_at = Some(next);
            PollOutcome::NotYetStable { next_check_at: next }
        }
    }

    /// 丢弃所有累积状态，回到空闲
    pub fn reset(&mut self) {
        self.phase = AggregatorPhase::Idle;
        self.pending = PendingChanges::default();
        self.last_change_at = None;
        self.next_check_at = None;
    }

    pub fn phase(&self) -> AggregatorPhase {
        self.phase
    }

    /// 下次应执行检查的时刻，空闲时为 None
    pub fn next_check_at(&self) -> Option<Instant> {
        self.next_check_at
    }

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    pub fn stats(&self) -> &AggregatorStats {
        &self.stats
    }
}
