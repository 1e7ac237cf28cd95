//! 翻译派发
//!
//! 把一次冲刷的候选文本拆成记忆命中与未命中两部分：
//! 命中的译文先行写回（不等网络），未命中的合成**一次**提供方
//! 调用。提供方返回空映射按可恢复错误处理，记忆不会被污染，
//! 下一轮冲刷可以原样重试。
//!
//! 派发是两段式的：[`begin`](TranslationDispatcher::begin) 分拣并
//! 产出自持提供方句柄的 [`FetchJob`]，网络往返不占用引擎的任何
//! 借用；[`complete`](TranslationDispatcher::complete) 把结果合并
//! 写回。多个请求可以同时在途，结果按完成顺序交回即可。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use markup5ever_rcdom::Handle;

use crate::dom::ScanPolicy;
use crate::engine::applier::{self, ApplyOutcome};
use crate::engine::guard::ApplyGuard;
use crate::error::{SyncError, SyncResult};
use crate::provider::TranslateProvider;
use crate::storage::{SnapshotStore, TranslationMemo};

/// 一次派发的结果
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchReport {
    /// 请求翻译的文本条数
    pub requested: usize,
    /// 记忆直接命中的条数
    pub memo_hits: usize,
    /// 提供方返回的译文条数
    pub fetched: usize,
    /// 实际并入记忆的条数
    pub merged: usize,
    /// 写回改动的节点数
    pub applied_nodes: usize,
}

/// 派发统计
#[derive(Debug, Default, Clone)]
pub struct DispatcherStats {
    /// 完成的派发次数
    pub dispatches: u64,
    /// 提供方调用次数
    pub provider_calls: u64,
    /// 提供方返回空结果的次数
    pub empty_results: u64,
    /// 从提供方取得的译文总条数
    pub texts_fetched: u64,
}

/// 待执行的提供方请求
///
/// 自持提供方句柄与文本清单，不借用引擎的任何状态：宿主可以在
/// 等待它完成的同时继续上报变更，也可以让多个请求同时在途。
pub struct FetchJob {
    provider: Arc<dyn TranslateProvider>,
    texts: Vec<String>,
}

impl FetchJob {
    /// 本次请求携带的文本（字典序）
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// 执行网络往返
    ///
    /// 只调用提供方，不触碰引擎状态；空映射的判定留给合并阶段。
    pub async fn fetch(self) -> SyncResult<HashMap<String, String>> {
        tracing::debug!(
            provider = self.provider.name(),
            count = self.texts.len(),
            "请求批量翻译"
        );
        self.provider.translate_batch(&self.texts).await
    }
}

/// 翻译派发器
pub struct TranslationDispatcher {
    provider: Arc<dyn TranslateProvider>,
    stats: DispatcherStats,
}

impl TranslationDispatcher {
    pub fn new(provider: Arc<dyn TranslateProvider>) -> Self {
        Self {
            provider,
            stats: DispatcherStats::default(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// 第一阶段：分拣候选并写回记忆命中
    ///
    /// 命中部分立即落地，网络慢或失败都不影响它们。未命中部分
    /// 打包成一个 [`FetchJob`] 交给调用方执行；全部命中时返回
    /// `None`，本轮派发就此完成。
    pub fn begin(
        &mut self,
        root: &Handle,
        texts: &BTreeSet<String>,
        memo: &mut TranslationMemo,
        snapshots: &mut SnapshotStore,
        guard: &ApplyGuard,
        policy: &ScanPolicy,
    ) -> (DispatchReport, Option<FetchJob>) {
        let mut memo_hits = 0;
        let mut to_fetch = Vec::new();
        for text in texts {
            if memo.lookup(text).is_some() {
                memo_hits += 1;
            } else {
                to_fetch.push(text.clone());
            }
        }

        let mut outcome = ApplyOutcome::default();
        if memo_hits > 0 {
            outcome.merge(applier::apply_translations(
                root, memo, snapshots, guard, policy,
            ));
        }

        let report = DispatchReport {
            requested: texts.len(),
            memo_hits,
            fetched: 0,
            merged: 0,
            applied_nodes: outcome.nodes_changed,
        };

        if to_fetch.is_empty() {
            self.stats.dispatches += 1;
            return (report, None);
        }

        self.stats.provider_calls += 1;
        let job = FetchJob {
            provider: self.provider.clone(),
            texts: to_fetch,
        };
        (report, Some(job))
    }

    /// 第二阶段：合并提供方结果并写回
    ///
    /// 空映射按约定视为本批失败，记忆保持原样。
    pub fn complete(
        &mut self,
        root: &Handle,
        fetched: HashMap<String, String>,
        memo: &mut TranslationMemo,
        snapshots: &mut SnapshotStore,
        guard: &ApplyGuard,
        policy: &ScanPolicy,
    ) -> SyncResult<DispatchReport> {
        if fetched.is_empty() {
            self.stats.empty_results += 1;
            tracing::warn!(
                provider = self.provider.name(),
                "提供方返回空结果，本轮放弃"
            );
            return Err(SyncError::EmptyProviderResult);
        }

        let fetched_count = fetched.len();
        let merged = memo.merge(&fetched);
        self.stats.texts_fetched += fetched_count as u64;
        let outcome = applier::apply_translations(root, memo, snapshots, guard, policy);
        self.stats.dispatches += 1;

        Ok(DispatchReport {
            requested: fetched_count,
            memo_hits: 0,
            fetched: fetched_count,
            merged,
            applied_nodes: outcome.nodes_changed,
        })
    }

    /// 便捷封装：就地等待请求完成
    ///
    /// `begin` + [`FetchJob::fetch`] + `complete` 的串行组合，等待
    /// 期间持有全部借用。需要在请求在途时继续观察变更的调用方
    /// 应改用两段式。
    pub async fn dispatch(
        &mut self,
        root: &Handle,
        texts: &BTreeSet<String>,
        memo: &mut TranslationMemo,
        snapshots: &mut SnapshotStore,
        guard: &ApplyGuard,
        policy: &ScanPolicy,
    ) -> SyncResult<DispatchReport> {
        let (mut report, job) = self.begin(root, texts, memo, snapshots, guard, policy);
        if let Some(job) = job {
            let fetched = job.fetch().await?;
            let fetch_report = self.complete(root, fetched, memo, snapshots, guard, policy)?;
            report.fetched = fetch_report.fetched;
            report.merged = fetch_report.merged;
            report.applied_nodes += fetch_report.applied_nodes;
        }
        Ok(report)
    }

    pub fn stats(&self) -> &DispatcherStats {
        &self.stats
    }
}
