//! # 翻译同步引擎
//!
//! 这个模块是整个 crate 的协调核心，把快照存储、译文记忆、变更
//! 聚合、指纹去重和翻译派发组装成一台对宿主只暴露少数入口的机器。
//!
//! ## 主要功能
//! - **整页翻译**: `translate` 捕获原文、收集候选、派发翻译并写回
//! - **原文还原**: `restore` 按快照恢复原文并清空会话
//! - **动态内容跟进**: `observe_mutations` + `process_pending` 消化
//!   宿主上报的 DOM 变更，静止后自动补译
//! - **跨页会话**: 译文记忆与激活状态在 `navigate_to` 之后存活，
//!   新页面直接复用已有译文
//!
//! ## 线程模型
//! DOM 句柄是 `Rc` 共享的，引擎整体**不是** `Send`，设计上所有
//! DOM 读写都发生在同一个逻辑线程里；只有提供方的网络请求是真正
//! 的异步点。宿主用 `observe_mutations` 送入事实，用
//! `poll_pending` 驱动检查：冲刷产出的 [`FetchJob`] 自持提供方
//! 句柄，在引擎之外等待，期间观察与新的冲刷照常进行，结果经
//! `apply_fetched` 交回。`process_pending` 与 `run_until_idle`
//! 是不需要重叠时的串行封装，都不会在内部另起线程。
//!
//! ## 错误处理
//! 提供方失败（包括空结果）只影响当轮派发：记忆、快照与会话
//! 激活状态保持一致，后续操作照常进行。

pub mod applier;
pub mod dispatcher;
pub mod guard;
pub mod session;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use markup5ever_rcdom::{Handle, RcDom};
use url::Url;

use crate::config::SyncConfig;
use crate::dom;
use crate::error::{helpers, SyncResult};
use crate::pipeline::{MutationAggregator, MutationRecord, PollOutcome, TextCollector};
use crate::provider::TranslateProvider;
use crate::storage::{change_fingerprint, FingerprintCache, SnapshotStore};

pub use applier::ApplyOutcome;
pub use dispatcher::{DispatchReport, FetchJob, TranslationDispatcher};
pub use guard::ApplyGuard;
pub use session::SessionState;

/// `translate` 的结果摘要
#[derive(Debug, Default, Clone, Copy)]
pub struct TranslateReport {
    /// 本次新捕获的快照条数
    pub captured: usize,
    /// 收集到的候选文本条数
    pub collected: usize,
    /// 记忆直接命中的条数
    pub memo_hits: usize,
    /// 提供方返回的译文条数
    pub fetched: usize,
    /// 写回改动的节点数
    pub applied_nodes: usize,
}

/// 一次冲刷的去向
///
/// 记忆命中的部分在冲刷当场写回；未命中的部分打包成
/// [`FetchJob`]，由宿主在引擎之外执行，结果经
/// [`apply_fetched`](TranslationEngine::apply_fetched) 交回。
pub struct FlushOutcome {
    /// 命中部分的写回结果
    pub report: DispatchReport,
    /// 未命中部分的待执行请求；`None` 表示全部命中，本轮已完成
    pub fetch: Option<FetchJob>,
}

/// `restore` 的结果摘要
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// 恢复原文的节点数
    pub restored_nodes: usize,
    /// 快照不可用，宿主应整页重新加载
    pub reload_required: bool,
    /// 当前页面地址，重新加载时使用
    pub page_url: Option<Url>,
}

/// 引擎级统计
#[derive(Debug, Default, Clone)]
pub struct EngineStats {
    /// 成功的整页翻译次数
    pub translates: u64,
    /// 还原次数
    pub restores: u64,
    /// 成功的增量冲刷次数
    pub flushes: u64,
    /// 被指纹去重拦下的冲刷次数
    pub duplicate_flushes: u64,
    /// 提供方失败次数
    pub provider_failures: u64,
}

/// 翻译同步引擎
///
/// 持有页面 DOM 根句柄和全部内部状态。引擎需要 `&mut self` 驱动，
/// 本身不跨线程共享；提供方通过 `Arc<dyn TranslateProvider>` 注入。
pub struct TranslationEngine {
    config: SyncConfig,
    root: Handle,
    session: SessionState,
    snapshots: SnapshotStore,
    fingerprints: FingerprintCache,
    aggregator: MutationAggregator,
    collector: TextCollector,
    dispatcher: TranslationDispatcher,
    guard: ApplyGuard,
    stats: EngineStats,
}

impl TranslationEngine {
    /// 创建引擎
    ///
    /// 配置先行校验，非法配置直接拒绝。
    pub fn new(
        root: Handle,
        provider: Arc<dyn TranslateProvider>,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        config.validate()?;
        let collector = TextCollector::from_config(&config);
        let aggregator = MutationAggregator::from_config(&config);
        let fingerprints = FingerprintCache::new(config.fingerprint_capacity);
        let dispatcher = TranslationDispatcher::new(provider);
        tracing::info!(provider = dispatcher.provider_name(), "翻译同步引擎就绪");
        Ok(Self {
            config,
            root,
            session: SessionState::new(),
            snapshots: SnapshotStore::new(),
            fingerprints,
            aggregator,
            collector,
            dispatcher,
            guard: ApplyGuard::new(),
            stats: EngineStats::default(),
        })
    }

    /// 解析 HTML 字符串并在其 body 上创建引擎
    pub fn from_html(
        html: &str,
        provider: Arc<dyn TranslateProvider>,
        config: SyncConfig,
    ) -> SyncResult<(RcDom, Self)> {
        let dom_tree = dom::parse_html(html);
        let root = dom::find_body(&dom_tree);
        let engine = Self::new(root, provider, config)?;
        Ok((dom_tree, engine))
    }

    /// 当前页面根句柄
    pub fn root(&self) -> Handle {
        self.root.clone()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// 翻译整个页面
    ///
    /// 流程：快照捕获 → 候选收集 → 派发（记忆命中先写回，
    /// 未命中合成一次提供方调用）→ 会话激活。页面没有候选文本时
    /// 返回全零报告且**不**激活会话；派发失败时会话保持原状，
    /// 原样重试即可。
    pub async fn translate(&mut self) -> SyncResult<TranslateReport> {
        let captured = self.snapshots.capture_subtree(
            &self.root,
            self.collector.policy(),
            self.session.memo(),
        );
        let units = self.collector.collect_subtree(&self.root, self.session.memo());
        let texts: BTreeSet<String> = units.into_iter().map(|unit| unit.text).collect();

        if texts.is_empty() {
            tracing::debug!("页面没有可翻译文本");
            return Ok(TranslateReport {
                captured,
                ..TranslateReport::default()
            });
        }
        let collected = texts.len();

        let result = self
            .dispatcher
            .dispatch(
                &self.root,
                &texts,
                self.session.memo_mut(),
                &mut self.snapshots,
                &self.guard,
                self.collector.policy(),
            )
            .await;

        match result {
            Ok(report) => {
                self.session.activate();
                self.stats.translates += 1;
                tracing::info!(
                    collected,
                    memo_hits = report.memo_hits,
                    fetched = report.fetched,
                    applied = report.applied_nodes,
                    "整页翻译完成"
                );
                Ok(TranslateReport {
                    captured,
                    collected,
                    memo_hits: report.memo_hits,
                    fetched: report.fetched,
                    applied_nodes: report.applied_nodes,
                })
            }
            Err(error) => {
                self.stats.provider_failures += 1;
                helpers::log_error(&error, "整页翻译");
                Err(error)
            }
        }
    }

    /// 还原整个页面
    ///
    /// 会话未激活时没有可还原的内容，报告 `reload_required`，
    /// 由宿主决定是否整页重新加载。还原总是成功：逐节点写回快照
    /// 原文，然后清空快照、指纹、聚合器和会话记忆。
    pub fn restore(&mut self) -> RestoreReport {
        if !self.session.is_active() {
            tracing::debug!("会话未激活，还原退化为整页重载");
            return RestoreReport {
                restored_nodes: 0,
                reload_required: true,
                page_url: self.session.page_url().cloned(),
            };
        }

        let restored = {
            let _scope = self.guard.enter();
            self.snapshots
                .restore_subtree(&self.root, self.collector.policy())
        };

        self.snapshots.clear();
        self.fingerprints.clear();
        self.aggregator.reset();
        self.session.deactivate_and_clear();
        self.stats.restores += 1;
        tracing::info!(restored, "页面已还原为原文");

        RestoreReport {
            restored_nodes: restored,
            reload_required: false,
            page_url: self.session.page_url().cloned(),
        }
    }

    /// 接收宿主上报的 DOM 变更
    ///
    /// 会话未激活时整批忽略。`now` 由宿主提供，状态机不读时钟。
    pub fn observe_mutations(&mut self, records: &[MutationRecord], now: Instant) {
        if !self.session.is_active() {
            tracing::debug!(count = records.len(), "会话未激活，忽略变更通知");
            return;
        }
        self.aggregator.observe(
            records,
            now,
            &mut self.snapshots,
            self.session.memo(),
            &mut self.collector,
            &self.guard,
        );
    }

    /// 执行一次稳定性检查，必要时开启增量派发
    ///
    /// 返回 `Some(outcome)` 表示本次真的冲刷了：记忆命中的部分
    /// 已经写回，`outcome.fetch` 里是未命中部分的待执行请求。
    /// 请求自持提供方句柄，不借用引擎——等待它完成期间宿主可以
    /// 继续 [`observe_mutations`](Self::observe_mutations)，多个
    /// 请求也可以同时在途，结果按完成顺序经
    /// [`apply_fetched`](Self::apply_fetched) 交回。
    /// `None` 覆盖其余所有情况：空闲、未静止、指纹重复。
    pub fn poll_pending(&mut self, now: Instant) -> Option<FlushOutcome> {
        if !self.session.is_active() {
            return None;
        }

        let pending = match self.aggregator.poll(now) {
            PollOutcome::Flush(pending) => pending,
            PollOutcome::Idle | PollOutcome::NotYetStable { .. } => return None,
        };

        self.snapshots.purge_detached();

        let fingerprint = change_fingerprint(
            pending.new_node_count,
            &pending.texts,
            self.config.fingerprint_sample_limit,
        );
        if !self.fingerprints.check_and_insert(fingerprint) {
            self.stats.duplicate_flushes += 1;
            tracing::debug!("变更指纹重复，跳过本轮冲刷");
            return None;
        }

        if pending.texts.is_empty() {
            return None;
        }

        let (report, fetch) = self.dispatcher.begin(
            &self.root,
            &pending.texts,
            self.session.memo_mut(),
            &mut self.snapshots,
            &self.guard,
            self.collector.policy(),
        );
        self.stats.flushes += 1;
        if fetch.is_none() {
            tracing::info!(
                requested = report.requested,
                applied = report.applied_nodes,
                "增量翻译完成，全部命中记忆"
            );
        }
        Some(FlushOutcome { report, fetch })
    }

    /// 交回一次提供方请求的结果
    ///
    /// 结果按完成顺序交回即可，与请求发起顺序无关：写回只查
    /// （合并之后的）记忆，晚到的结果不会覆盖新译文。会话在请求
    /// 在途期间被还原或停用时，结果作废并返回全零报告——记忆已
    /// 清空，译文没有归宿。
    pub fn apply_fetched(
        &mut self,
        fetched: SyncResult<HashMap<String, String>>,
    ) -> SyncResult<DispatchReport> {
        if !self.session.is_active() {
            tracing::debug!("会话已停用，丢弃迟到的翻译结果");
            return Ok(DispatchReport::default());
        }

        let fetched = match fetched {
            Ok(map) => map,
            Err(error) => {
                self.stats.provider_failures += 1;
                helpers::log_error(&error, "增量翻译");
                return Err(error);
            }
        };

        match self.dispatcher.complete(
            &self.root,
            fetched,
            self.session.memo_mut(),
            &mut self.snapshots,
            &self.guard,
            self.collector.policy(),
        ) {
            Ok(report) => {
                tracing::info!(
                    fetched = report.fetched,
                    applied = report.applied_nodes,
                    "增量翻译完成"
                );
                Ok(report)
            }
            Err(error) => {
                self.stats.provider_failures += 1;
                helpers::log_error(&error, "增量翻译");
                Err(error)
            }
        }
    }

    /// 执行一次稳定性检查，必要时就地完成增量翻译
    ///
    /// [`poll_pending`](Self::poll_pending) + [`FetchJob::fetch`] +
    /// [`apply_fetched`](Self::apply_fetched) 的串行便捷封装：等待
    /// 提供方期间持有引擎借用，适合不需要重叠观察的宿主。返回
    /// `Ok(Some(report))` 表示本次真的冲刷并派发了。
    pub async fn process_pending(&mut self, now: Instant) -> SyncResult<Option<DispatchReport>> {
        let outcome = match self.poll_pending(now) {
            Some(outcome) => outcome,
            None => return Ok(None),
        };

        let mut report = outcome.report;
        if let Some(job) = outcome.fetch {
            let fetched = job.fetch().await;
            let fetch_report = self.apply_fetched(fetched)?;
            report.fetched = fetch_report.fetched;
            report.merged = fetch_report.merged;
            report.applied_nodes += fetch_report.applied_nodes;
        }
        Ok(Some(report))
    }

    /// 用真实时钟驱动检查循环，直到没有待处理变更
    ///
    /// 阻塞式便捷方法，内部按 [`next_check_at`](Self::next_check_at)
    /// 睡眠。首个派发错误会中断循环并原样返回。
    pub async fn run_until_idle(&mut self) -> SyncResult<Vec<DispatchReport>> {
        let mut reports = Vec::new();
        while let Some(at) = self.aggregator.next_check_at() {
            let wait = at.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            if let Some(report) = self.process_pending(Instant::now()).await? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// 切换到新页面
    ///
    /// 清空按节点的状态（快照、指纹、聚合器），保留译文记忆与
    /// 会话激活标志。返回会话是否仍激活，激活时宿主应随即调用
    /// [`translate`](Self::translate) 让新页面立即套用已有译文。
    pub fn navigate_to(&mut self, root: Handle, url: Option<Url>) -> bool {
        self.root = root;
        self.snapshots.clear();
        self.fingerprints.clear();
        self.aggregator.reset();
        self.collector.reset_stats();
        self.session.set_page_url(url);
        tracing::debug!(
            active = self.session.is_active(),
            memo = self.session.memo().len(),
            "切换页面"
        );
        self.session.is_active()
    }

    /// 下次稳定性检查的时刻，空闲时为 None
    pub fn next_check_at(&self) -> Option<Instant> {
        self.aggregator.next_check_at()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// 页面当前是否处于已翻译状态
    pub fn is_translated(&self) -> bool {
        self.session.is_active()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }
}
