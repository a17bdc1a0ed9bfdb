//! 翻译调度器
//!
//! 按优先级层级依次处理段落。每个层级内部维护一个等待队列和一个并发上限为
//! `MAX_CONCURRENT_TRANSLATIONS` 的运行集合：任意一个任务完成后立即补位，
//! 直到队列和运行集合都为空才进入下一个层级。
//!
//! ## 取消
//!
//! 每次循环迭代都会检查取消标志。取消后不再派发新任务，已经发出的请求继续
//! 被驱动到完成，但结果在写入文档前会再次检查取消标志并被丢弃。
//! 后续层级整体跳过。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::translation::backend::Translator;
use crate::translation::config::{constants, TranslationSettings};
use crate::translation::error::{log_error, TranslationError, TranslationResult};
use crate::translation::pipeline::Region;
use crate::translation::storage::{Completion, ParagraphId, SessionState};

/// 一个层级的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOutcome {
    /// 队列中的段落全部处理完毕
    Drained,
    /// 处理中途被取消，或因取消未开始
    Abandoned,
}

/// 单个层级的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketReport {
    /// 滚动补翻的层级为 `None`
    pub region: Option<Region>,
    pub outcome: BucketOutcome,
    pub queued: usize,
    pub dispatched: usize,
    pub translated: usize,
    pub failed: usize,
    pub discarded: usize,
}

impl BucketReport {
    fn new(region: Option<Region>, queued: usize) -> Self {
        Self {
            region,
            outcome: BucketOutcome::Drained,
            queued,
            dispatched: 0,
            translated: 0,
            failed: 0,
            discarded: 0,
        }
    }

    fn label(&self) -> &'static str {
        self.region.map(|region| region.label()).unwrap_or("sweep")
    }
}

/// 一次运行（整页翻译或滚动补翻）的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub buckets: Vec<BucketReport>,
}

impl RunReport {
    pub fn candidates(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.queued).sum()
    }

    pub fn translated(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.translated).sum()
    }

    pub fn failed(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.failed).sum()
    }

    pub fn cancelled(&self) -> bool {
        self.buckets
            .iter()
            .any(|bucket| bucket.outcome == BucketOutcome::Abandoned)
    }
}

/// 调度统计，在翻译器的整个生命周期内累计
#[derive(Debug, Default)]
pub struct SchedulerStats {
    pub dispatched: AtomicUsize,
    pub succeeded: AtomicUsize,
    pub failed: AtomicUsize,
    pub discarded: AtomicUsize,
    /// 观察到的最大同时在途任务数
    pub peak_in_flight: AtomicUsize,
}

impl SchedulerStats {
    pub fn inc_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_in_flight(&self, in_flight: usize) {
        self.peak_in_flight.fetch_max(in_flight, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::Relaxed),
        }
    }
}

/// 调度统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStatsSnapshot {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub discarded: usize,
    pub peak_in_flight: usize,
}

/// 层级调度器
pub struct TranslationScheduler<'a, T: Translator> {
    translator: &'a T,
    session: &'a RefCell<SessionState>,
    stats: &'a SchedulerStats,
    max_concurrent: usize,
}

impl<'a, T: Translator> TranslationScheduler<'a, T> {
    pub fn new(translator: &'a T, session: &'a RefCell<SessionState>, stats: &'a SchedulerStats) -> Self {
        Self {
            translator,
            session,
            stats,
            max_concurrent: constants::MAX_CONCURRENT_TRANSLATIONS,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// 按顺序处理各个层级
    ///
    /// 每当有段落翻译成功，`on_translated` 收到本次运行累计的成功数。
    pub async fn run_tiers(
        &self,
        tiers: Vec<(Region, Vec<ParagraphId>)>,
        settings: &TranslationSettings,
        on_translated: &mut dyn FnMut(usize),
    ) -> RunReport {
        let mut report = RunReport::default();
        let mut translated_so_far = 0;

        for (region, ids) in tiers {
            let bucket = if self.session.borrow().is_cancelled() {
                let mut skipped = BucketReport::new(Some(region), ids.len());
                skipped.outcome = BucketOutcome::Abandoned;
                skipped
            } else {
                tracing::info!("开始翻译层级 {}: {} 个段落", region.label(), ids.len());
                let base = translated_so_far;
                let bucket = self
                    .run_bucket(Some(region), ids, settings, &mut |n| on_translated(base + n))
                    .await;
                translated_so_far += bucket.translated;
                bucket
            };

            report.buckets.push(bucket);
        }

        report
    }

    /// 处理单个层级
    pub async fn run_bucket(
        &self,
        region: Option<Region>,
        ids: Vec<ParagraphId>,
        settings: &TranslationSettings,
        on_translated: &mut dyn FnMut(usize),
    ) -> BucketReport {
        let start = Instant::now();
        let mut report = BucketReport::new(region, ids.len());
        let mut pending: VecDeque<ParagraphId> = ids.into();
        let mut running = FuturesUnordered::new();

        loop {
            let cancelled = self.session.borrow().is_cancelled();
            if cancelled {
                if !pending.is_empty() {
                    tracing::debug!("层级 {} 已取消，{} 个段落未派发", report.label(), pending.len());
                    pending.clear();
                }
                report.outcome = BucketOutcome::Abandoned;
            } else {
                while running.len() < self.max_concurrent {
                    let Some(id) = pending.pop_front() else {
                        break;
                    };
                    let text = self.session.borrow_mut().begin_dispatch(id);
                    if let Some(text) = text {
                        report.dispatched += 1;
                        self.stats.inc_dispatched();
                        running.push(self.run_task(id, text, settings));
                    }
                }
                self.stats.observe_in_flight(running.len());
            }

            let Some((id, result)) = running.next().await else {
                break;
            };

            match result {
                Ok(translated) => {
                    let completion = self.session.borrow_mut().complete_success(id, &translated);
                    match completion {
                        Completion::Applied => {
                            report.translated += 1;
                            self.stats.inc_succeeded();
                            tracing::debug!("{} 翻译完成", id);
                            on_translated(report.translated);
                        }
                        Completion::Discarded => {
                            report.discarded += 1;
                            self.stats.inc_discarded();
                            tracing::debug!("{} 的译文因取消被丢弃", id);
                        }
                        Completion::Unknown => {
                            tracing::debug!("{} 已不在会话中，忽略译文", id);
                        }
                    }
                }
                Err(error) => {
                    self.session.borrow_mut().complete_failure(id);
                    report.failed += 1;
                    self.stats.inc_failed();
                    log_error(format_args!("{} 翻译失败", id), &error);
                }
            }
        }

        tracing::info!(
            "层级 {} 结束: 成功 {}, 失败 {}, 丢弃 {}, 用时 {:?}",
            report.label(),
            report.translated,
            report.failed,
            report.discarded,
            start.elapsed()
        );
        report
    }

    async fn run_task(
        &self,
        id: ParagraphId,
        text: String,
        settings: &TranslationSettings,
    ) -> (ParagraphId, TranslationResult<String>) {
        tracing::debug!("{} 开始翻译 ({} 字符)", id, text.chars().count());
        let result = match self.translator.translate(&text, settings).await {
            Ok(translated) if translated.trim().is_empty() => Err(TranslationError::EmptyResponse),
            other => other,
        };
        (id, result)
    }
}
