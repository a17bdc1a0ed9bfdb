//! 页面翻译服务
//!
//! `PageTranslator` 是一个文档视图上的翻译引擎，把各个子系统组合在一起：
//!
//! - 扫描 → 分组 → 语言判断 → 优先级分层（`pipeline`）
//! - 有并发上限的层级调度（`TranslationScheduler`）
//! - 原文/译文切换（`ToggleController`）
//! - 滚动补翻和页内导航后的重新翻译（`ScrollMonitor`、`NavigationWatcher`）
//! - 状态通知（`StatusReporter`）
//!
//! ## 执行模型
//!
//! 所有操作都在同一个线程上协作执行（tokio current-thread 运行时）。
//! 会话状态保存在 `RefCell` 中，借用从不跨越 await 点。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use page_translator::page::{FlowLayout, Page, Rect};
//! use page_translator::translation::{OllamaTranslator, PageTranslator, StaticSettings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let page = Page::from_html(
//!     b"<html><body><p>Hello world</p></body></html>",
//!     None,
//!     Box::new(FlowLayout::default()),
//!     Rect::new(0.0, 0.0, 1280.0, 800.0),
//!     "https://example.com/",
//! )?;
//! let translator = PageTranslator::new(page, OllamaTranslator::new(), StaticSettings::default());
//! translator.start().await?;
//! # Ok(())
//! # }
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::page::Page;
use crate::translation::backend::Translator;
use crate::translation::config::{constants, SettingsProvider, TranslationSettings};
use crate::translation::error::TranslationResult;
use crate::translation::pipeline::{
    DocumentScanner, Language, LanguageClassifier, ParagraphSegmenter, PriorityClassifier, Region,
};
use crate::translation::registry::{EnablementRegistry, InMemoryRegistry, ViewId};
use crate::translation::status::{StatusEvent, StatusReporter, WarningKind};
use crate::translation::storage::{DisplayMode, ParagraphId, SessionState};

use super::monitor::{NavigationWatcher, ScrollMonitor};
use super::scheduler::{
    BucketOutcome, BucketReport, RunReport, SchedulerStats, SchedulerStatsSnapshot, TranslationScheduler,
};
use super::toggle::{ToggleAffordance, ToggleController};

/// 一次整页翻译的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRun {
    /// 设置中关闭了自动翻译
    Disabled,
    /// 当前域名在排除列表中
    ExcludedDomain,
    /// 没有需要翻译的段落
    NoEligibleText,
    /// 所有层级处理完毕
    Completed(RunReport),
    /// 运行被 `stop()` 中断
    Cancelled(RunReport),
}

impl PageRun {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            PageRun::Completed(report) | PageRun::Cancelled(report) => Some(report),
            _ => None,
        }
    }

    pub fn translated(&self) -> usize {
        self.report().map(RunReport::translated).unwrap_or(0)
    }
}

/// 文档变化通知的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// 地址没有变化
    Unchanged,
    /// 地址变化了，但当前视图未启用翻译
    Ignored,
    /// 会话已重置并重新翻译
    Retranslated(PageRun),
}

/// 页面翻译引擎
pub struct PageTranslator<T: Translator> {
    page: Page,
    view: ViewId,
    translator: T,
    settings: Box<dyn SettingsProvider>,
    registry: Arc<dyn EnablementRegistry>,
    status: StatusReporter,
    session: RefCell<SessionState>,
    affordance: Cell<ToggleAffordance>,
    classifier: LanguageClassifier,
    stats: SchedulerStats,
    scroll: ScrollMonitor,
    navigation: NavigationWatcher,
}

impl<T: Translator> PageTranslator<T> {
    /// 创建翻译引擎
    ///
    /// 默认使用独立的内存登记表、视图 id 0 和只写日志的状态报告器。
    pub fn new(page: Page, translator: T, settings: impl SettingsProvider + 'static) -> Self {
        let location = page.location();
        Self {
            page,
            view: ViewId(0),
            translator,
            settings: Box::new(settings),
            registry: InMemoryRegistry::shared(),
            status: StatusReporter::silent(),
            session: RefCell::new(SessionState::new()),
            affordance: Cell::new(ToggleAffordance::default()),
            classifier: LanguageClassifier::new(),
            stats: SchedulerStats::default(),
            scroll: ScrollMonitor::new(),
            navigation: NavigationWatcher::new(location),
        }
    }

    /// 使用共享的登记表，`view` 为本视图在登记表中的标识
    pub fn with_registry(mut self, registry: Arc<dyn EnablementRegistry>, view: ViewId) -> Self {
        self.registry = registry;
        self.view = view;
        self
    }

    pub fn with_status(mut self, status: StatusReporter) -> Self {
        self.status = status;
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// 会话状态的只读借用，不要跨越 await 持有
    pub fn session(&self) -> std::cell::Ref<'_, SessionState> {
        self.session.borrow()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.session.borrow().display_mode()
    }

    pub fn affordance(&self) -> ToggleAffordance {
        self.affordance.get()
    }

    pub fn last_status(&self) -> Option<StatusEvent> {
        self.status.last()
    }

    pub fn stats(&self) -> SchedulerStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn scroll_monitor(&self) -> &ScrollMonitor {
        &self.scroll
    }

    pub fn is_enabled(&self) -> bool {
        self.registry.is_enabled(self.view)
    }

    /// 用户发起翻译
    ///
    /// 在登记表中启用本视图，开始监视页内导航，然后执行整页翻译。
    pub async fn start(&self) -> TranslationResult<PageRun> {
        self.registry.enable(self.view);
        self.navigation.arm(&self.page.location());
        tracing::info!("{} 开始翻译: {}", self.view, self.page.location());
        self.translate_page().await
    }

    /// 整页翻译
    ///
    /// 读取设置快照，扫描并分层后按层级顺序翻译。页面上已经显示译文时，
    /// 先恢复原文再重新扫描。
    ///
    /// # 错误
    ///
    /// 只有设置加载失败会返回错误；单个段落的失败记录为警告。
    pub async fn translate_page(&self) -> TranslationResult<PageRun> {
        let settings = match self.settings.load() {
            Ok(settings) => settings,
            Err(error) => {
                self.status.report(StatusEvent::Error {
                    message: error.to_string(),
                });
                return Err(error);
            }
        };

        if !settings.auto_translate {
            tracing::info!("自动翻译已关闭，跳过");
            return Ok(PageRun::Disabled);
        }

        let location = self.page.location();
        if settings.excludes(&location) {
            tracing::info!("域名已排除，跳过翻译: {}", location);
            self.status.report(StatusEvent::Warning(WarningKind::ExcludedDomain));
            return Ok(PageRun::ExcludedDomain);
        }

        {
            let mut session = self.session.borrow_mut();
            if session.display_mode() == DisplayMode::Translated && !session.translated_ids().is_empty() {
                ToggleController::restore_originals(&session);
            }
            session.begin_run(settings.clone());
        }

        self.status.report(StatusEvent::Translating);
        self.set_affordance(|affordance| affordance.show(DisplayMode::Translated));

        let tiers = self.prepare_tiers(&settings);
        let total: usize = tiers.iter().map(|(_, ids)| ids.len()).sum();
        if total == 0 {
            self.status.report(StatusEvent::Warning(WarningKind::NoEligibleText));
            return Ok(PageRun::NoEligibleText);
        }

        let scheduler = TranslationScheduler::new(&self.translator, &self.session, &self.stats);
        let report = scheduler
            .run_tiers(tiers, &settings, &mut |done| {
                self.status.report(StatusEvent::Progress { done, total })
            })
            .await;

        if report.cancelled() {
            tracing::info!("翻译已中断: 完成 {}/{}", report.translated(), total);
            return Ok(PageRun::Cancelled(report));
        }

        if report.translated() == 0 {
            self.status.report(StatusEvent::Warning(WarningKind::NothingTranslated));
        } else {
            self.status.report(StatusEvent::Success {
                translated: report.translated(),
            });
        }

        tracing::info!(
            "整页翻译完成: 成功 {}, 失败 {}, 共 {}",
            report.translated(),
            report.failed(),
            total
        );
        Ok(PageRun::Completed(report))
    }

    /// 扫描文档并把合格段落登记到会话，返回按层级顺序排列的段落 id
    fn prepare_tiers(&self, settings: &TranslationSettings) -> Vec<(Region, Vec<ParagraphId>)> {
        self.page.invalidate_layout();
        let body = self.page.body();

        let mut scanner = DocumentScanner::new();
        let fragments = scanner.scan(&body, self.session.borrow_mut().arena_mut());
        tracing::info!("收集到 {} 个文本片段", fragments.len());

        let drafts = ParagraphSegmenter::default().segment(fragments);
        let primary = self.classifier.analyze(&drafts).primary();
        let target = Language::from_code(&settings.target_language);
        tracing::info!("主要语言: {}, 目标语言: {}", primary, target);

        let priority = PriorityClassifier::new(&self.page);
        let mut tiers: BTreeMap<Region, Vec<ParagraphId>> = BTreeMap::new();
        let mut session = self.session.borrow_mut();

        for draft in drafts {
            if !self.classifier.is_eligible(&draft, primary, target) {
                continue;
            }
            let language = self.classifier.detect(&draft.combined_text);
            let region = draft
                .anchor()
                .map(|anchor| priority.classify(anchor))
                .unwrap_or(Region::NonMain);
            let id = session.insert_paragraph(draft, language, region);
            tiers.entry(region).or_default().push(id);
        }

        let tiers: Vec<(Region, Vec<ParagraphId>)> = Region::ORDER
            .iter()
            .map(|region| (*region, tiers.remove(region).unwrap_or_default()))
            .collect();

        tracing::info!(
            "段落分层: 可见主要内容 {}, 不可见主要内容 {}, 非主要内容 {}",
            tiers[0].1.len(),
            tiers[1].1.len(),
            tiers[2].1.len()
        );
        tiers
    }

    /// 停止翻译
    ///
    /// 设置取消标志，恢复已翻译段落的原文，移除切换按钮并在登记表中停用本视图。
    /// 已经发出的请求返回后结果被丢弃。
    pub fn stop(&self) {
        {
            let mut session = self.session.borrow_mut();
            session.cancel();
            let restored = ToggleController::restore_originals(&session);
            session.set_display_mode(DisplayMode::Original);
            tracing::info!("{} 停止翻译，恢复 {} 个片段", self.view, restored);
        }

        self.set_affordance(ToggleAffordance::remove);
        self.registry.disable(self.view);
        self.status.report(StatusEvent::Stopped);
    }

    /// 切换原文/译文显示，没有切换按钮时不做任何事
    pub fn toggle(&self) -> Option<DisplayMode> {
        if !self.affordance.get().is_present() {
            return None;
        }

        let mode = {
            let mut session = self.session.borrow_mut();
            let mode = session.display_mode().flipped();
            ToggleController::apply(&mut session, mode);
            mode
        };
        self.set_affordance(|affordance| affordance.set_mode(mode));
        tracing::info!("切换显示模式: {:?}", mode);
        Some(mode)
    }

    /// 滚动补翻
    ///
    /// 把当前在视口内、尚未翻译（或失败过）的段落作为一个层级翻译。
    /// 会话没有设置快照、已取消或没有候选段落时返回 `None`。
    pub async fn sweep(&self) -> Option<BucketReport> {
        let (settings, ids) = {
            let session = self.session.borrow();
            if session.is_cancelled() {
                return None;
            }
            let settings = session.settings()?.clone();

            self.page.invalidate_layout();
            let ids: Vec<ParagraphId> = session
                .pending_ids()
                .into_iter()
                .filter(|id| {
                    session
                        .paragraph(*id)
                        .and_then(|unit| unit.anchor())
                        .is_some_and(|anchor| self.page.is_in_viewport(anchor))
                })
                .collect();
            (settings, ids)
        };

        if ids.is_empty() {
            return None;
        }

        tracing::info!("滚动检测: {} 个未翻译段落进入视口", ids.len());
        self.status.report(StatusEvent::SweepStarted { count: ids.len() });

        let scheduler = TranslationScheduler::new(&self.translator, &self.session, &self.stats);
        let report = scheduler.run_bucket(None, ids, &settings, &mut |_| {}).await;

        if report.outcome == BucketOutcome::Drained {
            self.status.report(StatusEvent::SweepFinished {
                translated: report.translated,
            });
        }
        Some(report)
    }

    /// 记录一次滚动事件
    pub fn notify_scroll(&self) {
        self.scroll.notify_scroll();
    }

    /// 滚动监视循环，直到 `shutdown()` 被调用
    pub async fn watch_scroll(&self) {
        let sweeps = async {
            while self.scroll.next_trigger().await {
                self.sweep().await;
                self.scroll.finish_sweep();
            }
        };
        futures::join!(self.scroll.debounce_loop(), sweeps);
        tracing::debug!("滚动监视已结束");
    }

    /// 停止滚动监视
    pub fn shutdown(&self) {
        self.scroll.shutdown();
    }

    /// 文档发生变化时调用
    ///
    /// 地址变化且本视图已启用时，重置会话，等待 `NAVIGATION_SETTLE` 后重新整页翻译。
    pub async fn observe_mutation(&self) -> TranslationResult<NavigationOutcome> {
        let current = self.page.location();
        if !self.navigation.observe(&current) {
            return Ok(NavigationOutcome::Unchanged);
        }

        if !self.navigation.is_armed() || !self.registry.is_enabled(self.view) {
            tracing::debug!("检测到页内导航，但 {} 未启用翻译", self.view);
            return Ok(NavigationOutcome::Ignored);
        }

        tracing::info!("检测到页内导航: {}", current);
        self.session.borrow_mut().reset();

        tokio::time::sleep(constants::NAVIGATION_SETTLE).await;
        let run = self.translate_page().await?;
        Ok(NavigationOutcome::Retranslated(run))
    }

    fn set_affordance(&self, update: impl FnOnce(&mut ToggleAffordance)) {
        let mut affordance = self.affordance.get();
        update(&mut affordance);
        self.affordance.set(affordance);
    }
}

impl<T: Translator> std::fmt::Debug for PageTranslator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTranslator")
            .field("view", &self.view)
            .field("page", &self.page)
            .field("affordance", &self.affordance.get())
            .finish_non_exhaustive()
    }
}
