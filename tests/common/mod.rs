// 集成测试公共模块
//
// 提供页面夹具、可编排的翻译器和记录调用的登记表

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use page_translator::page::{DeclaredLayout, Page, Rect};
use page_translator::translation::{
    EnablementRegistry, InMemoryRegistry, OllamaTranslator, PageTranslator, StaticSettings,
    StatusEvent, TranslationError, TranslationResult, TranslationSettings, Translator, ViewId,
};
use tokio::sync::mpsc::UnboundedReceiver;

pub const VIEWPORT: Rect = Rect::new(0.0, 0.0, 1000.0, 800.0);
pub const LOCATION: &str = "https://example.com/articles/1";

/// HTML 夹具
pub struct HtmlFixtures;

impl HtmlFixtures {
    /// 3 个可见主要段落、2 个视口外主要段落、1 个导航段落
    pub fn tiered_page() -> String {
        r#"<html><head><title>Tiered</title></head><body>
<nav><a href="/" data-rect="0 0 200 20">Navigation home link</a></nav>
<main>
<p data-rect="0 100 800 20">Visible paragraph one</p>
<p data-rect="0 200 800 20">Visible paragraph two</p>
<p data-rect="0 300 800 20">Visible paragraph three</p>
<p data-rect="0 2000 800 20">Hidden paragraph four</p>
<p data-rect="0 2100 800 20">Hidden paragraph five</p>
</main>
</body></html>"#
            .to_string()
    }

    /// `count` 个都在视口内的主要段落
    pub fn visible_paragraphs(count: usize) -> String {
        let body: String = (0..count)
            .map(|i| format!(r#"<p data-rect="0 {} 800 20">Paragraph number {}</p>"#, 10 + i * 30, i))
            .collect();
        format!("<html><body><main>{}</main></body></html>", body)
    }

    /// 一个由三个文本片段组成的段落
    pub fn three_fragment_page() -> String {
        r#"<html><body><main><p data-rect="0 0 800 60">Hello there <br>big<br> wide world</p></main></body></html>"#
            .to_string()
    }
}

pub fn page_from(html: &str) -> Page {
    page_at(html, LOCATION)
}

pub fn page_at(html: &str, location: &str) -> Page {
    Page::from_html(html.as_bytes(), None, Box::new(DeclaredLayout), VIEWPORT, location)
        .expect("fixture should parse")
}

pub fn engine_for(html: &str, translator: ScriptedTranslator) -> PageTranslator<ScriptedTranslator> {
    PageTranslator::new(page_from(html), translator, StaticSettings::default())
}

pub fn engine_with_settings(
    html: &str,
    translator: ScriptedTranslator,
    settings: TranslationSettings,
) -> PageTranslator<ScriptedTranslator> {
    PageTranslator::new(page_from(html), translator, StaticSettings(settings))
}

/// 收集通道中已到达的所有状态事件
pub fn drain_events(receiver: &mut UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

/// 可编排的翻译器
///
/// 每次调用等待固定延迟后返回 `"[目标语言] 原文"`。可以指定永远失败、
/// 第一次失败或返回空串的文本（按子串匹配），并记录调用顺序与并发峰值。
#[derive(Debug)]
pub struct ScriptedTranslator {
    delay: Duration,
    slow: HashMap<String, Duration>,
    fail: HashSet<String>,
    fail_once: RefCell<HashSet<String>>,
    empty: HashSet<String>,
    calls: RefCell<Vec<String>>,
    in_flight: Cell<usize>,
    peak: Cell<usize>,
}

impl Default for ScriptedTranslator {
    fn default() -> Self {
        Self::with_delay(Duration::from_millis(100))
    }
}

impl ScriptedTranslator {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            slow: HashMap::new(),
            fail: HashSet::new(),
            fail_once: RefCell::new(HashSet::new()),
            empty: HashSet::new(),
            calls: RefCell::new(Vec::new()),
            in_flight: Cell::new(0),
            peak: Cell::new(0),
        }
    }

    pub fn failing(mut self, marker: &str) -> Self {
        self.fail.insert(marker.to_string());
        self
    }

    pub fn failing_once(self, marker: &str) -> Self {
        self.fail_once.borrow_mut().insert(marker.to_string());
        self
    }

    pub fn empty_for(mut self, marker: &str) -> Self {
        self.empty.insert(marker.to_string());
        self
    }

    pub fn slow_for(mut self, marker: &str, delay: Duration) -> Self {
        self.slow.insert(marker.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.get()
    }

    pub fn rendered(target: &str, text: &str) -> String {
        format!("[{}] {}", target, text)
    }

    fn delay_for(&self, text: &str) -> Duration {
        self.slow
            .iter()
            .find(|(marker, _)| text.contains(marker.as_str()))
            .map(|(_, delay)| *delay)
            .unwrap_or(self.delay)
    }

    fn matches(set: &HashSet<String>, text: &str) -> bool {
        set.iter().any(|marker| text.contains(marker.as_str()))
    }
}

impl Translator for ScriptedTranslator {
    async fn translate(&self, text: &str, settings: &TranslationSettings) -> TranslationResult<String> {
        self.calls.borrow_mut().push(text.to_string());
        self.in_flight.set(self.in_flight.get() + 1);
        self.peak.set(self.peak.get().max(self.in_flight.get()));

        tokio::time::sleep(self.delay_for(text)).await;
        self.in_flight.set(self.in_flight.get() - 1);

        let failed_once = {
            let mut once = self.fail_once.borrow_mut();
            let hit = once.iter().find(|marker| text.contains(marker.as_str())).cloned();
            hit.map(|marker| once.remove(&marker)).unwrap_or(false)
        };
        if failed_once || Self::matches(&self.fail, text) {
            return Err(TranslationError::NetworkError("scripted failure".to_string()));
        }
        if Self::matches(&self.empty, text) {
            return Ok(String::new());
        }
        Ok(Self::rendered(&settings.target_language, text))
    }
}

/// 记录所有调用的登记表
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    inner: InMemoryRegistry,
    log: Mutex<Vec<(&'static str, ViewId)>>,
}

impl RecordingRegistry {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn log(&self) -> Vec<(&'static str, ViewId)> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl EnablementRegistry for RecordingRegistry {
    fn enable(&self, view: ViewId) {
        if let Ok(mut log) = self.log.lock() {
            log.push(("enable", view));
        }
        self.inner.enable(view);
    }

    fn disable(&self, view: ViewId) {
        if let Ok(mut log) = self.log.lock() {
            log.push(("disable", view));
        }
        self.inner.disable(view);
    }

    fn is_enabled(&self, view: ViewId) -> bool {
        self.inner.is_enabled(view)
    }
}

/// 指向本地未监听端口的 Ollama 后端
pub fn unreachable_backend() -> (OllamaTranslator, TranslationSettings) {
    let settings = TranslationSettings {
        endpoint: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    };
    (OllamaTranslator::new(), settings)
}
