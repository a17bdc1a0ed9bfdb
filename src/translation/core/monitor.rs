//! 页面变化监视
//!
//! - `ScrollMonitor`：滚动事件去抖。静止 `SCROLL_DEBOUNCE` 之后触发一次补翻；
//!   触发时如果上一次补翻仍在进行，本次触发直接丢弃。
//! - `NavigationWatcher`：记录最后一次已知的页面地址，用于识别单页应用的页内导航。
//!
//! 两者都只保存状态，真正的补翻和重新翻译由 `PageTranslator` 驱动。

use std::cell::{Cell, RefCell};

use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};

use crate::translation::config::constants;

/// 滚动去抖状态
#[derive(Debug)]
pub struct ScrollMonitor {
    last_event: Cell<Option<Instant>>,
    pending: Cell<bool>,
    sweeping: Cell<bool>,
    dropped: Cell<usize>,
    fired: Cell<usize>,
    closed: Cell<bool>,
    wake: Notify,
    fire: Notify,
}

impl Default for ScrollMonitor {
    fn default() -> Self {
        Self {
            last_event: Cell::new(None),
            pending: Cell::new(false),
            sweeping: Cell::new(false),
            dropped: Cell::new(0),
            fired: Cell::new(0),
            closed: Cell::new(false),
            wake: Notify::new(),
            fire: Notify::new(),
        }
    }
}

impl ScrollMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次滚动事件
    pub fn notify_scroll(&self) {
        if self.closed.get() {
            return;
        }
        self.last_event.set(Some(Instant::now()));
        self.pending.set(true);
        self.wake.notify_one();
    }

    /// 停止监视，正在等待的循环会在下一次唤醒时退出
    pub fn shutdown(&self) {
        self.closed.set(true);
        self.wake.notify_one();
        self.fire.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeping.get()
    }

    /// 因补翻进行中被丢弃的触发次数
    pub fn dropped_triggers(&self) -> usize {
        self.dropped.get()
    }

    /// 实际触发补翻的次数
    pub fn fired_triggers(&self) -> usize {
        self.fired.get()
    }

    /// 去抖循环：等待滚动停止后发出触发信号
    pub(crate) async fn debounce_loop(&self) {
        loop {
            while !self.pending.get() {
                if self.closed.get() {
                    return;
                }
                self.wake.notified().await;
            }

            // 等待最后一次事件之后静止满去抖时间
            loop {
                if self.closed.get() {
                    return;
                }
                let Some(last) = self.last_event.get() else {
                    break;
                };
                let deadline = last + constants::SCROLL_DEBOUNCE;
                if Instant::now() >= deadline {
                    break;
                }
                sleep_until(deadline).await;
            }
            self.pending.set(false);

            if self.sweeping.get() {
                self.dropped.set(self.dropped.get() + 1);
                tracing::debug!("补翻进行中，丢弃本次滚动触发");
                continue;
            }

            self.sweeping.set(true);
            self.fired.set(self.fired.get() + 1);
            self.fire.notify_one();
        }
    }

    /// 等待下一次触发；监视已停止时返回 `false`
    pub(crate) async fn next_trigger(&self) -> bool {
        if self.closed.get() {
            return false;
        }
        self.fire.notified().await;
        !self.closed.get()
    }

    pub(crate) fn finish_sweep(&self) {
        self.sweeping.set(false);
    }
}

/// 页内导航识别
#[derive(Debug, Default)]
pub struct NavigationWatcher {
    last_location: RefCell<String>,
    armed: Cell<bool>,
}

impl NavigationWatcher {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            last_location: RefCell::new(location.into()),
            armed: Cell::new(false),
        }
    }

    pub fn arm(&self, location: &str) {
        *self.last_location.borrow_mut() = location.to_string();
        self.armed.set(true);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    pub fn last_location(&self) -> String {
        self.last_location.borrow().clone()
    }

    /// 记录当前地址，返回地址是否发生了变化
    pub fn observe(&self, current: &str) -> bool {
        let mut last = self.last_location.borrow_mut();
        if *last == current {
            return false;
        }
        *last = current.to_string();
        true
    }
}
