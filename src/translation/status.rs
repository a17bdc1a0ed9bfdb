//! 翻译状态通知
//!
//! 引擎通过 `StatusReporter` 发出可观察的状态变化（翻译中、进度、完成、警告、错误等），
//! 宿主可以订阅事件通道来渲染状态提示。每个事件同时写入日志。

use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::translation::config::constants;

/// 警告类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// 没有需要翻译的文本
    NoEligibleText,
    /// 有候选段落但全部失败
    NothingTranslated,
    /// 当前域名在排除列表中
    ExcludedDomain,
}

/// 状态事件
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Translating,
    Progress { done: usize, total: usize },
    Success { translated: usize },
    Warning(WarningKind),
    Error { message: String },
    Stopped,
    SweepStarted { count: usize },
    SweepFinished { translated: usize },
}

/// 状态提示的显示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusEvent {
    pub fn level(&self) -> StatusLevel {
        match self {
            StatusEvent::Translating
            | StatusEvent::Progress { .. }
            | StatusEvent::SweepStarted { .. } => StatusLevel::Info,
            StatusEvent::Success { .. } | StatusEvent::SweepFinished { .. } => StatusLevel::Success,
            StatusEvent::Warning(_) => StatusLevel::Warning,
            StatusEvent::Error { .. } | StatusEvent::Stopped => StatusLevel::Error,
        }
    }

    /// 终态事件在这段时间后自动隐藏；进行中的事件返回 `None`
    pub fn auto_hide(&self) -> Option<Duration> {
        match self {
            StatusEvent::Translating | StatusEvent::Progress { .. } | StatusEvent::SweepStarted { .. } => {
                None
            }
            StatusEvent::SweepFinished { .. } => Some(constants::SWEEP_STATUS_AUTO_HIDE),
            StatusEvent::Success { .. }
            | StatusEvent::Warning(_)
            | StatusEvent::Error { .. }
            | StatusEvent::Stopped => Some(constants::STATUS_AUTO_HIDE),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.auto_hide().is_some()
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Translating => write!(f, "翻译中..."),
            StatusEvent::Progress { done, total } => {
                let percent = if *total == 0 { 100 } else { done * 100 / total };
                write!(f, "翻译中... ({}/{}) - {}%", done, total, percent)
            }
            StatusEvent::Success { translated } => {
                write!(f, "✓ 翻译完成 (共 {} 个段落)", translated)
            }
            StatusEvent::Warning(WarningKind::NoEligibleText) => write!(f, "⚠️ 没有需要翻译的文本"),
            StatusEvent::Warning(WarningKind::NothingTranslated) => write!(f, "⚠️ 未能翻译任何段落"),
            StatusEvent::Warning(WarningKind::ExcludedDomain) => write!(f, "⚠️ 当前域名已排除翻译"),
            StatusEvent::Error { message } => write!(f, "翻译错误: {}", message),
            StatusEvent::Stopped => write!(f, "✕ 已停止翻译"),
            StatusEvent::SweepStarted { count } => write!(f, "追加翻译中... ({} 个)", count),
            StatusEvent::SweepFinished { translated } => {
                write!(f, "✓ 追加翻译完成 ({} 个)", translated)
            }
        }
    }
}

/// 状态报告器
#[derive(Debug, Default)]
pub struct StatusReporter {
    sender: Option<UnboundedSender<StatusEvent>>,
    last: RefCell<Option<StatusEvent>>,
}

impl StatusReporter {
    /// 只写日志、不对外发送的报告器
    pub fn silent() -> Self {
        Self::default()
    }

    /// 创建报告器及其事件接收端
    pub fn channel() -> (Self, UnboundedReceiver<StatusEvent>) {
        let (sender, receiver) = unbounded_channel();
        (
            Self {
                sender: Some(sender),
                last: RefCell::new(None),
            },
            receiver,
        )
    }

    pub fn report(&self, event: StatusEvent) {
        match event.level() {
            StatusLevel::Info => tracing::debug!("状态: {}", event),
            StatusLevel::Success => tracing::info!("状态: {}", event),
            StatusLevel::Warning => tracing::warn!("状态: {}", event),
            StatusLevel::Error => tracing::error!("状态: {}", event),
        }

        if let Some(sender) = &self.sender {
            // 接收端已关闭时只保留日志
            let _ = sender.send(event.clone());
        }
        *self.last.borrow_mut() = Some(event);
    }

    /// 最近一次发出的事件
    pub fn last(&self) -> Option<StatusEvent> {
        self.last.borrow().clone()
    }
}
