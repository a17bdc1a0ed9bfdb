//! 视图启用登记
//!
//! 记录哪些文档视图（标签页）处于"已启用翻译"状态。页内导航后只有已启用的视图
//! 会自动重新翻译。登记表可能被多个视图共享，因此使用并发集合。

use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;

/// 文档视图标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// 启用状态登记表
pub trait EnablementRegistry {
    fn enable(&self, view: ViewId);
    fn disable(&self, view: ViewId);
    fn is_enabled(&self, view: ViewId) -> bool;
}

/// 内存登记表
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    enabled: DashSet<ViewId>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }
}

impl EnablementRegistry for InMemoryRegistry {
    fn enable(&self, view: ViewId) {
        if self.enabled.insert(view) {
            tracing::debug!("{} 已启用翻译", view);
        }
    }

    fn disable(&self, view: ViewId) {
        if self.enabled.remove(&view).is_some() {
            tracing::debug!("{} 已停用翻译", view);
        }
    }

    fn is_enabled(&self, view: ViewId) -> bool {
        self.enabled.contains(&view)
    }
}

impl<R: EnablementRegistry + ?Sized> EnablementRegistry for Arc<R> {
    fn enable(&self, view: ViewId) {
        (**self).enable(view)
    }

    fn disable(&self, view: ViewId) {
        (**self).disable(view)
    }

    fn is_enabled(&self, view: ViewId) -> bool {
        (**self).is_enabled(view)
    }
}
