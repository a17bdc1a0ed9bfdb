//! 翻译引擎核心模块
//!
//! 把扫描管道、调度、切换和页面监视组合成面向单个文档视图的翻译引擎。
//!
//! ## 模块依赖关系
//!
//! ```text
//! PageTranslator (service.rs)
//!     ├── DocumentScanner / ParagraphSegmenter (pipeline)
//!     ├── LanguageClassifier / PriorityClassifier (pipeline)
//!     ├── TranslationScheduler (scheduler.rs)
//!     │       └── Translator (backend)
//!     ├── ToggleController (toggle.rs)
//!     ├── ScrollMonitor / NavigationWatcher (monitor.rs)
//!     └── SessionState (storage/session.rs)
//! ```

pub mod monitor;
pub mod scheduler;
pub mod service;
pub mod toggle;

pub use monitor::{NavigationWatcher, ScrollMonitor};
pub use scheduler::{
    BucketOutcome, BucketReport, RunReport, SchedulerStats, SchedulerStatsSnapshot, TranslationScheduler,
};
pub use service::{NavigationOutcome, PageRun, PageTranslator};
pub use toggle::{ToggleAffordance, ToggleController};
