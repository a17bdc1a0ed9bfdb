//! 翻译模块
//!
//! 原地、增量的页面翻译：
//! - **core**: 翻译引擎、层级调度、切换和页面监视
//! - **pipeline**: 扫描、分组、语言判断和优先级分层
//! - **storage**: 会话状态和片段身份
//! - **backend**: 翻译后端
//! - **config**: 设置与常量
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use page_translator::page::{DeclaredLayout, Page, Rect};
//! use page_translator::translation::{OllamaTranslator, PageTranslator, StaticSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let page = Page::from_html(
//!     b"<html><body><main><p>Hello world</p></main></body></html>",
//!     None,
//!     Box::new(DeclaredLayout),
//!     Rect::new(0.0, 0.0, 1280.0, 800.0),
//!     "https://example.com/",
//! )?;
//! let engine = PageTranslator::new(page, OllamaTranslator::new(), StaticSettings::default());
//! let run = engine.start().await?;
//! println!("翻译了 {} 个段落", run.translated());
//! # Ok(())
//! # }
//! ```

/// 翻译后端接口与 Ollama 实现
pub mod backend;

/// 设置、配置加载和常量
pub mod config;

/// 翻译引擎
pub mod core;

/// 错误类型
pub mod error;

/// 文本处理管道
pub mod pipeline;

/// 视图启用登记
pub mod registry;

/// 状态通知
pub mod status;

/// 会话状态
pub mod storage;

// ============================================================================
// 公共API导出
// ============================================================================

pub use backend::{build_prompt, language_name, OllamaTranslator, Translator};
pub use config::{ConfigManager, SettingsProvider, StaticSettings, TranslationSettings};
pub use core::{
    BucketOutcome, BucketReport, NavigationOutcome, PageRun, PageTranslator, RunReport,
    ToggleAffordance, ToggleController, TranslationScheduler,
};
pub use error::{TranslationError, TranslationResult};
pub use pipeline::{Language, Region};
pub use registry::{EnablementRegistry, InMemoryRegistry, ViewId};
pub use status::{StatusEvent, StatusReporter, WarningKind};
pub use storage::{DisplayMode, ParagraphId, ParagraphStatus, SessionState};
