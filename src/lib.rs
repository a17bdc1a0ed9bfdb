//! # Page Translator
//!
//! 原地、增量的网页翻译引擎：在已解析的 DOM 上找出需要翻译的文本，
//! 按可见性和内容重要性分层翻译，并可在原文与译文之间无损切换。
//!
//! ## 模块组织
//!
//! - `page` - 文档视图（DOM、布局、视口、地址）
//! - `parsers` - HTML 解析与序列化
//! - `translation` - 翻译引擎
//! - `env` - 环境变量

pub mod env;
pub mod page;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use page::{DeclaredLayout, FlowLayout, LayoutProvider, Page, Rect};
pub use translation::{PageTranslator, TranslationError, TranslationResult, TranslationSettings};
