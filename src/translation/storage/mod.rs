//! 存储模块
//!
//! 会话内的翻译状态：片段身份、段落表、原文/译文记录。
//! 译文不做跨页面加载的持久化。

pub mod fragments;
pub mod session;

pub use fragments::{FragmentArena, FragmentId};
pub use session::{
    apply_rule, Completion, DisplayMode, ParagraphId, ParagraphStatus, ParagraphUnit, SessionState,
    TranslationRecord,
};
