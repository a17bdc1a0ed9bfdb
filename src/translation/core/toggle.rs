//! 原文/译文切换
//!
//! 切换只使用会话中保存的记录，同步完成，不访问网络。
//! 未翻译的段落不受影响。

use crate::parsers::html::dom::set_text;
use crate::translation::storage::{DisplayMode, SessionState};

/// 页面上的切换按钮状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleAffordance {
    mode: Option<DisplayMode>,
}

impl ToggleAffordance {
    pub fn show(&mut self, mode: DisplayMode) {
        self.mode = Some(mode);
    }

    pub fn remove(&mut self) {
        self.mode = None;
    }

    pub fn is_present(&self) -> bool {
        self.mode.is_some()
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        if self.mode.is_some() {
            self.mode = Some(mode);
        }
    }

    /// 按钮文字，提示点击后切换到的模式
    pub fn label(&self) -> Option<&'static str> {
        self.mode.map(|mode| match mode {
            DisplayMode::Translated => "显示原文",
            DisplayMode::Original => "显示译文",
        })
    }
}

/// 显示模式切换
pub struct ToggleController;

impl ToggleController {
    /// 切换到指定模式并改写文档，返回被改写的片段数
    pub fn apply(session: &mut SessionState, mode: DisplayMode) -> usize {
        session.set_display_mode(mode);
        match mode {
            DisplayMode::Translated => Self::show_translations(session),
            DisplayMode::Original => Self::restore_originals(session),
        }
    }

    /// 已翻译段落的每个片段写回原文
    pub fn restore_originals(session: &SessionState) -> usize {
        let mut written = 0;
        for unit in session.translated_units() {
            for member in &unit.members {
                if let Some(record) = session.record(member.id) {
                    set_text(&member.node, &record.original_text);
                    written += 1;
                }
            }
        }
        tracing::debug!("恢复原文: {} 个片段", written);
        written
    }

    /// 已翻译段落的每个片段写入译文，缺少译文的记录跳过
    pub fn show_translations(session: &SessionState) -> usize {
        let mut written = 0;
        for unit in session.translated_units() {
            for member in &unit.members {
                let translated = session
                    .record(member.id)
                    .and_then(|record| record.translated_text.as_deref());
                if let Some(text) = translated {
                    set_text(&member.node, text);
                    written += 1;
                }
            }
        }
        tracing::debug!("显示译文: {} 个片段", written);
        written
    }
}
