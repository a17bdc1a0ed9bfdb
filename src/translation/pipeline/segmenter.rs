//! 段落分组
//!
//! 将文档顺序的文本片段按结构边界合并为有长度上限的段落草稿，
//! 每个片段恰好属于一个草稿。

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use super::scanner::TextFragment;
use crate::translation::config::constants;

/// 尚未分配 id 的段落
#[derive(Debug, Clone)]
pub struct ParagraphDraft {
    pub members: Vec<TextFragment>,
    /// 成员文本以单个空格连接
    pub combined_text: String,
}

impl ParagraphDraft {
    fn from_members(members: Vec<TextFragment>) -> Self {
        let combined_text = members
            .iter()
            .map(|member| member.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            members,
            combined_text,
        }
    }

    pub fn char_count(&self) -> usize {
        self.combined_text.chars().count()
    }

    /// 第一个成员的父元素，用于可见性和主要内容判断
    pub fn anchor(&self) -> Option<&Handle> {
        self.members.first().map(|member| &member.parent)
    }
}

/// 段落分组器
#[derive(Debug, Clone)]
pub struct ParagraphSegmenter {
    max_chars: usize,
}

impl Default for ParagraphSegmenter {
    fn default() -> Self {
        Self {
            max_chars: constants::MAX_PARAGRAPH_CHARS,
        }
    }
}

impl ParagraphSegmenter {
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// 分组
    ///
    /// 下一个片段的父元素不同、加入后会超过上限、或累计长度已达上限时关闭当前段落。
    /// 单个片段本身超过上限时独立成段。
    pub fn segment(&self, fragments: Vec<TextFragment>) -> Vec<ParagraphDraft> {
        let mut drafts = Vec::new();
        let mut current: Vec<TextFragment> = Vec::new();
        let mut current_len = 0;

        for fragment in fragments {
            let len = fragment.char_count();

            if let Some(last) = current.last() {
                let same_parent = Rc::ptr_eq(&last.parent, &fragment.parent);
                let would_exceed = current_len + 1 + len > self.max_chars;
                if !same_parent || would_exceed {
                    drafts.push(ParagraphDraft::from_members(std::mem::take(&mut current)));
                    current_len = 0;
                }
            }

            current_len = if current.is_empty() {
                len
            } else {
                current_len + 1 + len
            };
            current.push(fragment);

            if current_len >= self.max_chars {
                drafts.push(ParagraphDraft::from_members(std::mem::take(&mut current)));
                current_len = 0;
            }
        }

        if !current.is_empty() {
            drafts.push(ParagraphDraft::from_members(current));
        }

        tracing::debug!("分组完成: {} 个段落", drafts.len());
        drafts
    }
}
