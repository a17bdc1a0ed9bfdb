//! 会话状态
//!
//! 每个文档视图一份：段落表、已翻译集合、逐片段的原文/译文记录、
//! 显示模式、取消标志以及本次运行的设置快照。
//! 会话只在单线程上通过 `RefCell` 共享，借用从不跨越 await。

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use markup5ever_rcdom::Handle;

use super::fragments::{FragmentArena, FragmentId};
use crate::parsers::html::dom::{get_text, set_text};
use crate::translation::config::TranslationSettings;
use crate::translation::pipeline::{Language, ParagraphDraft, Region, TextFragment};

/// 段落标识，在一次运行内按文档顺序编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParagraphId(usize);

impl ParagraphId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ParagraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "para_{}", self.0)
    }
}

/// 段落翻译状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParagraphStatus {
    Untranslated,
    Translating,
    Translated,
    Failed,
}

impl ParagraphStatus {
    /// 滚动补翻是否会选中该段落
    pub fn awaits_translation(&self) -> bool {
        matches!(self, ParagraphStatus::Untranslated | ParagraphStatus::Failed)
    }
}

/// 显示模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    Original,
    Translated,
}

impl DisplayMode {
    pub fn flipped(&self) -> DisplayMode {
        match self {
            DisplayMode::Original => DisplayMode::Translated,
            DisplayMode::Translated => DisplayMode::Original,
        }
    }
}

/// 段落
#[derive(Debug, Clone)]
pub struct ParagraphUnit {
    pub id: ParagraphId,
    pub members: Vec<TextFragment>,
    pub combined_text: String,
    /// 合并文本的字符数
    pub length: usize,
    pub language: Language,
    pub region: Region,
    pub status: ParagraphStatus,
}

impl ParagraphUnit {
    /// 第一个片段的父元素
    pub fn anchor(&self) -> Option<&Handle> {
        self.members.first().map(|member| &member.parent)
    }
}

/// 单个片段的原文与译文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    pub original_text: String,
    pub translated_text: Option<String>,
}

/// 译文写入段落成员时每个成员得到的文本：完整译文放在第一个成员，其余为空
pub fn apply_rule(index: usize, translated: &str) -> &str {
    if index == 0 {
        translated
    } else {
        ""
    }
}

/// 翻译完成后的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 译文已记录（显示译文时同时写入文档）
    Applied,
    /// 会话已取消，结果被丢弃
    Discarded,
    /// 段落已不在会话中
    Unknown,
}

/// 会话状态
#[derive(Debug)]
pub struct SessionState {
    paragraphs: BTreeMap<ParagraphId, ParagraphUnit>,
    translated_ids: BTreeSet<ParagraphId>,
    records: HashMap<FragmentId, TranslationRecord>,
    display_mode: DisplayMode,
    cancelled: bool,
    settings: Option<TranslationSettings>,
    arena: FragmentArena,
    next_id: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            paragraphs: BTreeMap::new(),
            translated_ids: BTreeSet::new(),
            records: HashMap::new(),
            display_mode: DisplayMode::Translated,
            cancelled: false,
            settings: None,
            arena: FragmentArena::new(),
            next_id: 0,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始新一轮整页翻译
    pub fn begin_run(&mut self, settings: TranslationSettings) {
        self.reset();
        self.settings = Some(settings);
    }

    /// 清空段落、已翻译集合和记录，取消标志复位
    ///
    /// 片段身份在整个文档生命周期内保持，不随会话重置。段落 id 继续递增，
    /// 重置前发出的请求返回时不会落到新段落上。
    pub fn reset(&mut self) {
        self.paragraphs.clear();
        self.translated_ids.clear();
        self.records.clear();
        self.display_mode = DisplayMode::Translated;
        self.cancelled = false;
        self.settings = None;
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn settings(&self) -> Option<&TranslationSettings> {
        self.settings.as_ref()
    }

    pub fn arena(&self) -> &FragmentArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut FragmentArena {
        &mut self.arena
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    /// 登记一个段落并分配 id
    pub fn insert_paragraph(&mut self, draft: ParagraphDraft, language: Language, region: Region) -> ParagraphId {
        let id = ParagraphId(self.next_id);
        self.next_id += 1;

        let length = draft.char_count();
        self.paragraphs.insert(
            id,
            ParagraphUnit {
                id,
                members: draft.members,
                combined_text: draft.combined_text,
                length,
                language,
                region,
                status: ParagraphStatus::Untranslated,
            },
        );
        id
    }

    pub fn paragraph(&self, id: ParagraphId) -> Option<&ParagraphUnit> {
        self.paragraphs.get(&id)
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &ParagraphUnit> {
        self.paragraphs.values()
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn translated_ids(&self) -> &BTreeSet<ParagraphId> {
        &self.translated_ids
    }

    pub fn is_translated(&self, id: ParagraphId) -> bool {
        self.translated_ids.contains(&id)
    }

    pub fn record(&self, fragment: FragmentId) -> Option<&TranslationRecord> {
        self.records.get(&fragment)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// 已翻译的段落
    pub fn translated_units(&self) -> impl Iterator<Item = &ParagraphUnit> {
        self.translated_ids
            .iter()
            .filter_map(|id| self.paragraphs.get(id))
    }

    /// 等待翻译（未翻译或失败）的段落 id
    pub fn pending_ids(&self) -> Vec<ParagraphId> {
        self.paragraphs
            .values()
            .filter(|unit| unit.status.awaits_translation())
            .map(|unit| unit.id)
            .collect()
    }

    /// 派发前的准备：为每个成员建立记录并标记为翻译中
    ///
    /// 会话已取消、段落不存在、已翻译或正在翻译时返回 `None`。
    pub fn begin_dispatch(&mut self, id: ParagraphId) -> Option<String> {
        if self.cancelled || self.translated_ids.contains(&id) {
            return None;
        }

        let unit = self.paragraphs.get_mut(&id)?;
        if unit.status == ParagraphStatus::Translating {
            return None;
        }

        for member in &unit.members {
            self.records
                .entry(member.id)
                .or_insert_with(|| TranslationRecord {
                    original_text: get_text(&member.node).unwrap_or_default(),
                    translated_text: None,
                });
        }

        unit.status = ParagraphStatus::Translating;
        Some(unit.combined_text.clone())
    }

    /// 记录成功的译文
    ///
    /// 写入前检查取消标志；显示模式为译文时按规则写入文档。
    pub fn complete_success(&mut self, id: ParagraphId, translated: &str) -> Completion {
        let Some(unit) = self.paragraphs.get_mut(&id) else {
            return Completion::Unknown;
        };

        if self.cancelled {
            unit.status = ParagraphStatus::Untranslated;
            return Completion::Discarded;
        }

        let write_dom = self.display_mode == DisplayMode::Translated;
        for (index, member) in unit.members.iter().enumerate() {
            let text = apply_rule(index, translated);
            if let Some(record) = self.records.get_mut(&member.id) {
                record.translated_text = Some(text.to_string());
            }
            if write_dom {
                set_text(&member.node, text);
            }
        }

        unit.status = ParagraphStatus::Translated;
        self.translated_ids.insert(id);
        Completion::Applied
    }

    /// 记录失败，段落仍可被滚动补翻选中
    pub fn complete_failure(&mut self, id: ParagraphId) {
        if let Some(unit) = self.paragraphs.get_mut(&id) {
            unit.status = if self.cancelled {
                ParagraphStatus::Untranslated
            } else {
                ParagraphStatus::Failed
            };
        }
    }
}
