//! 语言检测
//!
//! 基于 Unicode 区段判断段落语言，统计页面主要语言，并决定段落是否需要翻译。

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::segmenter::ParagraphDraft;
use crate::translation::config::constants;

/// 段落语言类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Japanese,
    Chinese,
    Korean,
    Other,
}

impl Language {
    /// 从语言代码识别类别，`zh-CN`、`zh-TW` 等带地区的代码按前缀匹配
    pub fn from_code(code: &str) -> Language {
        let code = code.trim().to_ascii_lowercase();
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        match primary {
            "ja" => Language::Japanese,
            "zh" => Language::Chinese,
            "ko" => Language::Korean,
            _ => Language::Other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Japanese => "ja",
            Language::Chinese => "zh",
            Language::Korean => "ko",
            Language::Other => "other",
        }
    }

    /// `Other` 不代表具体语言，永远不与任何语言相等
    pub fn matches(&self, other: Language) -> bool {
        *self != Language::Other && *self == other
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 正则表达式缓存
struct ScriptPatterns {
    japanese: Regex,
    chinese: Regex,
    korean: Regex,
}

fn patterns() -> &'static ScriptPatterns {
    static PATTERNS: OnceLock<ScriptPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ScriptPatterns {
        // 平假名、片假名以及 CJK 统一汉字的常用区段
        japanese: Regex::new(r"[\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FAF}]")
            .expect("built-in Japanese pattern"),
        chinese: Regex::new(r"[\x{4E00}-\x{9FFF}]").expect("built-in Chinese pattern"),
        korean: Regex::new(r"[\x{AC00}-\x{D7AF}]").expect("built-in Korean pattern"),
    })
}

/// 是否包含日文区段字符（含汉字）
pub fn contains_japanese(text: &str) -> bool {
    patterns().japanese.is_match(text)
}

/// 页面语言统计（按段落字符数累计）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LanguageStats {
    pub japanese: usize,
    pub chinese: usize,
    pub korean: usize,
    pub other: usize,
}

impl LanguageStats {
    pub fn total(&self) -> usize {
        self.japanese + self.chinese + self.korean + self.other
    }

    pub fn add(&mut self, language: Language, chars: usize) {
        match language {
            Language::Japanese => self.japanese += chars,
            Language::Chinese => self.chinese += chars,
            Language::Korean => self.korean += chars,
            Language::Other => self.other += chars,
        }
    }

    /// 某一类别的占比，总数为零时为 0
    pub fn share(&self, language: Language) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let count = match language {
            Language::Japanese => self.japanese,
            Language::Chinese => self.chinese,
            Language::Korean => self.korean,
            Language::Other => self.other,
        };
        count as f64 / total as f64
    }

    /// 主要语言：按日、中、韩顺序第一个占比超过阈值的类别，否则为 `Other`
    pub fn primary(&self) -> Language {
        [Language::Japanese, Language::Chinese, Language::Korean]
            .into_iter()
            .find(|language| self.share(*language) > constants::PRIMARY_LANGUAGE_THRESHOLD)
            .unwrap_or(Language::Other)
    }
}

/// 语言分类器
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageClassifier;

impl LanguageClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 检测单段文本的语言
    pub fn detect(&self, text: &str) -> Language {
        let patterns = patterns();
        if patterns.japanese.is_match(text) {
            Language::Japanese
        } else if patterns.chinese.is_match(text) {
            Language::Chinese
        } else if patterns.korean.is_match(text) {
            Language::Korean
        } else {
            Language::Other
        }
    }

    /// 统计全部段落的语言分布
    pub fn analyze(&self, drafts: &[ParagraphDraft]) -> LanguageStats {
        let mut stats = LanguageStats::default();
        for draft in drafts {
            stats.add(self.detect(&draft.combined_text), draft.char_count());
        }

        let total = stats.total();
        if total > 0 {
            tracing::info!(
                "页面语言分析: 日文 {:.1}%, 中文 {:.1}%, 韩文 {:.1}%, 其他 {:.1}% (共 {} 字符)",
                stats.share(Language::Japanese) * 100.0,
                stats.share(Language::Chinese) * 100.0,
                stats.share(Language::Korean) * 100.0,
                stats.share(Language::Other) * 100.0,
                total
            );
        }

        stats
    }

    /// 判断段落是否需要翻译
    pub fn is_eligible(&self, draft: &ParagraphDraft, primary: Language, target: Language) -> bool {
        if draft.combined_text.trim().chars().count() < constants::MIN_FRAGMENT_CHARS {
            return false;
        }

        let language = self.detect(&draft.combined_text);
        !(language.matches(primary) || language.matches(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_precedence() {
        let classifier = LanguageClassifier::new();
        assert_eq!(classifier.detect("ひらがなです"), Language::Japanese);
        assert_eq!(classifier.detect("カタカナ"), Language::Japanese);
        // 常用汉字区段同时属于日文区段
        assert_eq!(classifier.detect("中文"), Language::Japanese);
        // U+9FB0 之后只落在中文区段
        assert_eq!(classifier.detect("\u{9FB5}"), Language::Chinese);
        assert_eq!(classifier.detect("한국어"), Language::Korean);
        assert_eq!(classifier.detect("hello world"), Language::Other);
    }

    #[test]
    fn test_primary_threshold() {
        let mut stats = LanguageStats::default();
        stats.add(Language::Japanese, 31);
        stats.add(Language::Other, 69);
        assert_eq!(stats.primary(), Language::Japanese);

        let mut stats = LanguageStats::default();
        stats.add(Language::Japanese, 30);
        stats.add(Language::Other, 70);
        assert_eq!(stats.primary(), Language::Other);

        let mut stats = LanguageStats::default();
        stats.add(Language::Korean, 40);
        stats.add(Language::Chinese, 35);
        stats.add(Language::Other, 25);
        // 中文排在韩文之前
        assert_eq!(stats.primary(), Language::Chinese);
    }

    #[test]
    fn test_zero_total_is_other() {
        let stats = LanguageStats::default();
        assert_eq!(stats.share(Language::Japanese), 0.0);
        assert_eq!(stats.primary(), Language::Other);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Language::from_code("ja"), Language::Japanese);
        assert_eq!(Language::from_code("zh-TW"), Language::Chinese);
        assert_eq!(Language::from_code("ko_KR"), Language::Korean);
        assert_eq!(Language::from_code("en"), Language::Other);
    }

    #[test]
    fn test_other_never_matches() {
        assert!(!Language::Other.matches(Language::Other));
        assert!(Language::Korean.matches(Language::Korean));
        assert!(!Language::Korean.matches(Language::Japanese));
    }
}
