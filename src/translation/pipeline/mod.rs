//! 翻译管道模块
//!
//! 扫描 → 分组 → 语言判断 → 优先级分层，产出待调度的段落

pub mod language;
pub mod priority;
pub mod scanner;
pub mod segmenter;

// 重新导出主要类型
pub use language::{Language, LanguageClassifier, LanguageStats};
pub use priority::{PriorityClassifier, Region};
pub use scanner::{DocumentScanner, ScanStats, TextFragment};
pub use segmenter::{ParagraphDraft, ParagraphSegmenter};
