//! 翻译配置管理模块
//!
//! 提供翻译设置、配置加载以及引擎使用的全部常量

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, SettingsProvider, StaticSettings, TranslationSettings};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 文本扫描相关
    pub const MIN_FRAGMENT_CHARS: usize = 3;
    pub const MAX_ANCESTOR_DEPTH: usize = 10;

    // 段落分组
    pub const MAX_PARAGRAPH_CHARS: usize = 1000;

    // 语言检测
    pub const PRIMARY_LANGUAGE_THRESHOLD: f64 = 0.3;

    // 调度
    pub const MAX_CONCURRENT_TRANSLATIONS: usize = 5;

    // 响应式触发
    pub const SCROLL_DEBOUNCE: Duration = Duration::from_millis(500);
    pub const NAVIGATION_SETTLE: Duration = Duration::from_millis(1500);

    // 状态提示自动隐藏
    pub const STATUS_AUTO_HIDE: Duration = Duration::from_secs(3);
    pub const SWEEP_STATUS_AUTO_HIDE: Duration = Duration::from_secs(2);

    // 默认设置
    pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
    pub const DEFAULT_MODEL: &str = "translategemma:latest";
    pub const DEFAULT_TARGET_LANG: &str = "ja";
    pub const DEFAULT_AUTO_TRANSLATE: bool = true;

    // 后端请求
    pub const CHAT_TEMPERATURE: f64 = 0.3;
    pub const CHAT_PATH: &str = "/api/chat";

    // 其文本节点不参与翻译的父元素
    pub const SKIP_PARENT_ELEMENTS: &[&str] = &["script", "style", "noscript", "iframe"];

    // 代码类元素
    pub const CODE_ELEMENTS: &[&str] = &["code", "pre", "kbd", "samp", "var", "tt"];
    pub const CODE_CLASS_MARKERS: &[&str] =
        &["code", "highlight", "language-", "hljs", "prism", "syntax"];

    // 非主要内容标记
    pub const NON_MAIN_ELEMENTS: &[&str] = &["nav", "aside", "header", "footer"];
    pub const NON_MAIN_ROLES: &[&str] = &["navigation", "complementary"];
    pub const NON_MAIN_CLASS_MARKERS: &[&str] = &["sidebar", "nav", "menu"];

    // 主要内容标记
    pub const MAIN_ELEMENTS: &[&str] = &["main", "article"];
    pub const MAIN_ROLES: &[&str] = &["main"];
    pub const MAIN_CLASS_MARKERS: &[&str] = &["main-content"];
    pub const MAIN_IDS: &[&str] = &["main", "content"];

    // 环境变量文件，按优先级排列
    pub const ENV_FILES: &[&str] = &[".env.local", ".env.development", ".env.production", ".env"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "page-translator.toml",
        "page-translator.json",
        ".page-translator.toml",
        "~/.config/page-translator/config.toml",
        "/etc/page-translator/config.toml",
    ];
}

