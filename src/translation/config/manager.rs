//! 配置管理器
//!
//! 提供统一的设置接口，支持文件配置、环境变量和默认值。
//! 加载顺序：`.env` 文件 → 配置文件（TOML/JSON）→ `PAGE_TRANSLATOR_*` 环境变量覆盖。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译设置
///
/// 字段同时接受 `snake_case` 与 `camelCase` 写法，以兼容扩展存储导出的设置文件。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// 翻译后端根地址
    #[serde(alias = "ollamaEndpoint")]
    pub endpoint: String,
    /// 模型名称
    pub model: String,
    #[serde(alias = "autoTranslate")]
    pub auto_translate: bool,
    #[serde(alias = "targetLanguage")]
    pub target_language: String,
    /// 不进行翻译的域名（包括其子域名）
    #[serde(alias = "excludeDomains")]
    pub exclude_domains: Vec<String>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            model: constants::DEFAULT_MODEL.to_string(),
            auto_translate: constants::DEFAULT_AUTO_TRANSLATE,
            target_language: constants::DEFAULT_TARGET_LANG.to_string(),
            exclude_domains: Vec::new(),
        }
    }
}

impl TranslationSettings {
    /// 创建带指定目标语言的默认设置
    pub fn with_target(target_language: &str) -> Self {
        Self {
            target_language: target_language.to_string(),
            ..Self::default()
        }
    }

    /// 验证设置
    pub fn validate(&self) -> TranslationResult<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(TranslationError::ConfigError(format!(
                "后端地址必须以 http:// 或 https:// 开头: {}",
                self.endpoint
            )));
        }

        if self.model.trim().is_empty() {
            return Err(TranslationError::ConfigError("模型名称不能为空".to_string()));
        }

        if self.target_language.trim().is_empty() {
            return Err(TranslationError::ConfigError("目标语言不能为空".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只有实际设置了的变量才会覆盖，无法解析的值作为配置错误返回。
    pub fn apply_env_overrides(&mut self) -> TranslationResult<()> {
        use crate::env::{translation, EnvVar};

        if let Some(endpoint) = translation::Endpoint::lookup() {
            self.endpoint = endpoint?;
            tracing::info!("环境变量覆盖后端地址: {}", self.endpoint);
        }

        if let Some(model) = translation::Model::lookup() {
            self.model = model?;
        }

        if let Some(target) = translation::TargetLang::lookup() {
            self.target_language = target?;
        }

        if let Some(auto) = translation::AutoTranslate::lookup() {
            self.auto_translate = auto?;
        }

        if let Some(domains) = translation::ExcludeDomains::lookup() {
            self.exclude_domains = domains?;
        }

        Ok(())
    }

    /// 规范化后端地址（去掉末尾的 `/`）
    pub fn endpoint_base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// 页面地址的主机名是否等于某个排除域名或是其子域名
    pub fn excludes(&self, location: &str) -> bool {
        let Some(host) = Url::parse(location)
            .ok()
            .and_then(|url| url.host_str().map(|host| host.to_ascii_lowercase()))
        else {
            return false;
        };

        self.exclude_domains
            .iter()
            .map(|domain| domain.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|domain| !domain.is_empty())
            .any(|domain| host == domain || host.ends_with(&format!(".{}", domain)))
    }
}

/// 设置来源
///
/// 每次整页扫描开始时调用一次，结果作为快照保存在会话中。
pub trait SettingsProvider {
    fn load(&self) -> TranslationResult<TranslationSettings>;
}

/// 固定的内存设置
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub TranslationSettings);

impl SettingsProvider for StaticSettings {
    fn load(&self) -> TranslationResult<TranslationSettings> {
        Ok(self.0.clone())
    }
}

impl From<TranslationSettings> for StaticSettings {
    fn from(settings: TranslationSettings) -> Self {
        Self(settings)
    }
}

/// 配置管理器
pub struct ConfigManager {
    source: Option<PathBuf>,
    settings: TranslationSettings,
}

impl ConfigManager {
    /// 创建新的配置管理器，自动搜索配置文件
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();
        let settings = Self::resolve(None)?;
        Ok(Self {
            source: None,
            settings,
        })
    }

    /// 使用指定的配置文件
    pub fn from_path<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        Self::load_dotenv();
        let source = PathBuf::from(shellexpand::tilde(&path.as_ref().to_string_lossy()).as_ref());
        let settings = Self::resolve(Some(&source))?;
        Ok(Self {
            source: Some(source),
            settings,
        })
    }

    /// 获取当前设置
    pub fn get_settings(&self) -> &TranslationSettings {
        &self.settings
    }

    /// 重新读取配置文件和环境变量
    pub fn reload(&mut self) -> TranslationResult<&TranslationSettings> {
        self.settings = Self::resolve(self.source.as_deref())?;
        Ok(&self.settings)
    }

    fn resolve(source: Option<&Path>) -> TranslationResult<TranslationSettings> {
        let mut settings = match source {
            Some(path) => Self::load_from_file(path)?,
            None => Self::search_config()?,
        };
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 在搜索路径中查找配置文件
    fn search_config() -> TranslationResult<TranslationSettings> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(candidate);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationSettings::default())
    }

    /// 从指定文件加载设置
    pub fn load_from_file(path: &Path) -> TranslationResult<TranslationSettings> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::ConfigError(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;

        Self::parse_settings(&content, path.extension().and_then(|ext| ext.to_str()))
    }

    /// 按扩展名解析配置内容，`json` 以外一律按 TOML 处理
    pub fn parse_settings(content: &str, extension: Option<&str>) -> TranslationResult<TranslationSettings> {
        match extension {
            Some("json") => serde_json::from_str(content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e))),
            _ => toml::from_str(content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e))),
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> TranslationResult<()> {
        let content = toml::to_string_pretty(&TranslationSettings::default())
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

impl SettingsProvider for ConfigManager {
    fn load(&self) -> TranslationResult<TranslationSettings> {
        Self::resolve(self.source.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TranslationSettings::default();
        assert_eq!(settings.endpoint, "http://localhost:11434");
        assert_eq!(settings.model, "translategemma:latest");
        assert!(settings.auto_translate);
        assert_eq!(settings.target_language, "ja");
        assert!(settings.exclude_domains.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_excluded_domains() {
        let settings = TranslationSettings {
            exclude_domains: vec!["example.com".to_string(), " .Intra.net".to_string()],
            ..Default::default()
        };
        assert!(settings.excludes("https://example.com/page"));
        assert!(settings.excludes("https://docs.EXAMPLE.com/"));
        assert!(settings.excludes("http://wiki.intra.net"));
        assert!(!settings.excludes("https://notexample.com/"));
        assert!(!settings.excludes("about:blank"));
        assert!(!TranslationSettings::default().excludes("https://example.com/"));
    }

    #[test]
    fn test_parse_camel_case_json() {
        let json = r#"{
            "ollamaEndpoint": "http://10.0.0.2:11434/",
            "model": "qwen2:7b",
            "autoTranslate": false,
            "targetLanguage": "zh",
            "excludeDomains": ["example.com"]
        }"#;

        let settings = ConfigManager::parse_settings(json, Some("json")).unwrap();
        assert_eq!(settings.endpoint_base(), "http://10.0.0.2:11434");
        assert_eq!(settings.model, "qwen2:7b");
        assert!(!settings.auto_translate);
        assert_eq!(settings.target_language, "zh");
        assert_eq!(settings.exclude_domains, vec!["example.com"]);
    }

    #[test]
    fn test_parse_partial_toml_fills_defaults() {
        let settings = ConfigManager::parse_settings("target_language = \"ko\"\n", Some("toml")).unwrap();
        assert_eq!(settings.target_language, "ko");
        assert_eq!(settings.model, constants::DEFAULT_MODEL);
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let settings = TranslationSettings {
            endpoint: "localhost:11434".to_string(),
            ..TranslationSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(TranslationError::ConfigError(_))
        ));

        let settings = TranslationSettings {
            model: "  ".to_string(),
            ..TranslationSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file_and_example_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-translator.toml");
        ConfigManager::generate_example_config(&path).unwrap();

        let settings = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(settings, TranslationSettings::default());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ConfigManager::load_from_file(&path),
            Err(TranslationError::ConfigError(_))
        ));
    }
}
