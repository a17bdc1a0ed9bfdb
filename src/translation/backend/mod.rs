//! 翻译后端
//!
//! 引擎只依赖 `Translator` trait：给定合并后的段落文本和本次运行的设置，
//! 返回译文或错误。空译文同样视为失败。

pub mod ollama;

use std::future::Future;
use std::rc::Rc;

use crate::translation::config::TranslationSettings;
use crate::translation::error::TranslationResult;
use crate::translation::pipeline::language::contains_japanese;

pub use ollama::OllamaTranslator;

/// 翻译后端接口
pub trait Translator {
    fn translate(
        &self,
        text: &str,
        settings: &TranslationSettings,
    ) -> impl Future<Output = TranslationResult<String>>;
}

impl<T: Translator + ?Sized> Translator for Rc<T> {
    fn translate(
        &self,
        text: &str,
        settings: &TranslationSettings,
    ) -> impl Future<Output = TranslationResult<String>> {
        (**self).translate(text, settings)
    }
}

/// 语言代码对应的英文名称
pub fn language_name(code: &str) -> Option<&'static str> {
    match code.trim().to_ascii_lowercase().as_str() {
        "ja" => Some("Japanese"),
        "en" => Some("English"),
        "zh" => Some("Chinese"),
        "ko" => Some("Korean"),
        _ => None,
    }
}

/// 推断提示词里的源语言：含日文字符时为日文，否则按英文处理
pub fn source_language(text: &str) -> &'static str {
    if contains_japanese(text) {
        "ja"
    } else {
        "en"
    }
}

/// 构造翻译提示词
pub fn build_prompt(text: &str, target_language: &str) -> String {
    let source_code = source_language(text);
    let source_name = language_name(source_code).unwrap_or("English");
    let target_name = language_name(target_language).unwrap_or("Japanese");

    format!(
        "You are a professional {src} ({src_code}) to {tgt} ({tgt_code}) translator. \
         Your goal is to accurately convey the meaning and nuances of the original {src} text \
         while adhering to {tgt} grammar, vocabulary, and cultural sensitivities.\n\
         Produce only the {tgt} translation, without any additional explanations or commentary. \
         Please translate the following {src} text into {tgt}:\n\n{text}",
        src = source_name,
        src_code = source_code,
        tgt = target_name,
        tgt_code = target_language,
        text = text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("ja"), Some("Japanese"));
        assert_eq!(language_name("EN"), Some("English"));
        assert_eq!(language_name("fr"), None);
    }

    #[test]
    fn test_prompt_for_english_source() {
        let prompt = build_prompt("Hello world", "ja");
        assert!(prompt.starts_with(
            "You are a professional English (en) to Japanese (ja) translator."
        ));
        assert!(prompt.contains("Produce only the Japanese translation"));
        assert!(prompt.ends_with("into Japanese:\n\nHello world"));
    }

    #[test]
    fn test_prompt_source_detection_and_fallback() {
        let prompt = build_prompt("これはテストです", "ko");
        assert!(prompt.contains("Japanese (ja) to Korean (ko)"));

        // 未知目标语言使用日文名称
        let prompt = build_prompt("bonjour", "fr");
        assert!(prompt.contains("English (en) to Japanese (fr)"));
    }
}
