//! Ollama 聊天接口后端
//!
//! 以流式方式调用 `{endpoint}/api/chat`，逐行解析 NDJSON 响应块，
//! 按到达顺序拼接 `message.content`。无法解析的行直接跳过。

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_prompt, Translator};
use crate::translation::config::{constants, TranslationSettings};
use crate::translation::error::{TranslationError, TranslationResult};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// 把字节块切分成完整的行并累积译文
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    pending: Vec<u8>,
    output: String,
    skipped: usize,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个字节块，处理其中所有完整的行
    pub fn push(&mut self, bytes: &[u8]) -> TranslationResult<()> {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.consume_line(&line)?;
        }
        Ok(())
    }

    /// 处理末尾没有换行的剩余内容，返回累积的文本
    pub fn finish(mut self) -> TranslationResult<String> {
        let rest = std::mem::take(&mut self.pending);
        self.consume_line(&rest)?;
        if self.skipped > 0 {
            tracing::debug!("跳过 {} 行无法解析的响应块", self.skipped);
        }
        Ok(self.output)
    }

    fn consume_line(&mut self, line: &[u8]) -> TranslationResult<()> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        match serde_json::from_str::<ChatChunk>(line) {
            Ok(ChatChunk {
                error: Some(message),
                ..
            }) => Err(TranslationError::StreamError(message)),
            Ok(chunk) => {
                if let Some(message) = chunk.message {
                    self.output.push_str(&message.content);
                }
                Ok(())
            }
            Err(_) => {
                self.skipped += 1;
                Ok(())
            }
        }
    }
}

/// Ollama 翻译器
#[derive(Debug, Clone, Default)]
pub struct OllamaTranslator {
    client: Client,
}

impl OllamaTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn chat_url(settings: &TranslationSettings) -> String {
        format!("{}{}", settings.endpoint_base(), constants::CHAT_PATH)
    }
}

impl Translator for OllamaTranslator {
    async fn translate(&self, text: &str, settings: &TranslationSettings) -> TranslationResult<String> {
        let prompt = build_prompt(text, &settings.target_language);
        let request = ChatRequest {
            model: &settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            stream: true,
            options: ChatOptions {
                temperature: constants::CHAT_TEMPERATURE,
            },
        };

        let url = Self::chat_url(settings);
        tracing::debug!("请求翻译后端: {} (模型 {})", url, settings.model);

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::BackendStatus {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = response.bytes_stream();
        let mut assembler = ChunkAssembler::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TranslationError::StreamError(e.to_string()))?;
            assembler.push(&chunk)?;
        }

        let translated = assembler.finish()?;
        if translated.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(translated)
    }
}
