//! 翻译模块统一错误处理
//!
//! 单个段落的翻译失败不会以错误形式向上传播，调度器会把它降级为警告；
//! 只有配置和 I/O 类错误会返回给调用方。

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 后端返回了非成功状态码
    #[error("翻译后端返回状态码 {status}: {message}")]
    BackendStatus { status: u16, message: String },

    /// 后端返回空结果
    #[error("翻译结果为空")]
    EmptyResponse,

    /// 流式响应读取错误
    #[error("流式响应错误: {0}")]
    StreamError(String),

    /// 文档处理错误
    #[error("文档处理错误: {0}")]
    DocumentError(String),
}

impl TranslationError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::BackendStatus { status, .. } if *status >= 500 => ErrorSeverity::Error,
            TranslationError::BackendStatus { .. } => ErrorSeverity::Warning,
            TranslationError::EmptyResponse => ErrorSeverity::Info,
            TranslationError::StreamError(_) => ErrorSeverity::Warning,
            TranslationError::DocumentError(_) => ErrorSeverity::Error,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::DocumentError(format!("IO错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            TranslationError::BackendStatus {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

impl From<crate::env::EnvError> for TranslationError {
    fn from(error: crate::env::EnvError) -> Self {
        TranslationError::ConfigError(error.to_string())
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 按严重程度记录错误，`subject` 标明出错的对象
pub fn log_error(subject: impl std::fmt::Display, error: &TranslationError) {
    match error.severity() {
        ErrorSeverity::Info => tracing::info!("{}: {}", subject, error),
        ErrorSeverity::Warning => tracing::warn!("{}: {}", subject, error),
        ErrorSeverity::Error | ErrorSeverity::Critical => tracing::error!("{}: {}", subject, error),
    }
}
