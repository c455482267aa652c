//! 翻译管道统一错误处理
//!
//! 提供结构化错误类型和可重试性判定。

use thiserror::Error;

/// 翻译错误类型
///
/// 覆盖管道各阶段可能出现的失败情况：输入清洗、凭证配置、
/// 网络传输、接口响应解析和任务调度。
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 输入在清洗后没有任何可翻译内容
    #[error("输入为空：清洗后没有可翻译的内容")]
    EmptyInput,

    /// 没有配置火山引擎 API Key
    #[error("缺少 API Key，请先配置火山引擎凭证")]
    MissingCredential,

    /// 翻译接口拒绝了请求（HTTP 非 2xx）
    #[error("翻译接口返回错误 ({status}): {message}")]
    Http { status: u16, message: String },

    /// 接口响应既不是 choices 形状也不是 output 形状
    #[error("无法解析翻译接口响应: {0}")]
    InvalidResponseFormat(String),

    /// 传输层故障（DNS、连接被拒、超时等）
    #[error("网络请求失败: {0}")]
    Network(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 调度器故障（派发循环退出、结果通道被丢弃）
    #[error("调度器不可用: {0}")]
    Scheduler(String),
}

impl TranslationError {
    /// 检查错误是否值得调用方重试
    ///
    /// 限流（429）和服务端错误（5xx）以及传输层故障属于临时性问题；
    /// 凭证缺失、响应格式漂移等则重试无益。管道本身不会自动重试，
    /// 重试策略由调用方决定。
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Network(_) => true,
            TranslationError::Http { status, .. } => *status == 429 || (500..600).contains(status),
            TranslationError::EmptyInput => false,
            TranslationError::MissingCredential => false,
            TranslationError::InvalidResponseFormat(_) => false,
            TranslationError::Config(_) => false,
            TranslationError::Scheduler(_) => false,
        }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        TranslationError::Network(error.to_string())
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(format!("TOML解析错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TranslationError::Network("连接被拒".into()).is_retryable());
        assert!(TranslationError::Http {
            status: 429,
            message: "限流".into()
        }
        .is_retryable());
        assert!(TranslationError::Http {
            status: 500,
            message: "内部错误".into()
        }
        .is_retryable());

        assert!(!TranslationError::Http {
            status: 401,
            message: "未授权".into()
        }
        .is_retryable());
        assert!(!TranslationError::MissingCredential.is_retryable());
        assert!(!TranslationError::InvalidResponseFormat("格式漂移".into()).is_retryable());
        assert!(!TranslationError::EmptyInput.is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = TranslationError::Http {
            status: 401,
            message: "API Key 无效".into(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("API Key 无效"));
    }
}
