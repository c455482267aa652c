//! 豆包翻译请求管道
//!
//! 把一段任意长度的用户文本变成一段完整译文所需的全部环节：
//!
//! - `sanitizer` —— 输入清洗（截断、剥离控制字符、空输入判定）
//! - `chunker` —— 按 Markdown 结构无损拆块与按序归并
//! - `provider` —— 豆包（Volcengine Ark）HTTP 客户端与响应解析
//! - `cache` —— 以原始文本指纹为键的 LRU 译文缓存
//! - `scheduler` —— FIFO 入队、并发受限执行的任务调度器
//! - `service` —— 组合以上环节的对外门面
//! - `messages` —— 与外部调用方之间的 JSON 消息契约
//! - `config` —— 配置文件、环境变量与默认值
//!
//! # 快速上手
//!
//! ```no_run
//! use doubao_translate::TranslationService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = TranslationService::with_defaults("your-api-key", "zh")?;
//!     let outcome = service.translate("Hello, world!", "zh").await?;
//!     println!("{}", outcome.translation);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod chunker;
pub mod config;
pub mod error;
pub mod messages;
pub mod provider;
pub mod sanitizer;
pub mod scheduler;
pub mod service;

pub use cache::{fingerprint, CacheStats, RequestCache};
pub use config::{ConfigManager, TranslationConfig};
pub use error::{TranslationError, TranslationResult};
pub use messages::{Request, Response, TranslatePayload};
pub use provider::DoubaoClient;
pub use scheduler::{Scheduler, TaskHandle};
pub use service::{TranslationOutcome, TranslationProgress, TranslationService};

/// 一次性翻译入口：组装临时服务完成单段文本的翻译
///
/// 适合脚本或测试场景，常驻进程应自行持有 [`TranslationService`]
/// 以复用缓存与连接池。
pub async fn translate_text(
    text: &str,
    api_key: &str,
    target_language: &str,
) -> TranslationResult<String> {
    let service = TranslationService::with_defaults(api_key, target_language)?;
    Ok(service.translate(text, target_language).await?.translation)
}
