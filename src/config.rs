//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TranslationError, TranslationResult};

/// 配置常量
pub mod constants {
    /// 豆包 Seed-Translation 的 Responses 接口地址
    pub const DOUBAO_ENDPOINT: &str = "https://ark.cn-beijing.volces.com/api/v3/responses";
    /// 固定的翻译模型标识
    pub const DEFAULT_MODEL: &str = "doubao-seed-translation-250915";

    /// 单块文本的最大字符数
    pub const DEFAULT_MAX_CHUNK_SIZE: usize = 800;
    /// 传输层清洗时的字符上限（约对应 1k token 预算）
    pub const DEFAULT_MAX_INPUT_CHARS: usize = 800;

    /// 页面翻译路径的默认并发上限；后台批量翻译可调低（如 3）
    pub const DEFAULT_MAX_CONCURRENCY: usize = 15;

    /// 缓存默认容量（条目数）
    pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

    /// HTTP 请求超时（秒）
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// 默认目标语言
    pub const DEFAULT_TARGET_LANGUAGE: &str = "zh";

    /// 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "translation-config.toml",
        ".translation-config.toml",
        "~/.config/doubao-translate/config.toml",
    ];
}

/// 翻译管道配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 凭证与语言
    pub api_key: String,
    pub target_language: String,

    // 接口设置
    pub endpoint: String,
    pub model: String,
    pub request_timeout_secs: u64,

    // 管道设置
    pub max_chunk_size: usize,
    pub max_input_chars: usize,
    pub max_concurrency: usize,

    // 缓存设置
    pub cache_capacity: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            target_language: constants::DEFAULT_TARGET_LANGUAGE.to_string(),
            endpoint: constants::DOUBAO_ENDPOINT.to_string(),
            model: constants::DEFAULT_MODEL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            max_chunk_size: constants::DEFAULT_MAX_CHUNK_SIZE,
            max_input_chars: constants::DEFAULT_MAX_INPUT_CHARS,
            max_concurrency: constants::DEFAULT_MAX_CONCURRENCY,
            cache_capacity: constants::DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn default_with_lang(target_language: &str, api_key: Option<&str>) -> Self {
        let mut config = Self::default();
        config.target_language = target_language.to_string();
        if let Some(key) = api_key {
            config.api_key = key.to_string();
        }
        config
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.max_chunk_size == 0 {
            return Err(TranslationError::Config("分块大小不能为0".to_string()));
        }

        if self.max_concurrency == 0 {
            return Err(TranslationError::Config("最大并发数不能为0".to_string()));
        }

        if self.cache_capacity == 0 {
            return Err(TranslationError::Config("缓存容量不能为0".to_string()));
        }

        // 分块必须落在传输清洗上限之内，否则块会在清洗时被二次截断
        if self.max_chunk_size > self.max_input_chars {
            return Err(TranslationError::Config(format!(
                "分块大小 ({}) 不能超过传输字符上限 ({})",
                self.max_chunk_size, self.max_input_chars
            )));
        }

        if self.target_language.trim().is_empty() {
            return Err(TranslationError::Config("目标语言不能为空".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("DOUBAO_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = key;
            }
        }

        if let Ok(lang) = std::env::var("DOUBAO_TARGET_LANG") {
            if !lang.trim().is_empty() {
                self.target_language = lang;
            }
        }

        if let Ok(endpoint) = std::env::var("DOUBAO_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                tracing::info!("环境变量覆盖接口地址: {}", endpoint);
                self.endpoint = endpoint;
            }
        }

        if let Ok(value) = std::env::var("DOUBAO_MAX_CONCURRENCY") {
            if let Ok(max_concurrency) = value.parse::<usize>() {
                self.max_concurrency = max_concurrency;
            }
        }

        if let Ok(value) = std::env::var("DOUBAO_CACHE_CAPACITY") {
            if let Ok(capacity) = value.parse::<usize>() {
                self.cache_capacity = capacity;
            }
        }
    }

    /// 请求超时时间
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    ///
    /// 加载顺序：配置文件 → 环境变量覆盖 → 验证。
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<TranslationConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        // 查找配置文件
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::Config(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| TranslationError::Config(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::Config(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() {
                if dotenv::from_filename(env_file).is_ok() {
                    tracing::info!("已加载环境变量文件: {}", env_file);
                    break;
                }
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
