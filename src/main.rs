//! 命令行入口：读取参数或标准输入，走完整翻译管道后输出译文

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use doubao_translate::{ConfigManager, Request, TranslationConfig, TranslationService};

#[derive(Parser, Debug)]
#[command(name = "doubao-translate", version, about = "豆包文本翻译管道")]
struct Cli {
    /// 待翻译文本，省略时从标准输入读取
    text: Option<String>,

    /// 目标语言（如 zh、en、ja）
    #[arg(long = "to", default_value = "zh")]
    target_language: String,

    /// 豆包 API Key，优先于配置文件与环境变量
    #[arg(long)]
    api_key: Option<String>,

    /// 并发上限覆盖
    #[arg(long)]
    concurrency: Option<usize>,

    /// 分块大小覆盖（字符数）
    #[arg(long)]
    chunk_size: Option<usize>,

    /// 以 JSON 消息格式输出应答
    #[arg(long)]
    json: bool,

    /// 发送清空缓存消息并输出应答（演示消息契约用）
    #[arg(long)]
    clear_cache: bool,

    /// 在指定路径生成示例配置文件后退出
    #[arg(long, value_name = "PATH")]
    init_config: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Some(path) = cli.init_config {
        return match ConfigManager::generate_example_config(&path) {
            Ok(()) => {
                println!("示例配置已写入: {path}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("生成示例配置失败: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut config = match ConfigManager::new() {
        Ok(manager) => manager.get_config().clone(),
        Err(e) => {
            tracing::warn!("加载配置失败，使用默认配置: {}", e);
            let mut fallback = TranslationConfig::default();
            fallback.apply_env_overrides();
            fallback
        }
    };
    if let Some(key) = cli.api_key {
        config.api_key = key;
    }
    if let Some(concurrency) = cli.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.max_chunk_size = chunk_size;
    }

    if cli.clear_cache {
        let service = match TranslationService::new(config) {
            Ok(service) => service,
            Err(e) => {
                eprintln!("翻译服务启动失败: {e}");
                return ExitCode::FAILURE;
            }
        };
        let response = service.handle_message(Request::ClearCache).await;
        match serde_json::to_string_pretty(&response) {
            Ok(body) => println!("{body}"),
            Err(e) => {
                eprintln!("序列化应答失败: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let text = match cli.text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
                eprintln!("读取标准输入失败: {e}");
                return ExitCode::FAILURE;
            }
            buffer
        }
    };

    let service = match TranslationService::new(config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("翻译服务启动失败: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        let request = Request::TranslateText {
            payload: doubao_translate::TranslatePayload {
                text,
                target_language: cli.target_language,
            },
        };
        let response = service.handle_message(request).await;
        match serde_json::to_string_pretty(&response) {
            Ok(body) => {
                println!("{body}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("序列化应答失败: {e}");
                ExitCode::FAILURE
            }
        }
    } else {
        match service.translate(&text, &cli.target_language).await {
            Ok(outcome) => {
                println!("{}", outcome.translation);
                if outcome.cached {
                    tracing::debug!("结果来自缓存");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("翻译失败: {e}");
                ExitCode::FAILURE
            }
        }
    }
}
