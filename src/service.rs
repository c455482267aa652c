//! 翻译服务门面
//!
//! 对外的唯一入口：接收整段任务文本，完成缓存查询、控制字符清洗、
//! 分块、并发调度、失败降级与归并，最终返回整段译文并回填缓存。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{fingerprint, CacheStats, RequestCache};
use crate::chunker::{merge_chunks, split_text};
use crate::config::TranslationConfig;
use crate::error::TranslationResult;
use crate::messages::{Request, Response};
use crate::provider::DoubaoClient;
use crate::sanitizer::strip_control_chars;
use crate::scheduler::Scheduler;

/// 单次翻译任务的结果
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    /// 归并后的整段译文
    pub translation: String,
    /// 是否直接命中缓存
    pub cached: bool,
    /// 本次任务拆出的块数（缓存命中时为 0）
    pub chunks: usize,
}

/// 分块进度通知
#[derive(Debug, Clone, Copy)]
pub struct TranslationProgress {
    pub done: usize,
    pub total: usize,
}

type ProgressCallback = Arc<dyn Fn(TranslationProgress) + Send + Sync>;

/// 服务级累计统计
#[derive(Debug, Default)]
struct ServiceCounters {
    tasks: AtomicU64,
    chunk_failures: AtomicU64,
    chars_sent: AtomicU64,
    chars_received: AtomicU64,
    processing_micros: AtomicU64,
}

/// 服务统计快照
#[derive(Debug, Clone, Default)]
pub struct ServiceStats {
    pub tasks: u64,
    pub chunk_failures: u64,
    pub chars_sent: u64,
    pub chars_received: u64,
    pub processing_micros: u64,
}

/// 翻译服务：缓存、客户端与调度器的组合
pub struct TranslationService {
    client: Arc<DoubaoClient>,
    cache: Arc<RequestCache>,
    scheduler: Scheduler,
    config: TranslationConfig,
    counters: ServiceCounters,
}

impl TranslationService {
    /// 按配置组装服务，配置非法时拒绝启动
    ///
    /// 内部会启动调度器的派发循环，必须在 Tokio 运行时内调用。
    pub fn new(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;

        let client = Arc::new(DoubaoClient::new(&config)?);
        let cache = Arc::new(RequestCache::new(config.cache_capacity));
        let scheduler = Scheduler::new(config.max_concurrency);

        tracing::info!(
            "翻译服务已启动: 模型 {}, 并发上限 {}, 缓存容量 {}",
            config.model,
            config.max_concurrency,
            config.cache_capacity
        );

        Ok(Self {
            client,
            cache,
            scheduler,
            config,
            counters: ServiceCounters::default(),
        })
    }

    /// 仅凭 API Key 与目标语言快速组装服务，其余全部取默认值
    pub fn with_defaults(api_key: &str, target_language: &str) -> TranslationResult<Self> {
        Self::new(TranslationConfig::default_with_lang(target_language, Some(api_key)))
    }

    /// 翻译整段文本
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> TranslationResult<TranslationOutcome> {
        self.translate_inner(text, target_language, None).await
    }

    /// 翻译整段文本，逐块回报进度
    pub async fn translate_with_progress(
        &self,
        text: &str,
        target_language: &str,
        progress: ProgressCallback,
    ) -> TranslationResult<TranslationOutcome> {
        self.translate_inner(text, target_language, Some(progress)).await
    }

    async fn translate_inner(
        &self,
        text: &str,
        target_language: &str,
        progress: Option<ProgressCallback>,
    ) -> TranslationResult<TranslationOutcome> {
        if text.trim().is_empty() {
            return Ok(TranslationOutcome {
                translation: String::new(),
                cached: false,
                chunks: 0,
            });
        }

        self.counters.tasks.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        // 指纹取自清洗前的原始文本，相同输入必然命中同一条缓存
        let key = fingerprint(target_language, text);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!("缓存命中: {} 字符", hit.chars().count());
            return Ok(TranslationOutcome {
                translation: hit,
                cached: true,
                chunks: 0,
            });
        }

        let clean = strip_control_chars(text);
        let chunks = split_text(&clean, self.config.max_chunk_size);
        let total = chunks.len();
        self.counters
            .chars_sent
            .fetch_add(clean.chars().count() as u64, Ordering::Relaxed);
        tracing::debug!("任务拆分为 {total} 个块");

        let handles: Vec<_> = chunks
            .iter()
            .map(|chunk| {
                let client = Arc::clone(&self.client);
                let chunk = chunk.clone();
                let target = target_language.to_string();
                self.scheduler
                    .enqueue(async move { client.translate(&chunk, &target).await })
            })
            .collect();

        let mut translated = Vec::with_capacity(total);
        let mut first_error = None;
        let mut failed = 0usize;
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.wait().await {
                Ok(result) => translated.push(result),
                Err(e) => {
                    // 单块失败降级为保留原文，整段任务继续
                    tracing::warn!("第 {} 块翻译失败，保留原文: {}", index + 1, e);
                    self.counters.chunk_failures.fetch_add(1, Ordering::Relaxed);
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    translated.push(chunks[index].clone());
                }
            }
            if let Some(callback) = &progress {
                callback(TranslationProgress {
                    done: index + 1,
                    total,
                });
            }
        }

        if failed == total {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let merged = merge_chunks(translated);
        self.counters
            .chars_received
            .fetch_add(merged.chars().count() as u64, Ordering::Relaxed);
        self.counters
            .processing_micros
            .fetch_add(started.elapsed().as_micros() as u64, Ordering::Relaxed);

        // 只有全部块都成功的结果才进缓存，降级的合并文不能变成永久命中
        if failed == 0 {
            self.cache.put(key, merged.clone());
        } else {
            tracing::debug!("共 {failed} 个块降级为原文，本次结果不写入缓存");
        }

        Ok(TranslationOutcome {
            translation: merged,
            cached: false,
            chunks: total,
        })
    }

    /// 处理一条外部消息并生成应答
    pub async fn handle_message(&self, request: Request) -> Response {
        match request {
            Request::TranslateText { payload } => {
                if payload.text.trim().is_empty() {
                    return Response::failure("没有提供文本");
                }
                match self.translate(&payload.text, &payload.target_language).await {
                    Ok(outcome) => Response::translated(outcome.translation, outcome.cached),
                    Err(e) => Response::failure(&e.to_string()),
                }
            }
            Request::ClearCache => {
                let cleared = self.clear_cache();
                tracing::info!("缓存已清空: {cleared} 条");
                Response::cache_cleared(cleared)
            }
        }
    }

    /// 清空译文缓存，返回清除的条目数
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            tasks: self.counters.tasks.load(Ordering::Relaxed),
            chunk_failures: self.counters.chunk_failures.load(Ordering::Relaxed),
            chars_sent: self.counters.chars_sent.load(Ordering::Relaxed),
            chars_received: self.counters.chars_received.load(Ordering::Relaxed),
            processing_micros: self.counters.processing_micros.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
