//! 翻译请求缓存
//!
//! 以目标语言加原始文本的 blake3 指纹为键，缓存整段任务的最终译文。
//! 指纹在任何清洗之前计算，保证相同的用户输入总能命中同一条缓存。
//! 条目由 LRU 策略管理，容量由配置决定。

use std::num::NonZeroUsize;
use std::sync::RwLock;

use lru::LruCache;

use crate::config::constants::DEFAULT_CACHE_CAPACITY;

/// 计算缓存键：`trans:` 前缀加 blake3 十六进制摘要
///
/// 摘要输入为 `目标语言 + "::" + 原始文本`，与原始文本逐字节绑定，
/// 不做任何规范化。
pub fn fingerprint(target_language: &str, raw_text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(target_language.as_bytes());
    hasher.update(b"::");
    hasher.update(raw_text.as_bytes());
    format!("trans:{}", hasher.finalize().to_hex())
}

/// 缓存命中统计
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
}

impl CacheStats {
    /// 命中率（0.0 ~ 1.0）
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.total_requests as f64
    }
}

/// 进程内 LRU 译文缓存
pub struct RequestCache {
    entries: RwLock<LruCache<String, String>>,
    stats: RwLock<CacheStats>,
}

impl RequestCache {
    /// 创建指定容量的缓存，容量为 0 时退回默认容量
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CACHE_CAPACITY))
            .unwrap();
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// 查询缓存，命中时刷新条目的 LRU 位置
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.write().unwrap();
        let result = entries.get(key).cloned();

        let mut stats = self.stats.write().unwrap();
        stats.total_requests += 1;
        if result.is_some() {
            stats.cache_hits += 1;
        } else {
            stats.cache_misses += 1;
        }
        result
    }

    /// 写入译文，超出容量时淘汰最久未使用的条目
    pub fn put(&self, key: String, translation: String) {
        self.entries.write().unwrap().put(key, translation);
    }

    /// 清空缓存，返回被清除的条目数量
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap();
        let cleared = entries.len();
        entries.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前统计快照
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().unwrap().clone();
        stats.total_entries = self.len();
        stats
    }
}
