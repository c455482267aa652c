//! 并发受限的 FIFO 任务调度器
//!
//! 所有翻译块请求先进入无界队列，由单个派发循环按入队顺序领取
//! 信号量许可后再启动执行，保证同时在途的请求数不超过并发上限，
//! 且任务的「开始执行」顺序与入队顺序严格一致。
//!
//! 调度器实例各自独立，互不共享队列与许可。必须在 Tokio 运行时
//! 内创建，派发循环随实例的发送端全部关闭而自然退出。

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Semaphore};

use crate::error::{TranslationError, TranslationResult};

type TaskFuture = Pin<Box<dyn Future<Output = TranslationResult<String>> + Send + 'static>>;

struct QueuedTask {
    future: TaskFuture,
    responder: oneshot::Sender<TranslationResult<String>>,
}

/// 单个已入队任务的结果句柄
pub struct TaskHandle {
    receiver: oneshot::Receiver<TranslationResult<String>>,
}

impl TaskHandle {
    /// 等待任务完成并取回结果
    pub async fn wait(self) -> TranslationResult<String> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(TranslationError::Scheduler("任务在交付前被丢弃".to_string())))
    }
}

/// 实例级调度器：无界排队，有界执行
pub struct Scheduler {
    queue: mpsc::UnboundedSender<QueuedTask>,
    active: Arc<AtomicUsize>,
    queued: Arc<AtomicUsize>,
    max_concurrency: usize,
}

impl Scheduler {
    /// 创建调度器并启动派发循环
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedTask>();
        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let active = Arc::new(AtomicUsize::new(0));
        let queued = Arc::new(AtomicUsize::new(0));

        let dispatcher_active = Arc::clone(&active);
        let dispatcher_queued = Arc::clone(&queued);
        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                // 先拿许可再派发，后续任务在此处排队等待
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                dispatcher_queued.fetch_sub(1, Ordering::SeqCst);
                let active = Arc::clone(&dispatcher_active);
                tokio::spawn(async move {
                    active.fetch_add(1, Ordering::SeqCst);
                    let result = task.future.await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    // 接收端先行放弃时结果直接丢弃
                    let _ = task.responder.send(result);
                    drop(permit);
                });
            }
            tracing::debug!("调度器派发循环退出");
        });

        Self {
            queue: tx,
            active,
            queued,
            max_concurrency,
        }
    }

    /// 把一个翻译任务加入队尾，立即返回结果句柄
    pub fn enqueue<F>(&self, future: F) -> TaskHandle
    where
        F: Future<Output = TranslationResult<String>> + Send + 'static,
    {
        let (responder, receiver) = oneshot::channel();
        self.queued.fetch_add(1, Ordering::SeqCst);

        let task = QueuedTask {
            future: Box::pin(future),
            responder,
        };
        if self.queue.send(task).is_err() {
            // 派发循环已退出，被丢弃的任务会让接收端得到 Scheduler 错误
            self.queued.fetch_sub(1, Ordering::SeqCst);
        }

        TaskHandle { receiver }
    }

    /// 正在执行的任务数
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// 仍在排队等待许可的任务数
    pub fn queued_count(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}
