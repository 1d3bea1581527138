//! 生成编排器 - 编排层
//!
//! ## 职责
//!
//! 把一组输入（场景描述 / 照片）逐个交给 [`IllustrationService`]，得到一个 [`GenerationBatch`]。
//!
//! ## 约束
//!
//! - **严格顺序**：上一项结束（成功或失败）之后才开始下一项
//! - **失败不中断**：单项失败只记录到该条目，批次继续
//! - **协作式取消**：每项开始前检查 [`CancelFlag`]，进行中的调用不会被打断，
//!   未开始的条目保持 `Pending`
//! - **进度通知**：每项结束后向观察者发送一个 [`ProgressEvent`]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::logger::{log_batch_complete, log_batch_start};
use crate::models::{AgeBand, GenerationBatch, GenerationInput, GenerationStatus};
use crate::services::illustration::{IllustrationRequest, IllustrationService};

/// 批次参数，对所有条目相同
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationParams {
    pub age: AgeBand,
    /// 为每个条目附带按序号循环的风格变体
    pub vary_style: bool,
}

/// 取消标志
///
/// 克隆后共享同一个标志，可以交给 UI / 信号处理等其他任务。
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 单个条目结束后的进度事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 刚结束的条目序号（从 0 开始）
    pub current_index: usize,
    pub total: usize,
    /// 条目的最终状态（Done / Failed）
    pub status: GenerationStatus,
    /// 给展示层的描述
    pub phase: String,
}

impl ProgressEvent {
    /// 已结束的条目数
    pub fn completed(&self) -> usize {
        self.current_index + 1
    }
}

/// 进度观察者
pub trait ProgressObserver {
    fn on_progress(&mut self, event: ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: FnMut(ProgressEvent),
{
    fn on_progress(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// 通过通道把进度交给另一个任务；接收端关闭后事件被丢弃
impl ProgressObserver for UnboundedSender<ProgressEvent> {
    fn on_progress(&mut self, event: ProgressEvent) {
        if self.send(event).is_err() {
            debug!("进度接收端已关闭");
        }
    }
}

/// 不关心进度时使用
pub fn ignore_progress(_: ProgressEvent) {}

/// 生成编排器
pub struct GenerationOrchestrator<S> {
    service: S,
}

impl<S: IllustrationService> GenerationOrchestrator<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// 顺序处理整个批次
    ///
    /// 返回的批次长度总是等于输入数量；单项错误不会让整个调用失败。
    pub async fn run<O: ProgressObserver>(
        &self,
        inputs: Vec<GenerationInput>,
        params: &GenerationParams,
        cancel: &CancelFlag,
        observer: &mut O,
    ) -> GenerationBatch {
        let mut batch = GenerationBatch::new(inputs);
        let total = batch.len();
        log_batch_start(total, params.age.value());

        let mut cancelled = false;
        for index in 0..total {
            if cancel.is_cancelled() {
                info!("⏹️ 已取消，剩余 {} 项不再生成", total - index);
                cancelled = true;
                break;
            }

            let item = batch.item_mut(index);
            item.start();
            let request = IllustrationRequest {
                input: item.source.clone(),
                age: params.age,
                variant_index: params.vary_style.then_some(index),
            };

            info!("[{}/{}] 🖍️ 正在生成{}线稿", index + 1, total, item.source.kind());
            if let Some(style) = request.style() {
                debug!("[{}/{}] 风格: {}", index + 1, total, style);
            }

            let phase = match self.service.generate(&request).await {
                Ok(image) => {
                    info!("[{}/{}] ✓ 完成 ({} 字节)", index + 1, total, image.len());
                    item.succeed(image);
                    format!("Page {} of {} ready", index + 1, total)
                }
                Err(e) => {
                    warn!("[{}/{}] ✗ 生成失败: {}", index + 1, total, e);
                    item.fail(e.to_string());
                    format!("Page {} of {} failed", index + 1, total)
                }
            };

            observer.on_progress(ProgressEvent {
                current_index: index,
                total,
                status: item.status(),
                phase,
            });
        }

        log_batch_complete(batch.done_count(), batch.failed_count(), total, cancelled);
        batch
    }
}
