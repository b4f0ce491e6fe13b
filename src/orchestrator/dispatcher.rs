//! 会话调度器 - 编排层
//!
//! 每次 `generate` 创建一个全新的会话，放到独立的 tokio 任务里运行。
//! 使用 Semaphore 限制同时运行的会话数量，超出的请求排队等待。

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::models::SessionEvent;
use crate::orchestrator::session::{short_id, Session, SessionContext, SessionOutcome};
use crate::services::ChannelSink;

/// 一次请求的句柄：事件流 + 最终结果
pub struct SessionHandle {
    pub session_id: Uuid,
    /// 该会话的事件流，最后一个事件一定是 `done` 或 `error`
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub task: JoinHandle<SessionOutcome>,
}

/// 会话调度器
#[derive(Clone)]
pub struct Dispatcher {
    ctx: Arc<SessionContext>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<SessionContext>, max_concurrent: usize) -> Self {
        Self {
            ctx,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// 当前可以立即开始的会话数量
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// 发起一次 PDF 生成请求
    pub fn generate(&self, target_url: impl Into<String>) -> SessionHandle {
        let (sink, events) = ChannelSink::new();
        let session = Session::new(target_url, Arc::new(sink));
        let session_id = session.id();

        let ctx = Arc::clone(&self.ctx);
        let permits = Arc::clone(&self.permits);
        let task = tokio::spawn(async move {
            let tag = short_id(&session_id);
            // Semaphore 不会被关闭，acquire 失败时不限流直接运行
            let _permit = permits.acquire_owned().await.ok();
            debug!("[会话 {}] 获得运行许可", tag);

            let outcome = session.run(&ctx).await;
            debug!("[会话 {}] 结束于 {:?}", tag, outcome.state());
            outcome
        });

        SessionHandle {
            session_id,
            events,
            task,
        }
    }
}
