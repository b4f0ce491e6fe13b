//! 事件推送服务 - 业务能力层
//!
//! 只负责"把日志/进度/结果推给请求方"，不关心流程

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::ErrorKind;
use crate::models::SessionEvent;

/// 事件接收方
///
/// 每个会话持有一个实例，绑定到发起请求的连接。
/// 连接关闭后继续推送是空操作，不是错误。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);

    fn log(&self, message: &str) {
        self.emit(SessionEvent::Log {
            message: message.to_string(),
        });
    }

    fn progress(&self, completed: usize, total: usize) {
        self.emit(SessionEvent::Progress { completed, total });
    }

    fn done(&self, result_id: &str) {
        self.emit(SessionEvent::Done {
            result_id: result_id.to_string(),
        });
    }

    fn error(&self, kind: ErrorKind, message: &str) {
        self.emit(SessionEvent::Error {
            kind,
            message: message.to_string(),
        });
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: SessionEvent) {
        (**self).emit(event);
    }
}

/// 把每个事件同时写进进程日志，再转发给真正的接收方
pub struct TracedSink<S> {
    tag: String,
    inner: S,
}

impl<S: EventSink> TracedSink<S> {
    pub fn new(tag: impl Into<String>, inner: S) -> Self {
        Self {
            tag: tag.into(),
            inner,
        }
    }
}

impl<S: EventSink> EventSink for TracedSink<S> {
    fn emit(&self, event: SessionEvent) {
        match &event {
            SessionEvent::Log { message } => info!("[会话 {}] {}", self.tag, message),
            SessionEvent::Progress { completed, total } => {
                debug!("[会话 {}] 进度 {}/{}", self.tag, completed, total)
            }
            SessionEvent::Done { result_id } => info!("[会话 {}] ✅ 完成: {}", self.tag, result_id),
            SessionEvent::Error { kind, message } => {
                error!("[会话 {}] ❌ {:?}: {}", self.tag, kind, message)
            }
        }
        self.inner.emit(event);
    }
}

/// 基于 channel 的事件推送，接收端即连接
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// 接收端是否已经断开
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: SessionEvent) {
        // 接收端断开后丢弃事件
        let _ = self.tx.send(event);
    }
}
