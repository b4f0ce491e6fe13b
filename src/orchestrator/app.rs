//! 应用入口 - 编排层
//!
//! 持有共享的会话依赖和调度器，把命令行请求交给一个会话处理，
//! 并把会话的事件流打印出来。

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info};

use crate::config::Config;
use crate::models::{PersistedDocument, SessionEvent};
use crate::orchestrator::dispatcher::Dispatcher;
use crate::orchestrator::session::SessionContext;
use crate::utils::{log_startup, print_result};

/// 应用主结构
pub struct App {
    dispatcher: Dispatcher,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let ctx = SessionContext::from_config(&config).context("创建 HTTP 客户端失败")?;
        Ok(Self::with_context(Arc::new(ctx), config.max_concurrent_sessions))
    }

    /// 使用自定义依赖（测试中用假的查询和渲染器）
    pub fn with_context(ctx: Arc<SessionContext>, max_concurrent: usize) -> Self {
        Self {
            dispatcher: Dispatcher::new(ctx, max_concurrent),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// 处理一个 URL，直到会话结束
    pub async fn run(&self, target_url: &str) -> Result<PersistedDocument> {
        let mut handle = self.dispatcher.generate(target_url);

        // 日志事件已经由会话写进 tracing，这里只关心终止事件
        while let Some(event) = handle.events.recv().await {
            match event {
                SessionEvent::Done { result_id } => info!("📥 结果 ID: {}", result_id),
                SessionEvent::Error { kind, message } => {
                    error!("❌ 生成失败 ({:?}): {}", kind, message)
                }
                SessionEvent::Log { .. } | SessionEvent::Progress { .. } => {}
            }
        }

        let outcome = handle
            .task
            .await
            .map_err(|e| anyhow!("会话任务执行失败: {}", e))?;
        let document = outcome.into_result()?;

        print_result(target_url, &document);
        Ok(document)
    }
}
