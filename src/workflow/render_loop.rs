//! 渲染循环 - 流程层
//!
//! 核心职责：按顺序把每个页面渲染成临时目录中的单页 PDF
//!
//! - 严格按 `PageTask` 顺序执行，不跳过、不重排
//! - 每完成一页推送一次进度
//! - 第一个失败立即返回，已渲染的文件留给调用方清理

use std::time::Duration;

use tracing::debug;

use crate::browser::PageRenderer;
use crate::error::{RenderError, RenderFailure, SessionResult};
use crate::infrastructure::Workspace;
use crate::models::{page_file_name, PageArtifact, PageTask};
use crate::services::EventSink;

/// 渲染循环
pub struct RenderLoop {
    render_timeout: Duration,
}

impl RenderLoop {
    pub fn new(render_timeout: Duration) -> Self {
        Self { render_timeout }
    }

    pub async fn run(
        &self,
        renderer: &mut dyn PageRenderer,
        tasks: &[PageTask],
        workspace: &Workspace,
        sink: &dyn EventSink,
    ) -> SessionResult<Vec<PageArtifact>> {
        let total = tasks.len();
        let mut artifacts = Vec::with_capacity(total);
        let mut current_module: Option<&str> = None;

        for task in tasks {
            if current_module != Some(task.module_key.as_str()) {
                sink.log(&format!("处理模块: {}", task.module_key));
                current_module = Some(task.module_key.as_str());
            }
            sink.log(&format!("- 访问页面: {}", task.source_url));

            let bytes = self.render_one(renderer, task).await?;
            let path = workspace
                .write(&page_file_name(task.sequence_index), &bytes)
                .await?;
            debug!("页面已保存: {} ({} 字节)", path.display(), bytes.len());
            artifacts.push(PageArtifact::new(task.sequence_index, path));

            let completed = artifacts.len();
            sink.progress(completed, total);
            sink.log(&format!("进度: {} / {}", completed, total));
        }

        Ok(artifacts)
    }

    async fn render_one(
        &self,
        renderer: &mut dyn PageRenderer,
        task: &PageTask,
    ) -> Result<Vec<u8>, RenderError> {
        match tokio::time::timeout(self.render_timeout, renderer.render(&task.source_url)).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(cause)) => Err(RenderError::for_task(task, cause)),
            Err(_) => Err(RenderError::for_task(
                task,
                RenderFailure::Timeout {
                    url: task.source_url.clone(),
                    secs: self.render_timeout.as_secs(),
                },
            )),
        }
    }
}
