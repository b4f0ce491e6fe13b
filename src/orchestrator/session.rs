//! 单个会话 - 编排层
//!
//! ## 职责
//!
//! 一次 `generate(url)` 请求对应一个会话，按固定顺序驱动：
//! 查询 → 渲染 → 合并 → 保存 → 清理
//!
//! ## 状态机
//!
//! ```text
//! Created → LookupInProgress → Rendering → Merging → Persisting → Done
//!    └──────────────┴───────────────┴──────────┴──────────┴──────→ Failed
//! ```
//!
//! 会话之间不共享任何可变状态：各自的临时目录、页面列表、事件接收方。
//! 临时目录在任何结束路径上都会被删除。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::browser::{ChromiumLauncher, RendererLauncher};
use crate::clients::{parse_page_tasks, HttpLookup, PageLookup};
use crate::config::{Config, BATCH_CAPACITY};
use crate::error::{RenderError, SessionError, SessionResult};
use crate::infrastructure::Workspace;
use crate::merge::BatchMerger;
use crate::models::{FinalDocument, PageArtifact, PageTask, PersistedDocument};
use crate::services::{EventSink, TracedSink};
use crate::workflow::RenderLoop;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    LookupInProgress,
    Rendering,
    Merging,
    Persisting,
    Done,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed)
    }

    /// 允许的状态转换
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Created, LookupInProgress)
            | (LookupInProgress, Rendering)
            | (Rendering, Merging)
            | (Merging, Persisting)
            | (Persisting, Done) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SessionState::Created => "已创建",
            SessionState::LookupInProgress => "查询模块列表",
            SessionState::Rendering => "渲染页面",
            SessionState::Merging => "合并PDF",
            SessionState::Persisting => "保存结果",
            SessionState::Done => "已完成",
            SessionState::Failed => "已失败",
        }
    }
}

/// 所有会话共用的只读依赖
pub struct SessionContext {
    pub lookup: Arc<dyn PageLookup>,
    pub launcher: Arc<dyn RendererLauncher>,
    /// 最终 PDF 的输出目录
    pub output_dir: PathBuf,
    /// 临时目录的父目录
    pub scratch_dir: PathBuf,
    pub render_timeout: Duration,
    pub merger: BatchMerger,
}

impl SessionContext {
    /// 使用真实的 HTTP 查询和 chromiumoxide 渲染
    pub fn from_config(config: &Config) -> SessionResult<Self> {
        let lookup = HttpLookup::new(config)?;
        Ok(Self::new(
            Arc::new(lookup),
            Arc::new(ChromiumLauncher::new(config)),
            config,
        ))
    }

    pub fn new(
        lookup: Arc<dyn PageLookup>,
        launcher: Arc<dyn RendererLauncher>,
        config: &Config,
    ) -> Self {
        Self {
            lookup,
            launcher,
            output_dir: config.output_dir.clone(),
            scratch_dir: std::env::temp_dir(),
            render_timeout: config.render_timeout(),
            merger: BatchMerger::new(BATCH_CAPACITY),
        }
    }
}

/// 一次请求的完整处理过程
pub struct Session {
    id: Uuid,
    target_url: String,
    state: SessionState,
    history: Vec<SessionState>,
    sink: Arc<dyn EventSink>,
    tasks: Vec<PageTask>,
    workspace_root: Option<PathBuf>,
}

impl Session {
    pub fn new(target_url: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        let id = Uuid::new_v4();
        let tag = short_id(&id);
        Self {
            id,
            target_url: target_url.into(),
            state: SessionState::Created,
            history: vec![SessionState::Created],
            sink: Arc::new(TracedSink::new(tag, sink)),
            tasks: Vec::new(),
            workspace_root: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 经历过的所有状态（含初始状态）
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// 运行整个流程，会话随之结束
    ///
    /// 成功时已推送 `done`，失败时已推送唯一一个 `error`；两种情况下临时目录都已删除
    pub async fn run(mut self, ctx: &SessionContext) -> SessionOutcome {
        self.log(&format!("开始处理 URL: {}", self.target_url));

        let result = match Workspace::allocate_in(&ctx.scratch_dir) {
            Ok(mut workspace) => {
                self.workspace_root = Some(workspace.root().to_path_buf());
                // panic 也要走失败路径：推送 error 事件并删除临时目录
                let result = AssertUnwindSafe(self.drive(ctx, &workspace))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(SessionError::Panicked(panic_message(payload.as_ref())))
                    });
                if let Err(e) = workspace.release() {
                    warn!("[会话 {}] 删除临时目录失败: {}", short_id(&self.id), e);
                }
                result
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = &result {
            self.fail(e);
        }

        SessionOutcome {
            session_id: self.id,
            history: self.history,
            page_count: self.tasks.len(),
            workspace_root: self.workspace_root,
            result,
        }
    }

    async fn drive(
        &mut self,
        ctx: &SessionContext,
        workspace: &Workspace,
    ) -> SessionResult<PersistedDocument> {
        // ========== 查询 ==========
        self.transition(SessionState::LookupInProgress);
        self.log("查询 API 获取模块列表...");
        let response = ctx.lookup.lookup(&self.target_url).await?;
        self.tasks = parse_page_tasks(&response)?;
        self.log(&format!("已获取 API 数据，共 {} 个页面", self.tasks.len()));

        // ========== 渲染 ==========
        self.transition(SessionState::Rendering);
        let artifacts = self.render(ctx, workspace).await?;

        // ========== 合并 ==========
        self.transition(SessionState::Merging);
        self.log(&format!("分批合并 {} 个PDF...", artifacts.len()));
        let document = ctx
            .merger
            .merge_all(artifacts, workspace, self.sink.as_ref())
            .await?;
        debug!(
            "[会话 {}] 合并完成: {} 页, {} 个中间文档",
            short_id(&self.id),
            document.page_count,
            document.intermediate_count
        );

        // ========== 保存 ==========
        self.transition(SessionState::Persisting);
        let persisted = self.persist(ctx, document).await?;
        self.log(&format!("PDF 已生成并保存至 {}", persisted.path.display()));

        self.transition(SessionState::Done);
        self.sink.done(&persisted.result_id);
        self.log(&format!("处理完成: {}", self.target_url));

        Ok(persisted)
    }

    /// 启动渲染引擎、渲染所有页面，并在进入合并前关闭引擎
    async fn render(
        &self,
        ctx: &SessionContext,
        workspace: &Workspace,
    ) -> SessionResult<Vec<PageArtifact>> {
        if self.tasks.is_empty() {
            self.log("没有需要渲染的页面");
            return Ok(Vec::new());
        }

        self.log("启动无头浏览器...");
        let mut renderer = ctx.launcher.launch().await.map_err(RenderError::engine)?;

        let rendered = RenderLoop::new(ctx.render_timeout)
            .run(renderer.as_mut(), &self.tasks, workspace, self.sink.as_ref())
            .await;

        self.log("关闭无头浏览器...");
        if let Err(e) = renderer.shutdown().await {
            warn!("[会话 {}] {}", short_id(&self.id), e);
        }

        rendered
    }

    async fn persist(
        &self,
        ctx: &SessionContext,
        document: FinalDocument,
    ) -> SessionResult<PersistedDocument> {
        let result_id = format!(
            "result-{}-{}.pdf",
            chrono::Utc::now().timestamp_millis(),
            short_id(&self.id)
        );
        let path = ctx.output_dir.join(&result_id);

        tokio::fs::create_dir_all(&ctx.output_dir)
            .await
            .map_err(|source| SessionError::Persist {
                path: ctx.output_dir.display().to_string(),
                source,
            })?;
        tokio::fs::write(&path, &document.bytes)
            .await
            .map_err(|source| SessionError::Persist {
                path: path.display().to_string(),
                source,
            })?;

        Ok(PersistedDocument {
            result_id,
            path,
            page_count: document.page_count,
        })
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            warn!(
                "[会话 {}] 非法状态转换: {:?} → {:?}",
                short_id(&self.id),
                self.state,
                next
            );
            return;
        }
        self.state = next;
        self.history.push(next);
        self.log(&format!("阶段: {}", next.label()));
    }

    fn fail(&mut self, error: &SessionError) {
        if self.state.is_terminal() {
            return;
        }
        self.transition(SessionState::Failed);
        self.sink.error(error.kind(), &error.to_string());
    }

    fn log(&self, message: &str) {
        self.sink.log(message);
    }
}

/// 会话结束后留下的记录
#[derive(Debug)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    /// 经历过的所有状态（含初始状态）
    pub history: Vec<SessionState>,
    /// 查询得到的页面数量
    pub page_count: usize,
    /// 使用过的临时目录（此时已删除）
    pub workspace_root: Option<PathBuf>,
    pub result: SessionResult<PersistedDocument>,
}

impl SessionOutcome {
    pub fn state(&self) -> SessionState {
        self.history.last().copied().unwrap_or(SessionState::Created)
    }

    pub fn into_result(self) -> SessionResult<PersistedDocument> {
        self.result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知原因".to_string()
    }
}

/// 会话 ID 的前 8 位，用于日志和文件名
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
