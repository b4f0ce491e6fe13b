use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PageTask;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 错误类别，随 `error` 事件一起发给调用方，便于程序化处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Lookup,
    Render,
    Merge,
    Persist,
    Workspace,
    Internal,
}

/// 会话错误类型
///
/// 任何一种都会让所属会话立即进入 `Failed` 状态
#[derive(Debug, Error)]
pub enum SessionError {
    /// 查询模块列表失败
    #[error("API错误: {0}")]
    Lookup(#[from] LookupError),
    /// 页面渲染失败
    #[error("渲染错误: {0}")]
    Render(#[from] RenderError),
    /// 合并失败
    #[error("合并错误: {0}")]
    Merge(#[from] MergeError),
    /// 最终文件写入失败
    #[error("保存文件失败 ({path}): {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 临时目录创建/删除失败
    #[error("临时目录错误: {0}")]
    Workspace(#[from] WorkspaceError),
    /// 处理过程中发生 panic
    #[error("内部错误: {0}")]
    Panicked(String),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Lookup(_) => ErrorKind::Lookup,
            SessionError::Render(_) => ErrorKind::Render,
            SessionError::Merge(_) => ErrorKind::Merge,
            SessionError::Persist { .. } => ErrorKind::Persist,
            SessionError::Workspace(_) => ErrorKind::Workspace,
            SessionError::Panicked(_) => ErrorKind::Internal,
        }
    }
}

/// 查询 API 错误
#[derive(Debug, Error)]
pub enum LookupError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// API 返回非 2xx 状态
    #[error("API返回错误响应 ({endpoint}): status={status}")]
    BadStatus { endpoint: String, status: u16 },
    /// 请求超时
    #[error("API请求超时 ({endpoint}), 已等待 {secs} 秒")]
    Timeout { endpoint: String, secs: u64 },
    /// 返回内容无法解析
    #[error("无法解析API返回的数据: {reason}")]
    Unparseable { reason: String },
}

/// 浏览器渲染层的失败原因（不携带页面信息）
#[derive(Debug, Error)]
pub enum RenderFailure {
    /// 启动浏览器失败
    #[error("启动无头浏览器失败: {0}")]
    Launch(String),
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BoxError,
    },
    /// 打印 PDF 失败
    #[error("生成PDF失败 ({url}): {source}")]
    Print {
        url: String,
        #[source]
        source: BoxError,
    },
    /// 超时
    #[error("渲染 {url} 超时, 已等待 {secs} 秒")]
    Timeout { url: String, secs: u64 },
    /// 关闭浏览器失败
    #[error("关闭浏览器失败: {0}")]
    Shutdown(String),
}

/// 渲染错误，尽可能定位到出错的页面
#[derive(Debug, Error)]
#[error("{}{cause}", describe_task(.task))]
pub struct RenderError {
    pub task: Option<PageTask>,
    #[source]
    pub cause: RenderFailure,
}

impl RenderError {
    pub fn for_task(task: &PageTask, cause: RenderFailure) -> Self {
        Self {
            task: Some(task.clone()),
            cause,
        }
    }

    pub fn engine(cause: RenderFailure) -> Self {
        Self { task: None, cause }
    }
}

fn describe_task(task: &Option<PageTask>) -> String {
    match task {
        Some(task) => format!("[页面 #{} {}] ", task.sequence_index + 1, task.source_url),
        None => String::new(),
    }
}

/// 合并错误
#[derive(Debug, Error)]
pub enum MergeError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 不是合法的 PDF
    #[error("无效的PDF文档 ({path}): {source}")]
    InvalidDocument {
        path: String,
        #[source]
        source: lopdf::Error,
    },
    /// 文档中没有任何页面
    #[error("PDF文档不包含任何页面: {path}")]
    EmptyDocument { path: String },
    /// 复制页面对象失败
    #[error("复制PDF对象失败: {0}")]
    Copy(#[from] lopdf::Error),
    /// 序列化合并结果失败
    #[error("序列化PDF失败: {0}")]
    Encode(String),
}

/// 临时目录错误
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("无法创建临时目录: {0}")]
    CreateFailed(#[source] std::io::Error),
    #[error("无法写入临时文件 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("无法删除临时目录 ({path}): {source}")]
    RemoveFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== Result 类型别名 ==========

/// 会话结果类型
pub type SessionResult<T> = Result<T, SessionError>;
