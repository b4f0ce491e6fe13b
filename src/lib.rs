//! # PDF Batch Merge
//!
//! 把一个课程 URL 下的所有页面渲染成 PDF，并按顺序合并成一个文件
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（临时目录），只暴露能力
//! - `Workspace` - 每个会话独占的临时目录，结束时整体删除
//!
//! ### ② 业务能力层（Services / Clients / Browser / Merge）
//! - `services/` - `EventSink` 事件推送能力
//! - `clients/` - `PageLookup` 查询模块与页面列表
//! - `browser/` - `PageRenderer` 把 URL 渲染成单页 PDF
//! - `merge/` - `BatchMerger` 分批合并 PDF
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - `RenderLoop` 按顺序渲染所有页面并推送进度
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 单个会话的状态机
//! - `orchestrator/dispatcher` - 并发调度多个会话
//! - `orchestrator/app` - 命令行入口
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod merge;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{ChromiumLauncher, PageRenderer, RendererLauncher};
pub use clients::{HttpLookup, PageLookup};
pub use config::{Config, BATCH_CAPACITY};
pub use error::{ErrorKind, SessionError, SessionResult};
pub use infrastructure::Workspace;
pub use merge::BatchMerger;
pub use models::{PageTask, PersistedDocument, SessionEvent};
pub use orchestrator::{App, Dispatcher, Session, SessionContext, SessionHandle, SessionOutcome, SessionState};
pub use services::{ChannelSink, EventSink};
pub use workflow::RenderLoop;
