//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话生命周期和并发调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 初始化共享依赖（HTTP 查询客户端、浏览器启动器）
//! - 把一次请求交给调度器并打印结果
//!
//! ### `dispatcher` - 会话调度器
//! - 每个请求创建独立的会话和事件通道
//! - 控制并发数量（Semaphore）
//!
//! ### `session` - 单个会话
//! - 状态机：查询 → 渲染 → 合并 → 保存
//! - 拥有临时目录，任何结束路径都会清理
//! - 保证只推送一个终止事件
//!
//! ## 层次关系
//!
//! ```text
//! app / dispatcher (处理多个请求)
//!     ↓
//! session (处理一个请求)
//!     ↓
//! workflow::RenderLoop / merge::BatchMerger
//!     ↓
//! services (能力层：事件推送) / clients / browser
//!     ↓
//! infrastructure (基础设施：Workspace)
//! ```

pub mod app;
pub mod dispatcher;
pub mod session;

// 重新导出主要类型
pub use app::App;
pub use dispatcher::{Dispatcher, SessionHandle};
pub use session::{short_id, Session, SessionContext, SessionOutcome, SessionState};
