//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（临时目录），只暴露能力

pub mod workspace;

pub use workspace::Workspace;
