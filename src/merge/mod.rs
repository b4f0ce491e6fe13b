//! 合并层
//!
//! - `copier` - 基于 lopdf 的页面深拷贝与累加文档
//! - `engine` - 分批合并引擎，限制同时加载的文档数量

pub mod copier;
pub mod engine;

#[cfg(test)]
pub(crate) mod fixtures;

pub use copier::Accumulator;
pub use engine::{plan_batches, Batch, BatchMerger};
