use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 待渲染的页面
///
/// 顺序由查询 API 的返回决定：先按模块顺序，再按模块内顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTask {
    /// 所属模块
    pub module_key: String,
    /// 在整个会话中的序号（从 0 开始）
    pub sequence_index: usize,
    /// 页面地址
    pub source_url: String,
}

impl Display for PageTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[模块 {} 页面#{}] {}",
            self.module_key,
            self.sequence_index + 1,
            self.source_url
        )
    }
}

/// 已渲染到磁盘的单页文档
///
/// 由创建它的会话独占，被合并阶段消费（按值移动）后删除。
/// 不实现 `Clone`，保证每个产物只被合并一次。
#[derive(Debug, PartialEq, Eq)]
pub struct PageArtifact {
    sequence_index: usize,
    path: PathBuf,
}

impl PageArtifact {
    pub fn new(sequence_index: usize, path: PathBuf) -> Self {
        Self {
            sequence_index,
            path,
        }
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// 页面产物在临时目录中的文件名，只由序号决定
pub fn page_file_name(sequence_index: usize) -> String {
    format!("page-{:05}.pdf", sequence_index + 1)
}
