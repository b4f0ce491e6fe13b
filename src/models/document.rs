use std::ops::Range;
use std::path::{Path, PathBuf};

/// 一批页面合并后的中间文档
#[derive(Debug)]
pub struct IntermediateDocument {
    /// 创建顺序（从 0 开始）
    pub index: usize,
    pub path: PathBuf,
    /// 覆盖的源文档区间
    pub sources: Range<usize>,
    pub page_count: usize,
}

/// 合并完成的最终文档（内存中的字节）
///
/// 落盘位置由调用方决定
#[derive(Debug, Clone)]
pub struct FinalDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// 第一层批次产生的中间文档数量
    pub intermediate_count: usize,
}

/// 已保存的最终文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDocument {
    /// 返回给调用方的结果标识（即文件名）
    pub result_id: String,
    pub path: PathBuf,
    pub page_count: usize,
}

impl PersistedDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
