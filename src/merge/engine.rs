//! 分批合并引擎
//!
//! ## 算法
//!
//! 1. 把页面产物按顺序切分为不超过 `capacity` 个的连续批次
//! 2. 逐批合并，每批写成一个中间文档，并删除已消费的页面产物
//! 3. 按创建顺序合并所有中间文档得到最终文档
//!
//! 同一时刻最多只加载 `capacity` 个源文档。中间文档数量超过 `capacity` 时，
//! 第 3 步会继续分层合并，而不是一次性全部加载。

use std::ops::Range;
use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{debug, info};

use crate::config::BATCH_CAPACITY;
use crate::error::{MergeError, SessionError};
use crate::infrastructure::Workspace;
use crate::merge::copier::Accumulator;
use crate::models::{FinalDocument, IntermediateDocument, PageArtifact};
use crate::services::EventSink;

/// 一个批次：源文档序号上的连续区间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub range: Range<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// 把 `total` 个文档切分为不超过 `capacity` 的连续批次
///
/// 批次之间没有空隙、重叠，也不会改变顺序；只有最后一批可能不满
pub fn plan_batches(total: usize, capacity: usize) -> Vec<Batch> {
    let capacity = capacity.max(1);
    (0..total)
        .step_by(capacity)
        .enumerate()
        .map(|(index, start)| Batch {
            index,
            range: start..(start + capacity).min(total),
        })
        .collect()
}

/// 分批合并引擎
#[derive(Debug, Clone, Copy)]
pub struct BatchMerger {
    capacity: usize,
}

impl Default for BatchMerger {
    fn default() -> Self {
        Self::new(BATCH_CAPACITY)
    }
}

impl BatchMerger {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 合并所有页面产物
    ///
    /// 产物按值传入，合并进中间文档后即被删除
    pub async fn merge_all(
        &self,
        artifacts: Vec<PageArtifact>,
        workspace: &Workspace,
        sink: &dyn EventSink,
    ) -> Result<FinalDocument, SessionError> {
        if artifacts.is_empty() {
            sink.log("没有需要合并的页面，生成空文档");
            let bytes = Accumulator::new().into_bytes()?;
            return Ok(FinalDocument {
                bytes,
                page_count: 0,
                intermediate_count: 0,
            });
        }

        let paths: Vec<PathBuf> = artifacts.into_iter().map(PageArtifact::into_path).collect();
        let intermediates = self.merge_level(paths, 0, workspace, sink).await?;
        let intermediate_count = intermediates.len();

        let mut level = intermediates;
        let mut depth = 1;
        while level.len() > self.capacity {
            info!("中间文档数量 {} 超过 {}，继续分层合并", level.len(), self.capacity);
            let paths = level.into_iter().map(|doc| doc.path).collect();
            level = self.merge_level(paths, depth, workspace, sink).await?;
            depth += 1;
        }

        sink.log("合并所有中间批次...");
        let paths: Vec<PathBuf> = level.into_iter().map(|doc| doc.path).collect();
        let (bytes, page_count) = self.merge_group(&paths).await?;

        for path in &paths {
            workspace.discard(path).await?;
        }

        Ok(FinalDocument {
            bytes,
            page_count,
            intermediate_count,
        })
    }

    /// 一层分批合并：每批写成一个中间文档，并删除该批的源文件
    async fn merge_level(
        &self,
        sources: Vec<PathBuf>,
        depth: usize,
        workspace: &Workspace,
        sink: &dyn EventSink,
    ) -> Result<Vec<IntermediateDocument>, SessionError> {
        let batches = plan_batches(sources.len(), self.capacity);
        let total_batches = batches.len();
        let mut intermediates = Vec::with_capacity(total_batches);

        for batch in batches {
            let group = &sources[batch.range.clone()];
            sink.log(&format!(
                "合并第 {}/{} 批，共 {} 个PDF...",
                batch.index + 1,
                total_batches,
                group.len()
            ));

            let (bytes, page_count) = self.merge_group(group).await?;

            let name = format!("batch-{}-{:04}.pdf", depth, batch.index + 1);
            let path = workspace.write(&name, &bytes).await?;
            debug!("中间文档已写入: {} ({} 页)", path.display(), page_count);

            for consumed in group {
                workspace.discard(consumed).await?;
            }

            intermediates.push(IntermediateDocument {
                index: batch.index,
                path,
                sources: batch.range,
                page_count,
            });
        }

        Ok(intermediates)
    }

    /// 按顺序把一组文件合并成一个新文档，返回字节和页数
    ///
    /// 先读完整组文件再解析，`Document` 不跨越 await
    async fn merge_group(&self, paths: &[PathBuf]) -> Result<(Vec<u8>, usize), MergeError> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| MergeError::ReadFailed {
                    path: path.display().to_string(),
                    source,
                })?;
            sources.push((path.as_path(), bytes));
        }
        append_all(&sources)
    }
}

fn append_all(sources: &[(&Path, Vec<u8>)]) -> Result<(Vec<u8>, usize), MergeError> {
    let mut accumulator = Accumulator::new();
    for (path, bytes) in sources {
        let source = parse_document(path, bytes)?;
        accumulator.append(&source)?;
    }
    let page_count = accumulator.page_count();
    Ok((accumulator.into_bytes()?, page_count))
}

/// 解析 PDF，拒绝没有页面的文档
fn parse_document(path: &Path, bytes: &[u8]) -> Result<Document, MergeError> {
    let doc = Document::load_mem(bytes).map_err(|source| MergeError::InvalidDocument {
        path: path.display().to_string(),
        source,
    })?;

    if doc.get_pages().is_empty() {
        return Err(MergeError::EmptyDocument {
            path: path.display().to_string(),
        });
    }
    Ok(doc)
}
