//! 临时工作目录 - 基础设施层
//!
//! 每个会话独占一个临时目录，只暴露"写文件 / 删文件 / 整体释放"的能力

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::WorkspaceError;

const WORKSPACE_PREFIX: &str = "pdf-temp-";

/// 会话私有的临时目录
///
/// 职责：
/// - 持有 `TempDir`，即使调用方忘记 `release()`，drop 时也会删除整个目录
/// - 记录写入过的文件
/// - 不认识 PageTask / Session
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
    written: Mutex<Vec<PathBuf>>,
}

impl Workspace {
    /// 在系统临时目录下分配新的工作目录
    pub fn allocate() -> Result<Self, WorkspaceError> {
        Self::allocate_in(std::env::temp_dir())
    }

    /// 在指定目录下分配新的工作目录
    pub fn allocate_in(parent: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)
            .map_err(WorkspaceError::CreateFailed)?;
        let root = dir.path().to_path_buf();
        debug!("分配临时目录: {}", root.display());

        Ok(Self {
            dir: Some(dir),
            root,
            written: Mutex::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 工作目录内的文件路径
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// 写入一个文件并记录下来
    pub async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, WorkspaceError> {
        let path = self.path_for(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| WorkspaceError::WriteFailed {
                path: path.display().to_string(),
                source,
            })?;

        if let Ok(mut written) = self.written.lock() {
            written.push(path.clone());
        }
        Ok(path)
    }

    /// 删除一个已消费的文件，文件已不存在时视为成功
    pub async fn discard(&self, path: &Path) -> Result<(), WorkspaceError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("文件已不存在: {}", path.display());
            }
            Err(source) => {
                return Err(WorkspaceError::RemoveFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
        }

        if let Ok(mut written) = self.written.lock() {
            written.retain(|p| p != path);
        }
        Ok(())
    }

    /// 仍未被删除的文件
    pub fn tracked(&self) -> Vec<PathBuf> {
        self.written
            .lock()
            .map(|written| written.clone())
            .unwrap_or_default()
    }

    pub fn is_released(&self) -> bool {
        self.dir.is_none()
    }

    /// 删除整个目录及其内容，可重复调用
    pub fn release(&mut self) -> Result<(), WorkspaceError> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };

        if let Ok(mut written) = self.written.lock() {
            written.clear();
        }

        match dir.close() {
            Ok(()) => {
                debug!("已删除临时目录: {}", self.root.display());
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                warn!("临时目录已不存在: {}", self.root.display());
                Ok(())
            }
            Err(source) => Err(WorkspaceError::RemoveFailed {
                path: self.root.display().to_string(),
                source,
            }),
        }
    }
}
