use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// 推送给请求方的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum SessionEvent {
    Log { message: String },
    Progress { completed: usize, total: usize },
    Done { result_id: String },
    Error { kind: ErrorKind, message: String },
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::Done { .. } | SessionEvent::Error { .. })
    }
}
