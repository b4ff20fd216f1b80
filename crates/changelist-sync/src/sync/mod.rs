//! 变更列表增量同步模块
//!
//! 职责：
//! - 按模型类型读取基线版本，拉取自该版本以来的变更列表
//! - 拆分删除/更新并交给各类型的 Syncable 应用到本地
//! - 应用成功后原子推进该类型的版本
//! - SyncWorker 负责多类型并发编排、重试与同步状态

pub mod reconciler;
pub mod syncable;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use reconciler::change_list_sync;
pub use syncable::Syncable;
pub use worker::{SyncStatus, SyncWorker, WorkResult};

use std::fmt;

use crate::error::SyncError;
use crate::model_type::ModelType;

/// 一轮同步所处的阶段（用于日志追踪）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Partitioning,
    Deleting,
    Updating,
    VersionUpdate,
    Success,
    Failed,
    Cancelled,
}

impl SyncPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Partitioning => "partitioning",
            Self::Deleting => "deleting",
            Self::Updating => "updating",
            Self::VersionUpdate => "version_update",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一轮成功同步的摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub model_type: ModelType,
    /// 本轮开始时的基线版本
    pub baseline_version: i64,
    /// 本轮结束后存储中的版本；空变更列表时等于基线
    pub latest_version: i64,
    pub deleted: usize,
    pub updated: usize,
}

impl SyncReport {
    pub(crate) fn unchanged(model_type: ModelType, baseline_version: i64) -> Self {
        Self {
            model_type,
            baseline_version,
            latest_version: baseline_version,
            deleted: 0,
            updated: 0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.deleted == 0 && self.updated == 0 && self.latest_version == self.baseline_version
    }
}

/// 一轮同步的结果
///
/// 取消与失败是两种不同结果：失败可以由调度层择机重试，取消说明调用方已经放弃。
#[derive(Debug)]
pub enum SyncOutcome {
    Success(SyncReport),
    Failure(SyncError),
    Cancelled,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncOutcome::Cancelled)
    }

    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Success(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::Failure(e) => Some(e),
            _ => None,
        }
    }
}
