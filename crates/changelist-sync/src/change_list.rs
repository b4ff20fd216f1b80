//! 变更列表
//!
//! 服务端按 `changeListVersion` 升序返回自某个基线版本以来的变更记录，
//! 每条记录只描述一个实体：要么删除，要么新建/更新。

use serde::{Deserialize, Serialize};

/// 单条变更记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkChangeList {
    /// 实体 ID（对同步层不透明）
    pub id: String,
    /// 单调递增的变更版本号
    pub change_list_version: i64,
    /// 是否为删除
    pub is_delete: bool,
}

impl NetworkChangeList {
    pub fn upsert(id: impl Into<String>, change_list_version: i64) -> Self {
        Self {
            id: id.into(),
            change_list_version,
            is_delete: false,
        }
    }

    pub fn delete(id: impl Into<String>, change_list_version: i64) -> Self {
        Self {
            id: id.into(),
            change_list_version,
            is_delete: true,
        }
    }
}

/// 变更列表拆分结果：待删除 / 待更新的实体 ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeListPartition {
    pub deleted: Vec<String>,
    pub updated: Vec<String>,
}

impl ChangeListPartition {
    /// 稳定拆分：两侧都保持原列表中的相对顺序
    pub fn partition(changes: &[NetworkChangeList]) -> Self {
        let mut partition = Self::default();
        for change in changes {
            if change.is_delete {
                partition.deleted.push(change.id.clone());
            } else {
                partition.updated.push(change.id.clone());
            }
        }
        partition
    }
}

/// 本批次的最新版本：未拆分列表最后一条的版本号
pub fn latest_version(changes: &[NetworkChangeList]) -> Option<i64> {
    changes.last().map(|c| c.change_list_version)
}
