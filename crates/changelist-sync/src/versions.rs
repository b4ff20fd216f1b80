//! 变更列表版本快照

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model_type::ModelType;

/// 尚未同步过的类型的基线版本
pub const INITIAL_VERSION: i64 = -1;

/// 每个模型类型最后一次成功应用的变更版本
///
/// 只由同步流程在一轮同步成功后修改；缺失的类型视为 [`INITIAL_VERSION`]。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeListVersions {
    versions: BTreeMap<ModelType, i64>,
}

impl ChangeListVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, model_type: ModelType) -> i64 {
        self.versions
            .get(&model_type)
            .copied()
            .unwrap_or(INITIAL_VERSION)
    }

    /// 返回只修改了 `model_type` 一项的新快照
    pub fn with_version(&self, model_type: ModelType, version: i64) -> Self {
        let mut next = self.clone();
        next.versions.insert(model_type, version);
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelType, i64)> + '_ {
        self.versions.iter().map(|(k, v)| (*k, *v))
    }
}
