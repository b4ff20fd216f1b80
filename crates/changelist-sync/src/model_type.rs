//! 模型类型枚举 - 受控枚举
//!
//! 每个类型在版本存储中占一个独立的 key，新增类型需客户端与服务端同步升级。

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// 参与增量同步的模型类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Topic,
    NewsResource,
}

impl ModelType {
    /// 全部类型，按同步注册顺序
    pub const ALL: &'static [ModelType] = &[ModelType::Topic, ModelType::NewsResource];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::NewsResource => "news_resource",
        }
    }
}

impl FromStr for ModelType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topic" => Ok(Self::Topic),
            "news_resource" => Ok(Self::NewsResource),
            other => Err(SyncError::InvalidArgument(format!("unknown model type: {}", other))),
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
