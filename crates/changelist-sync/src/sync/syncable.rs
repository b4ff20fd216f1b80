//! 单个模型类型的同步策略

use async_trait::async_trait;

use crate::change_list::NetworkChangeList;
use crate::error::Result;
use crate::model_type::ModelType;
use crate::versions::ChangeListVersions;

/// 某个模型类型如何读基线、拉变更、应用变更
///
/// 实现方负责自己的传输与本地写库；`delete_models` / `update_models` 需要幂等，
/// 因为失败的一轮会从同一基线完整重放。
///
/// 返回 [`SyncError::Cancelled`](crate::error::SyncError::Cancelled) 表示调用方取消，
/// 会被当作取消而不是失败上报。
#[async_trait]
pub trait Syncable: Send + Sync {
    fn model_type(&self) -> ModelType;

    /// 从版本快照中取出本类型的基线版本
    fn read_version(&self, versions: &ChangeListVersions) -> i64 {
        versions.get(self.model_type())
    }

    /// 拉取 `after_version` 之后的变更，按版本升序
    async fn fetch_change_list(&self, after_version: i64) -> Result<Vec<NetworkChangeList>>;

    /// 删除本地实体
    async fn delete_models(&self, ids: &[String]) -> Result<()>;

    /// 按 ID 重新拉取完整实体并写入本地
    async fn update_models(&self, ids: &[String]) -> Result<()>;

    /// 基于当前快照生成推进到 `latest_version` 后的新快照；只能改本类型的那一项
    fn update_version(&self, versions: &ChangeListVersions, latest_version: i64) -> ChangeListVersions {
        versions.with_version(self.model_type(), latest_version)
    }
}
