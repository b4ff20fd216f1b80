//! 变更列表版本存储
//!
//! 所有模型类型共享同一份 [`ChangeListVersions`] 快照，但每轮同步只读写自己那一项。
//! `update` 必须是原子读改写：两个不同类型的同步并发推进各自版本时不能互相覆盖。

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::storage::kv::KvStore;
use crate::versions::ChangeListVersions;

const VERSIONS_KEY: &str = "change_list_versions";

/// 版本更新函数；可能被调用多次（CAS 冲突重试），必须无副作用
pub type VersionsUpdate<'a> = &'a (dyn Fn(&ChangeListVersions) -> ChangeListVersions + Send + Sync);

/// 版本存储
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// 读取当前快照
    async fn read(&self) -> Result<ChangeListVersions>;

    /// 原子地用 `f` 更新快照，返回更新后的快照
    async fn update(&self, f: VersionsUpdate<'_>) -> Result<ChangeListVersions>;
}

/// 基于 sled 的持久化版本存储，进程重启后仍然有效
#[derive(Debug, Clone)]
pub struct SledVersionStore {
    kv: Arc<KvStore>,
}

impl SledVersionStore {
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl VersionStore for SledVersionStore {
    async fn read(&self) -> Result<ChangeListVersions> {
        Ok(self
            .kv
            .get::<&str, ChangeListVersions>(VERSIONS_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn update(&self, f: VersionsUpdate<'_>) -> Result<ChangeListVersions> {
        let updated = self
            .kv
            .compare_and_swap_with(VERSIONS_KEY, |current: Option<ChangeListVersions>| {
                f(&current.unwrap_or_default())
            })
            .await?;
        // CAS 已提交，读方已能看到新版本；刷盘失败只影响崩溃后的持久性
        if let Err(e) = self.kv.flush().await {
            tracing::warn!("版本已写入但刷盘失败: {}", e);
        }
        Ok(updated)
    }
}

/// 内存版本存储（不落盘）
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    versions: Mutex<ChangeListVersions>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(versions: ChangeListVersions) -> Self {
        Self {
            versions: Mutex::new(versions),
        }
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn read(&self) -> Result<ChangeListVersions> {
        Ok(self.versions.lock().clone())
    }

    async fn update(&self, f: VersionsUpdate<'_>) -> Result<ChangeListVersions> {
        let mut guard = self.versions.lock();
        let next = f(&guard);
        *guard = next.clone();
        Ok(next)
    }
}
