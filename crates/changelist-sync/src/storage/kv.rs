//! KV 存储模块 - 基于 sled 的键值存储
//!
//! 本模块提供：
//! - JSON 编码的键值读取
//! - 基于 compare_and_swap 的原子读改写

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sled::{Db, Tree};

use crate::error::{Result, SyncError};

const TREE_NAME: &str = "changelist_sync";

/// 打开数据库时遇到文件锁占用的最大尝试次数
const OPEN_ATTEMPTS: u32 = 8;
/// 首次重试前的等待时间，之后逐次翻倍
const OPEN_BACKOFF: Duration = Duration::from_millis(300);

/// KV 存储组件
#[derive(Debug, Clone)]
pub struct KvStore {
    db: Arc<Db>,
    tree: Tree,
}

impl KvStore {
    /// 在 `{base_path}/kv` 下打开（或创建）存储
    pub async fn new(base_path: &Path) -> Result<Self> {
        let kv_path = base_path.join("kv");

        tokio::fs::create_dir_all(&kv_path)
            .await
            .map_err(|e| SyncError::IO(format!("创建 KV 存储目录失败: {}", e)))?;

        let db = open_db(&kv_path).await?;
        let tree = db
            .open_tree(TREE_NAME)
            .map_err(|e| SyncError::KvStore(format!("打开 Tree 失败: {}", e)))?;

        tracing::info!("KV 存储已打开: {}", kv_path.display());

        Ok(Self {
            db: Arc::new(db),
            tree,
        })
    }

    /// 获取键值对
    pub async fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: for<'de> Deserialize<'de>,
    {
        let result = self
            .tree
            .get(key)
            .map_err(|e| SyncError::KvStore(format!("获取键值对失败: {}", e)))?;

        match result {
            Some(value_bytes) => Ok(Some(decode(&value_bytes)?)),
            None => Ok(None),
        }
    }

    /// 原子读改写
    ///
    /// `f` 基于当前值计算新值；若期间有其他写入，CAS 失败后会用最新值重新调用 `f`，
    /// 因此 `f` 必须是无副作用的。返回最终写入的值。
    pub async fn compare_and_swap_with<K, V, F>(&self, key: K, f: F) -> Result<V>
    where
        K: AsRef<[u8]>,
        V: Serialize + for<'de> Deserialize<'de>,
        F: Fn(Option<V>) -> V,
    {
        let key = key.as_ref();
        loop {
            let current_bytes = self
                .tree
                .get(key)
                .map_err(|e| SyncError::KvStore(format!("读取当前值失败: {}", e)))?;
            let current: Option<V> = match &current_bytes {
                Some(bytes) => Some(decode(bytes)?),
                None => None,
            };

            let new_value = f(current);
            let new_bytes = serde_json::to_vec(&new_value)
                .map_err(|e| SyncError::Serialization(format!("序列化值失败: {}", e)))?;

            let result = self
                .tree
                .compare_and_swap(key, current_bytes, Some(new_bytes))
                .map_err(|e| SyncError::KvStore(format!("原子更新失败: {}", e)))?;

            match result {
                Ok(()) => return Ok(new_value),
                Err(_) => {
                    // 被并发写入抢先，基于最新值重试
                    tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
                    continue;
                }
            }
        }
    }

    /// 刷盘
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| SyncError::KvStore(format!("刷盘失败: {}", e)))?;
        Ok(())
    }
}

/// 打开 sled 数据库
///
/// 同一目录的上一个实例可能还没释放文件锁，遇到锁冲突时指数退避后再试。
async fn open_db(path: &Path) -> Result<Db> {
    let mut backoff = OPEN_BACKOFF;
    let mut attempt = 1;
    loop {
        let err = match sled::open(path) {
            Ok(db) => return Ok(db),
            Err(e) => e,
        };
        if attempt >= OPEN_ATTEMPTS || !is_lock_contention(&err) {
            return Err(SyncError::KvStore(format!("打开 sled 数据库失败: {}", err)));
        }
        tracing::debug!(
            "数据库文件被占用，{:?} 后重试 ({}/{})",
            backoff,
            attempt,
            OPEN_ATTEMPTS
        );
        tokio::time::sleep(backoff).await;
        backoff *= 2;
        attempt += 1;
    }
}

fn is_lock_contention(err: &sled::Error) -> bool {
    match err {
        sled::Error::Io(io) if io.kind() == std::io::ErrorKind::WouldBlock => true,
        other => {
            let msg = other.to_string();
            msg.contains("could not acquire lock") || msg.contains("Resource temporarily unavailable")
        }
    }
}

fn decode<V>(bytes: &[u8]) -> Result<V>
where
    V: for<'de> Deserialize<'de>,
{
    serde_json::from_slice(bytes)
        .map_err(|e| SyncError::Serialization(format!("反序列化值失败: {}", e)))
}
