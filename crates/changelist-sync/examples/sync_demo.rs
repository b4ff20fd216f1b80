//! 增量同步演示
//!
//! 用内存中的「远端」与「本地库」跑两轮同步，展示版本推进与增量拉取。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use changelist_sync::{
    ModelType, NetworkChangeList, Result, SyncConfig, SyncWorker, Syncable, WorkResult,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// 远端：完整变更历史 + 实体内容
struct Remote {
    changes: Mutex<Vec<NetworkChangeList>>,
    entities: Mutex<BTreeMap<String, String>>,
}

impl Remote {
    fn new() -> Self {
        Self {
            changes: Mutex::new(Vec::new()),
            entities: Mutex::new(BTreeMap::new()),
        }
    }

    fn put(&self, id: &str, title: &str) {
        let version = self.next_version();
        self.entities.lock().insert(id.to_string(), title.to_string());
        self.changes.lock().push(NetworkChangeList::upsert(id, version));
    }

    fn remove(&self, id: &str) {
        let version = self.next_version();
        self.entities.lock().remove(id);
        self.changes.lock().push(NetworkChangeList::delete(id, version));
    }

    fn next_version(&self) -> i64 {
        self.changes.lock().len() as i64 + 1
    }
}

struct TopicSyncable {
    remote: Arc<Remote>,
    local: Mutex<BTreeMap<String, String>>,
}

#[async_trait]
impl Syncable for TopicSyncable {
    fn model_type(&self) -> ModelType {
        ModelType::Topic
    }

    async fn fetch_change_list(&self, after_version: i64) -> Result<Vec<NetworkChangeList>> {
        Ok(self
            .remote
            .changes
            .lock()
            .iter()
            .filter(|c| c.change_list_version > after_version)
            .cloned()
            .collect())
    }

    async fn delete_models(&self, ids: &[String]) -> Result<()> {
        let mut local = self.local.lock();
        for id in ids {
            local.remove(id);
        }
        Ok(())
    }

    async fn update_models(&self, ids: &[String]) -> Result<()> {
        let entities = self.remote.entities.lock().clone();
        let mut local = self.local.lock();
        for id in ids {
            // 已在远端被删除的实体拉不到，跳过
            if let Some(title) = entities.get(id) {
                local.insert(id.clone(), title.clone());
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let data_dir = std::env::temp_dir().join("changelist_sync_demo");
    // 远端是内存里新建的，旧版本号没有意义
    let _ = std::fs::remove_dir_all(&data_dir);
    let config = SyncConfig::builder().data_dir(&data_dir).max_retries(2).build()?;

    let remote = Arc::new(Remote::new());
    remote.put("compose", "Compose");
    remote.put("kotlin", "Kotlin");
    remote.put("testing", "Testing");

    let topics = Arc::new(TopicSyncable {
        remote: remote.clone(),
        local: Mutex::new(BTreeMap::new()),
    });

    let mut worker = SyncWorker::from_config(&config).await?;
    worker.register(topics.clone())?;
    let cancel = CancellationToken::new();

    println!("=== 第一轮同步 ===");
    let result = worker.run(&cancel).await;
    println!("结果: {:?}", result);
    println!("本地: {:?}", topics.local.lock());
    println!("版本: {:?}", worker.version_store().read().await?);

    remote.remove("kotlin");
    remote.put("testing", "Testing & Debugging");

    println!("\n=== 第二轮同步（增量） ===");
    let result = worker.run(&cancel).await;
    println!("结果: {:?}", result);
    println!("本地: {:?}", topics.local.lock());
    println!("版本: {:?}", worker.version_store().read().await?);
    println!("状态: {:?}", worker.status());

    assert_eq!(result, WorkResult::Success);
    Ok(())
}
