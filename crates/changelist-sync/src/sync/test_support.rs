//! 测试用的内存 Syncable / VersionStore

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::change_list::NetworkChangeList;
use crate::error::{Result, SyncError};
use crate::model_type::ModelType;
use crate::storage::{MemoryVersionStore, VersionStore, VersionsUpdate};
use crate::sync::Syncable;
use crate::versions::ChangeListVersions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(i64),
    Delete(Vec<String>),
    Update(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch,
    Delete,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// 返回网络错误
    Error,
    /// 返回 SyncError::Cancelled
    Cancel,
    /// 永不返回
    Hang,
}

/// 远端变更历史 + 本地实体集合
pub struct FakeSyncable {
    model_type: ModelType,
    remote: Mutex<Vec<NetworkChangeList>>,
    local: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<Call>>,
    fault: Mutex<Option<(Step, Fault)>>,
    fetch_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSyncable {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            remote: Mutex::new(Vec::new()),
            local: Mutex::new(BTreeSet::new()),
            calls: Mutex::new(Vec::new()),
            fault: Mutex::new(None),
            fetch_delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_changes(model_type: ModelType, changes: Vec<NetworkChangeList>) -> Self {
        let fake = Self::new(model_type);
        fake.push_changes(changes);
        fake
    }

    pub fn push_changes(&self, changes: Vec<NetworkChangeList>) {
        self.remote.lock().extend(changes);
    }

    pub fn seed_local<I: IntoIterator<Item = &'static str>>(&self, ids: I) {
        self.local.lock().extend(ids.into_iter().map(String::from));
    }

    pub fn set_fault(&self, step: Step, fault: Fault) {
        *self.fault.lock() = Some((step, fault));
    }

    pub fn clear_fault(&self) {
        *self.fault.lock() = None;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn local(&self) -> BTreeSet<String> {
        self.local.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn inject(&self, step: Step) -> Result<()> {
        let fault = *self.fault.lock();
        match fault {
            Some((s, Fault::Error)) if s == step => {
                Err(SyncError::Network(format!("{:?} failed", step)))
            }
            Some((s, Fault::Cancel)) if s == step => Err(SyncError::Cancelled),
            Some((s, Fault::Hang)) if s == step => std::future::pending().await,
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Syncable for FakeSyncable {
    fn model_type(&self) -> ModelType {
        self.model_type
    }

    async fn fetch_change_list(&self, after_version: i64) -> Result<Vec<NetworkChangeList>> {
        self.calls.lock().push(Call::Fetch(after_version));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.inject(Step::Fetch).await?;
        Ok(self
            .remote
            .lock()
            .iter()
            .filter(|c| c.change_list_version > after_version)
            .cloned()
            .collect())
    }

    async fn delete_models(&self, ids: &[String]) -> Result<()> {
        self.calls.lock().push(Call::Delete(ids.to_vec()));
        self.inject(Step::Delete).await?;
        let mut local = self.local.lock();
        for id in ids {
            local.remove(id);
        }
        Ok(())
    }

    async fn update_models(&self, ids: &[String]) -> Result<()> {
        self.calls.lock().push(Call::Update(ids.to_vec()));
        self.inject(Step::Update).await?;
        self.local.lock().extend(ids.iter().cloned());
        Ok(())
    }
}

/// 记录 update 调用次数的内存版本存储，可模拟写入失败
#[derive(Default)]
pub struct CountingVersionStore {
    inner: MemoryVersionStore,
    updates: AtomicUsize,
    fail_updates: Mutex<bool>,
}

impl CountingVersionStore {
    pub fn with_versions(versions: ChangeListVersions) -> Self {
        Self {
            inner: MemoryVersionStore::with_versions(versions),
            ..Self::default()
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn fail_updates(&self, fail: bool) {
        *self.fail_updates.lock() = fail;
    }
}

#[async_trait]
impl VersionStore for CountingVersionStore {
    async fn read(&self) -> Result<ChangeListVersions> {
        self.inner.read().await
    }

    async fn update(&self, f: VersionsUpdate<'_>) -> Result<ChangeListVersions> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let fail = *self.fail_updates.lock();
        if fail {
            return Err(SyncError::KvStore("write rejected".to_string()));
        }
        self.inner.update(f).await
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
