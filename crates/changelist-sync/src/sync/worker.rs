//! 同步编排层（SyncWorker）
//!
//! **职责边界**（与 change_list_sync 分离）：
//! - **change_list_sync**：只做「给定一个类型，读版本 → 拉变更 → 写库 → 推进版本」，无策略、无重试。
//! - **本模块**：决定同步哪些类型、并发执行、失败后按 RetryPolicy 退避重试，并对外发布同步状态。
//!
//! 同一类型的同步由按类型的互斥锁串行化；不同类型并发执行。

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{change_list_sync, SyncOutcome, Syncable};
use crate::config::{open_version_store, SyncConfig};
use crate::error::{Result, SyncError};
use crate::model_type::ModelType;
use crate::retry::RetryPolicy;
use crate::storage::VersionStore;

/// 一次后台任务的结果（交给宿主的任务调度器）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkResult {
    /// 所有类型都同步成功
    Success,
    /// 有类型失败，可以稍后整体重试
    Retry,
    /// 失败且不值得重试（或重试次数已用完）
    Failure,
    /// 调用方取消
    Cancelled,
}

/// 对外发布的同步状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub last_result: Option<WorkResult>,
    /// 最近一次全部成功的时间（毫秒时间戳）
    pub last_synced_at_ms: Option<i64>,
}

struct Registered {
    syncable: Arc<dyn Syncable>,
    lock: Arc<Mutex<()>>,
}

/// 同步编排器
pub struct SyncWorker {
    version_store: Arc<dyn VersionStore>,
    registered: Vec<Registered>,
    index: HashMap<ModelType, usize>,
    retry: RetryPolicy,
    status_tx: watch::Sender<SyncStatus>,
}

impl SyncWorker {
    pub fn new(version_store: Arc<dyn VersionStore>, retry: RetryPolicy) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::default());
        Self {
            version_store,
            registered: Vec::new(),
            index: HashMap::new(),
            retry,
            status_tx,
        }
    }

    /// 按配置打开版本存储并创建 Worker
    pub async fn from_config(config: &SyncConfig) -> Result<Self> {
        let version_store = open_version_store(config).await?;
        Ok(Self::new(version_store, config.retry.clone()))
    }

    /// 注册一个类型的同步策略；同一类型只能注册一次
    pub fn register(&mut self, syncable: Arc<dyn Syncable>) -> Result<()> {
        let model_type = syncable.model_type();
        if self.index.contains_key(&model_type) {
            return Err(SyncError::InvalidArgument(format!(
                "model type {} already registered",
                model_type
            )));
        }
        self.index.insert(model_type, self.registered.len());
        self.registered.push(Registered {
            syncable,
            lock: Arc::new(Mutex::new(())),
        });
        debug!("SyncWorker 注册类型: {}", model_type);
        Ok(())
    }

    pub fn model_types(&self) -> Vec<ModelType> {
        self.registered.iter().map(|r| r.syncable.model_type()).collect()
    }

    pub fn version_store(&self) -> &Arc<dyn VersionStore> {
        &self.version_store
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.status_tx.borrow().clone()
    }

    /// 同步单个类型（持有该类型的锁）
    pub async fn sync_model(&self, model_type: ModelType, cancel: &CancellationToken) -> SyncOutcome {
        match self.index.get(&model_type) {
            Some(&i) => self.sync_registered(&self.registered[i], cancel).await,
            None => SyncOutcome::Failure(SyncError::NotFound(format!(
                "model type {} not registered",
                model_type
            ))),
        }
    }

    async fn sync_registered(&self, registered: &Registered, cancel: &CancellationToken) -> SyncOutcome {
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return SyncOutcome::Cancelled,
            guard = registered.lock.lock() => guard,
        };
        change_list_sync(self.version_store.as_ref(), registered.syncable.as_ref(), cancel).await
    }

    /// 并发同步所有已注册类型，执行一次
    ///
    /// future 中途被丢弃（超时、`select!` 落选、任务被 abort）时 `is_syncing` 也会复位。
    pub async fn run_once(&self, cancel: &CancellationToken) -> WorkResult {
        self.status_tx.send_modify(|s| s.is_syncing = true);
        let syncing = SyncingFlag(&self.status_tx);

        let outcomes = join_all(
            self.registered
                .iter()
                .map(|registered| self.sync_registered(registered, cancel)),
        )
        .await;

        let result = summarize(&outcomes);
        // 正常结束：与结果一起发布，只通知一次
        std::mem::forget(syncing);
        self.status_tx.send_modify(|s| {
            s.is_syncing = false;
            s.last_result = Some(result);
            if result == WorkResult::Success {
                s.last_synced_at_ms = Some(chrono::Utc::now().timestamp_millis());
            }
        });
        result
    }

    /// 执行同步，失败时按重试策略退避后整体重试
    pub async fn run(&self, cancel: &CancellationToken) -> WorkResult {
        let mut attempt = 0u32;
        loop {
            let result = self.run_once(cancel).await;
            if result != WorkResult::Retry {
                return result;
            }
            if !self.retry.should_retry(attempt) {
                warn!("🔄 同步失败，已重试 {} 次，放弃", attempt);
                self.status_tx.send_modify(|s| s.last_result = Some(WorkResult::Failure));
                return WorkResult::Failure;
            }

            let delay = self.retry.delay_for(attempt);
            info!("🔄 同步失败，{:?} 后进行第 {} 次重试", delay, attempt + 1);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.status_tx.send_modify(|s| s.last_result = Some(WorkResult::Cancelled));
                    return WorkResult::Cancelled;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

/// 持有期间表示同步进行中，析构时清除 `is_syncing`
struct SyncingFlag<'a>(&'a watch::Sender<SyncStatus>);

impl Drop for SyncingFlag<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.is_syncing = false);
    }
}

fn summarize(outcomes: &[SyncOutcome]) -> WorkResult {
    if outcomes.iter().any(SyncOutcome::is_cancelled) {
        return WorkResult::Cancelled;
    }
    let errors: Vec<&SyncError> = outcomes.iter().filter_map(SyncOutcome::error).collect();
    if errors.is_empty() {
        WorkResult::Success
    } else if errors.iter().any(|e| e.is_retryable()) {
        WorkResult::Retry
    } else {
        WorkResult::Failure
    }
}
