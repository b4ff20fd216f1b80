//! changelist-sync - 离线优先的增量同步
//!
//! 本库用变更列表版本（change-list version）把本地缓存与远端数据对齐，而不是每次全量下载：
//! - 📦 版本存储：每个模型类型记录最后成功应用的版本，sled 持久化，原子读改写
//! - 🔄 单轮同步：读基线 → 拉变更列表 → 先删后更 → 推进版本，失败不推进
//! - ⛔ 取消与失败分离：取消原样上报，不会被当成失败重试
//! - ⚙️ 编排层：多类型并发同步、按类型串行、指数退避重试、同步状态订阅
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use changelist_sync::{SyncConfig, SyncWorker, WorkResult};
//! # use changelist_sync::Syncable;
//! # fn topic_syncable() -> Arc<dyn Syncable> { unimplemented!() }
//! # fn news_syncable() -> Arc<dyn Syncable> { unimplemented!() }
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::builder()
//!         .data_dir("/path/to/data")
//!         .max_retries(3)
//!         .build()?;
//!
//!     let mut worker = SyncWorker::from_config(&config).await?;
//!     worker.register(topic_syncable())?;
//!     worker.register(news_syncable())?;
//!
//!     let cancel = CancellationToken::new();
//!     match worker.run(&cancel).await {
//!         WorkResult::Success => println!("同步完成"),
//!         other => println!("同步未完成: {:?}", other),
//!     }
//!     Ok(())
//! }
//! ```

pub mod change_list;
pub mod config;
pub mod error;
pub mod model_type;
pub mod retry;
pub mod storage;
pub mod sync;
pub mod versions;

// 重新导出核心类型，方便使用
pub use change_list::{latest_version, ChangeListPartition, NetworkChangeList};
pub use config::{open_version_store, ConfigError, SyncConfig, SyncConfigBuilder};
pub use error::{Result, SyncError};
pub use model_type::ModelType;
pub use retry::RetryPolicy;
pub use storage::{KvStore, MemoryVersionStore, SledVersionStore, VersionStore};
pub use sync::{
    change_list_sync, SyncOutcome, SyncPhase, SyncReport, SyncStatus, SyncWorker, Syncable,
    WorkResult,
};
pub use versions::{ChangeListVersions, INITIAL_VERSION};
