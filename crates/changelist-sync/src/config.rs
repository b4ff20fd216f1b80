//! 同步配置

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::storage::{KvStore, MemoryVersionStore, SledVersionStore, VersionStore};

/// 配置校验错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("持久化版本存储需要 data_dir")]
    MissingDataDir,

    #[error("退避因子必须 >= 1.0, 实际 {0}")]
    InvalidBackoffFactor(f64),

    #[error("max_delay_ms ({max}) 小于 base_delay_ms ({base})")]
    InvalidDelayRange { base: u64, max: u64 },
}

/// 同步配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// 数据存储目录（版本存储位于 `{data_dir}/kv`）
    pub data_dir: PathBuf,
    /// 整轮失败后的重试策略
    pub retry: RetryPolicy,
    /// 版本是否落盘；false 时使用内存存储
    pub durable_versions: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            retry: RetryPolicy::default(),
            durable_versions: true,
        }
    }
}

impl SyncConfig {
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::new()
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.durable_versions && self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingDataDir);
        }
        if self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidBackoffFactor(self.retry.backoff_factor));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::InvalidDelayRange {
                base: self.retry.base_delay_ms,
                max: self.retry.max_delay_ms,
            });
        }
        Ok(())
    }
}

pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SyncConfig::default(),
        }
    }

    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.data_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.retry.max_retries = max_retries;
        self
    }

    /// 版本只保存在内存中（进程退出即丢失）
    pub fn in_memory(mut self) -> Self {
        self.config.durable_versions = false;
        self
    }

    pub fn build(self) -> std::result::Result<SyncConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SyncConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 按配置打开版本存储
pub async fn open_version_store(config: &SyncConfig) -> Result<Arc<dyn VersionStore>> {
    config.validate()?;
    if config.durable_versions {
        let kv = Arc::new(KvStore::new(&config.data_dir).await?);
        Ok(Arc::new(SledVersionStore::new(kv)))
    } else {
        Ok(Arc::new(MemoryVersionStore::new()))
    }
}
