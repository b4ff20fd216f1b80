use std::fmt;

use crate::config::ConfigError;

#[derive(Debug)]
pub enum SyncError {
    KvStore(String),
    Serialization(String),
    IO(String),
    /// 拉取变更列表或实体时的网络错误（可重试）
    Network(String),
    /// 本地实体存储写入失败
    Storage(String),
    InvalidArgument(String),
    NotFound(String),
    Config(String),
    /// 调用方取消了同步；不是失败，不能被当作 Failure 处理
    Cancelled,
    Other(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::KvStore(e) => write!(f, "KV store error: {}", e),
            SyncError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SyncError::IO(e) => write!(f, "IO error: {}", e),
            SyncError::Network(e) => write!(f, "Network error: {}", e),
            SyncError::Storage(e) => write!(f, "Storage error: {}", e),
            SyncError::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
            SyncError::NotFound(e) => write!(f, "Not found: {}", e),
            SyncError::Config(e) => write!(f, "Config error: {}", e),
            SyncError::Cancelled => write!(f, "Cancelled"),
            SyncError::Other(e) => write!(f, "Other error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<sled::Error> for SyncError {
    fn from(error: sled::Error) -> Self {
        SyncError::KvStore(error.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(error: serde_json::Error) -> Self {
        SyncError::Serialization(error.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(error: std::io::Error) -> Self {
        SyncError::IO(error.to_string())
    }
}

impl From<ConfigError> for SyncError {
    fn from(error: ConfigError) -> Self {
        SyncError::Config(error.to_string())
    }
}

impl SyncError {
    /// 是否为取消信号（取消需要原样上抛，而不是转换成失败）
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }

    /// 是否值得整轮重试
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network(_) | SyncError::Storage(_) | SyncError::KvStore(_) | SyncError::IO(_) => true,
            SyncError::Other(_) => true, // 未知错误按可重试处理
            SyncError::Serialization(_)
            | SyncError::InvalidArgument(_)
            | SyncError::NotFound(_)
            | SyncError::Config(_)
            | SyncError::Cancelled => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
