//! 存储模块
//!
//! - KvStore: sled 键值存储，承载持久化数据
//! - VersionStore: 变更列表版本的原子读改写接口（sled / 内存两种实现）

pub mod kv;
pub mod version_store;

pub use kv::KvStore;
pub use version_store::{MemoryVersionStore, SledVersionStore, VersionStore, VersionsUpdate};
