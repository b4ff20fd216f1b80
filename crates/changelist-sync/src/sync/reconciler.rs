//! 变更列表同步 - 单个模型类型的一轮同步
//!
//! 读基线版本 → 拉变更列表 → 拆分删除/更新 → 先删后更 → 推进版本。
//!
//! ## NOTE: 同类型不能并发
//!
//! 本函数内部不加锁。同一个 ModelType 的两轮同步不允许并发执行，由调用方保证
//! （SyncWorker 通过按类型的互斥锁保证）。不同类型之间可以任意并发，
//! 它们只读写版本存储中各自的那一项。
//!
//! 任何一步失败都不会推进版本，下一轮会从同一基线重放整批变更。

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{SyncOutcome, SyncPhase, SyncReport, Syncable};
use crate::change_list::{latest_version, ChangeListPartition};
use crate::error::{Result, SyncError};
use crate::model_type::ModelType;
use crate::storage::VersionStore;
use crate::versions::ChangeListVersions;

/// 执行一轮变更列表同步
///
/// - 成功：`SyncOutcome::Success`，版本已推进到本批最后一条的版本号（空列表时不动版本）
/// - 拉取/删除/更新/写版本任一步出错：`SyncOutcome::Failure`，版本不变
/// - `cancel` 被触发或 Syncable 返回 `SyncError::Cancelled`：`SyncOutcome::Cancelled`，版本不变
#[instrument(skip(store, syncable, cancel), fields(model_type = %syncable.model_type()))]
pub async fn change_list_sync(
    store: &dyn VersionStore,
    syncable: &dyn Syncable,
    cancel: &CancellationToken,
) -> SyncOutcome {
    let model_type = syncable.model_type();
    match run_pass(store, syncable, cancel).await {
        Ok(report) => {
            enter(model_type, SyncPhase::Success);
            if report.is_noop() {
                debug!("change_list_sync {} 无新变更，version={}", model_type, report.baseline_version);
            } else {
                info!(
                    "change_list_sync {} 完成: version {} -> {}, 删除 {} 条, 更新 {} 条",
                    model_type,
                    report.baseline_version,
                    report.latest_version,
                    report.deleted,
                    report.updated
                );
            }
            SyncOutcome::Success(report)
        }
        Err(SyncError::Cancelled) => {
            enter(model_type, SyncPhase::Cancelled);
            info!("change_list_sync {} 已取消，版本未推进", model_type);
            SyncOutcome::Cancelled
        }
        Err(e) => {
            enter(model_type, SyncPhase::Failed);
            warn!("change_list_sync {} 失败，版本未推进: {}", model_type, e);
            SyncOutcome::Failure(e)
        }
    }
}

async fn run_pass(
    store: &dyn VersionStore,
    syncable: &dyn Syncable,
    cancel: &CancellationToken,
) -> Result<SyncReport> {
    let model_type = syncable.model_type();
    enter(model_type, SyncPhase::Idle);
    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }

    enter(model_type, SyncPhase::Fetching);
    let versions = store.read().await?;
    let baseline_version = syncable.read_version(&versions);
    let changes = cancellable(cancel, syncable.fetch_change_list(baseline_version)).await?;

    let Some(latest) = latest_version(&changes) else {
        return Ok(SyncReport::unchanged(model_type, baseline_version));
    };
    debug!(
        "change_list_sync {} 拉取到 {} 条变更 (after {})",
        model_type,
        changes.len(),
        baseline_version
    );

    enter(model_type, SyncPhase::Partitioning);
    let partition = ChangeListPartition::partition(&changes);

    // 先删后更：同一批里先删后建的实体最终处于存在状态
    enter(model_type, SyncPhase::Deleting);
    cancellable(cancel, syncable.delete_models(&partition.deleted)).await?;

    enter(model_type, SyncPhase::Updating);
    cancellable(cancel, syncable.update_models(&partition.updated)).await?;

    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }

    enter(model_type, SyncPhase::VersionUpdate);
    store
        .update(&|versions: &ChangeListVersions| syncable.update_version(versions, latest))
        .await?;

    Ok(SyncReport {
        model_type,
        baseline_version,
        latest_version: latest,
        deleted: partition.deleted.len(),
        updated: partition.updated.len(),
    })
}

/// 在挂起点上响应取消
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        result = fut => result,
    }
}

fn enter(model_type: ModelType, phase: SyncPhase) {
    tracing::trace!(model_type = %model_type, phase = %phase, "change_list_sync phase");
}
