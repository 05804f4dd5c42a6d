// --- File: crates/relay_common/src/batch.rs ---
//! Fail-fast concurrent fan-out.
//!
//! Batch helpers fan one operation out over many inputs. The semantic is
//! fail-fast: the first sub-operation to fail aborts the batch and no
//! partial results reach the caller. Callers wanting partial results should
//! settle each future individually instead of using this helper.

use futures::future::try_join_all;
use std::future::Future;

pub async fn batch_all<T, E, F>(futures: Vec<F>) -> Result<Vec<T>, E>
where
    F: Future<Output = Result<T, E>>,
{
    try_join_all(futures).await
}
