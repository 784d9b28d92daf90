//! A merge bound to one snapshot of a collection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

use crate::collection::CollectionSnapshot;
use crate::error::{PdfCollateError, Result};
use crate::merge::merger::{MergeOutput, Merger};
use crate::merge::progress::ProgressTracker;

/// Marks a collection as having a merge in flight until dropped.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    /// Claim the flag, failing with `Busy` if it is already held.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PdfCollateError::Busy)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A pending merge.
///
/// Created by [`PageCollection::begin_merge`](crate::PageCollection::begin_merge).
/// The job owns an immutable snapshot, so edits made to the collection after
/// it was created do not change its output. The collection refuses to start
/// another merge until the job is dropped or has finished running.
#[derive(Debug)]
pub struct MergeJob {
    snapshot: CollectionSnapshot,
    merger: Merger,
    progress: ProgressTracker,
    cancel: CancellationToken,
    _guard: InFlightGuard,
}

impl MergeJob {
    pub(crate) fn new(
        snapshot: CollectionSnapshot,
        merger: Merger,
        progress: ProgressTracker,
        guard: InFlightGuard,
    ) -> Self {
        Self {
            snapshot,
            merger,
            progress,
            cancel: CancellationToken::new(),
            _guard: guard,
        }
    }

    /// The pages and documents this job will merge.
    pub fn snapshot(&self) -> &CollectionSnapshot {
        &self.snapshot
    }

    /// Token that cancels this job when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Run the merge to completion, consuming the job.
    ///
    /// # Errors
    ///
    /// See [`Merger::merge`].
    pub async fn run(self) -> Result<MergeOutput> {
        self.merger
            .merge(&self.snapshot, &self.cancel, &self.progress)
            .await
    }
}
