//! Merging a page collection into one PDF.
//!
//! This module contains:
//! - [`Merger`]: the merge algorithm
//! - [`MergeJob`]: a merge bound to a collection snapshot
//! - [`MergeProgress`] and [`ProgressTracker`]: observable merge status
//! - Page tree assembly, the per-merge parse cache and Info dictionary handling

pub mod cache;
pub mod job;
pub mod merger;
pub mod metadata;
pub mod pages;
pub mod progress;

pub use job::MergeJob;
pub use merger::{MergeOutput, MergeStatistics, Merger};
pub use progress::{MergeProgress, ProgressTracker};
