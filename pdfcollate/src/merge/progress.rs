//! Merge progress reporting.
//!
//! [`MergeProgress`] is a small state machine: a merge moves from `Idle`
//! through `Loading` and `Processing` to `Complete` or `Error`, and anything
//! may be reset to `Idle`. [`ProgressTracker`] publishes the current state on
//! a `tokio::sync::watch` channel so a front end can follow along.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Share of the percent range spent parsing and copying pages.
pub const COPY_PERCENT_CEILING: u8 = 90;

/// Percent reported while the output is serialized.
pub const SERIALIZE_PERCENT: u8 = 95;

/// Observable status of a merge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MergeProgress {
    /// Nothing is running.
    #[default]
    Idle,
    /// The merge is preparing its inputs.
    Loading {
        /// What is happening.
        message: String,
        /// Completion, 0 to 100.
        percent: u8,
    },
    /// Pages are being copied or the output is being written.
    Processing {
        /// What is happening.
        message: String,
        /// Completion, 0 to 100.
        percent: u8,
    },
    /// The merge finished.
    Complete {
        /// Summary.
        message: String,
    },
    /// The merge failed.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl MergeProgress {
    /// Build a `Loading` state, clamping `percent` to 100.
    pub fn loading(message: impl Into<String>, percent: u8) -> Self {
        Self::Loading {
            message: message.into(),
            percent: percent.min(100),
        }
    }

    /// Build a `Processing` state, clamping `percent` to 100.
    pub fn processing(message: impl Into<String>, percent: u8) -> Self {
        Self::Processing {
            message: message.into(),
            percent: percent.min(100),
        }
    }

    /// Build a `Complete` state.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::Complete {
            message: message.into(),
        }
    }

    /// Build an `Error` state.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Check whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: &MergeProgress) -> bool {
        use MergeProgress::*;

        match (self, next) {
            (_, Idle) => true,
            (Idle | Complete { .. } | Error { .. }, Loading { .. } | Processing { .. }) => true,
            (Loading { .. }, Loading { .. } | Processing { .. }) => true,
            (Processing { .. }, Processing { .. }) => true,
            (Loading { .. } | Processing { .. }, Complete { .. } | Error { .. }) => true,
            _ => false,
        }
    }

    /// Percent complete, when the state carries one.
    pub fn percent(&self) -> Option<u8> {
        match self {
            Self::Loading { percent, .. } | Self::Processing { percent, .. } => Some(*percent),
            Self::Complete { .. } => Some(100),
            Self::Idle | Self::Error { .. } => None,
        }
    }

    /// Message attached to the state.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Loading { message, .. }
            | Self::Processing { message, .. }
            | Self::Complete { message }
            | Self::Error { message } => Some(message),
        }
    }

    /// Check whether a merge is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Loading { .. } | Self::Processing { .. })
    }

    /// Check whether a merge has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

impl fmt::Display for MergeProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading { message, percent } => write!(f, "loading ({percent}%): {message}"),
            Self::Processing { message, percent } => {
                write!(f, "processing ({percent}%): {message}")
            }
            Self::Complete { message } => write!(f, "complete: {message}"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// Map `done` out of `total` steps onto `0..=COPY_PERCENT_CEILING`.
pub fn scaled_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return COPY_PERCENT_CEILING;
    }
    let done = done.min(total) as u64;
    (done * u64::from(COPY_PERCENT_CEILING) / total as u64) as u8
}

/// Publisher of [`MergeProgress`] updates.
///
/// Clones share the same channel.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    sender: Arc<watch::Sender<MergeProgress>>,
}

impl ProgressTracker {
    /// Create a tracker starting at `Idle`.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(MergeProgress::Idle);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Move to `next` if the transition is valid.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    pub fn set(&self, next: MergeProgress) -> bool {
        let mut accepted = false;
        self.sender.send_if_modified(|current| {
            if !current.can_transition_to(&next) {
                tracing::warn!(from = %current, to = %next, "Rejected progress transition");
                return false;
            }
            accepted = true;
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        accepted
    }

    /// Return to `Idle`.
    pub fn reset(&self) {
        self.set(MergeProgress::Idle);
    }

    /// Current state.
    pub fn current(&self) -> MergeProgress {
        self.sender.borrow().clone()
    }

    /// Receiver observing every future update.
    pub fn subscribe(&self) -> watch::Receiver<MergeProgress> {
        self.sender.subscribe()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
