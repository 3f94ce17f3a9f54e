//! Callback trait for progress reporting during a sync run

use std::time::Duration;

use crate::retry::FailureClass;
use crate::strategies::SyncStrategy;

/// Event emitted while a sync run progresses
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
	/// Selector picked the path to run
	StrategyChosen { strategy: SyncStrategy },

	/// Full sync entered one of its fixed steps (1-based)
	StepStarted { step: usize, total: usize, label: &'static str },

	/// Periodic scanner update
	ScanProgress { files: usize, large: usize },

	/// Scanner finished
	ScanComplete { files: usize, large: usize },

	/// Number of entries in the index after staging
	Staged { count: usize },

	/// A push attempt is about to start (1-based)
	PushAttempt { attempt: usize, total: usize, timeout: Duration },

	/// First meaningful line of a failed push
	PushError { line: String },

	/// Recovery action chosen for a classified failure
	Recovering { class: FailureClass, detail: String },
}

/// Callback for progress updates
pub trait SyncProgressCallback: Send + Sync {
	fn on_event(&self, event: SyncEvent);
}

/// Progress callback that discards every event
pub struct NoProgress;

impl SyncProgressCallback for NoProgress {
	fn on_event(&self, _event: SyncEvent) {}
}

// vim: ts=4
