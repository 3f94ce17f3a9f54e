//! Push retry state machine
//!
//! A push is attempted up to `attempts` times with a timeout that grows by
//! ten minutes per attempt. After each failure the error text is sorted
//! into a [`FailureClass`] by [`classify`] and the matching recovery runs
//! before the next attempt. Only [`FailureClass::NothingToPush`] aborts
//! early; everything else is retried until the budget is spent.
//!
//! Classification priority (first match wins, on lower-cased stderr):
//!
//! 1. `src refspec` / `does not match any` - nothing to push, abort
//! 2. `push protection` / `cannot contain secrets` / `rule violations` -
//!    bypass each embedded secret id, or recreate the remote
//! 3. `repository not found` - ensure the remote exists
//! 4. `large file` / `lfs` / `this exceeds` - push large-file objects, wait 2s
//! 5. (`failed to push` or `error`) and (`lfs` or `s3`) - raise transfer
//!    limits, wait 5s
//! 6. `rate limit` / `secondary` / `abuse` - wait 60s x attempt
//! 7. `timeout` / `timed out` - wait 10s
//! 8. anything else - wait 5s x attempt

use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use crate::callbacks::{SyncEvent, SyncProgressCallback};
use crate::identity::RemoteIdentity;
use crate::logging::*;
use crate::process::CommandOutput;
use crate::remote::RemoteManager;

/// Extra timeout granted per attempt
pub const TIMEOUT_STEP: Duration = Duration::from_secs(600);

const LARGE_FILE_SETTLE: Duration = Duration::from_secs(2);
const BACKEND_SETTLE: Duration = Duration::from_secs(5);
const TIMEOUT_BACKOFF: Duration = Duration::from_secs(10);

/// Known ways a push can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
	/// No commits or no branch to push; retrying cannot help
	NothingToPush,
	/// Secret scanning rejected the push
	PushProtection,
	/// Remote repository does not exist
	RemoteMissing,
	/// An object exceeded the host's size limit
	OversizedObject,
	/// Large-file storage backend failed
	LargeFileBackend,
	/// Throttled by the host
	RateLimited,
	/// Transient network timeout
	TimedOut,
}

impl FailureClass {
	pub fn is_retriable(self) -> bool {
		self != FailureClass::NothingToPush
	}
}

impl fmt::Display for FailureClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::NothingToPush => "nothing to push",
			Self::PushProtection => "push protection",
			Self::RemoteMissing => "remote missing",
			Self::OversizedObject => "oversized object",
			Self::LargeFileBackend => "large-file backend",
			Self::RateLimited => "rate limited",
			Self::TimedOut => "timed out",
		};
		write!(f, "{}", name)
	}
}

/// Sort push error text into a [`FailureClass`]
///
/// Returns `None` for unclassified failures.
pub fn classify(error_text: &str) -> Option<FailureClass> {
	let el = error_text.to_lowercase();
	let has = |needle: &str| el.contains(needle);

	if has("src refspec") || has("does not match any") {
		Some(FailureClass::NothingToPush)
	} else if has("push protection") || has("cannot contain secrets") || has("rule violations") {
		Some(FailureClass::PushProtection)
	} else if has("repository not found") {
		Some(FailureClass::RemoteMissing)
	} else if has("large file") || has("lfs") || has("this exceeds") {
		Some(FailureClass::OversizedObject)
	} else if (has("failed to push") || has("error")) && (has("lfs") || has("s3")) {
		Some(FailureClass::LargeFileBackend)
	} else if has("rate limit") || has("secondary") || has("abuse") {
		Some(FailureClass::RateLimited)
	} else if has("timeout") || has("timed out") {
		Some(FailureClass::TimedOut)
	} else {
		None
	}
}

fn bypass_id_pattern() -> Option<&'static Regex> {
	static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
	PATTERN.get_or_init(|| Regex::new(r"unblock-secret/([A-Za-z0-9]+)").ok()).as_ref()
}

/// Secret-scanning placeholder ids embedded in unblock URLs, deduplicated
pub fn bypass_ids(error_text: &str) -> Vec<String> {
	let mut ids: Vec<String> = Vec::new();
	let pattern = match bypass_id_pattern() {
		Some(pattern) => pattern,
		None => return ids,
	};
	for cap in pattern.captures_iter(error_text) {
		let id = &cap[1];
		if !ids.iter().any(|known| known == id) {
			ids.push(id.to_string());
		}
	}
	ids
}

/// Outcome of one push attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
	Success,
	Classified(FailureClass),
	Unclassified,
}

/// One iteration of the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAttempt {
	/// 0-based attempt index
	pub index: usize,
	pub timeout: Duration,
	pub outcome: AttemptOutcome,
}

/// Attempt budget and timeout schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub base_timeout: Duration,
	pub attempts: usize,
}

impl RetryPolicy {
	pub fn new(base_timeout: Duration, attempts: usize) -> Self {
		RetryPolicy { base_timeout, attempts }
	}

	/// `base_timeout + attempt * 600s`
	pub fn timeout_for(&self, attempt: usize) -> Duration {
		self.base_timeout.saturating_add(TIMEOUT_STEP.saturating_mul(attempt as u32))
	}
}

/// Every attempt made by [`push_with_retry`], in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryReport {
	pub attempts: Vec<SyncAttempt>,
}

impl RetryReport {
	pub fn succeeded(&self) -> bool {
		matches!(self.attempts.last(), Some(a) if a.outcome == AttemptOutcome::Success)
	}

	pub fn attempt_count(&self) -> usize {
		self.attempts.len()
	}
}

/// Something that can be force-pushed
#[async_trait]
pub trait PushTarget: Send + Sync {
	/// Force-push the branch
	async fn push(&self, timeout: Duration) -> CommandOutput;

	/// Push all large-file side-channel objects
	async fn push_large_files(&self, timeout: Duration) -> CommandOutput;

	/// Raise HTTP buffer and side-channel retry/verify limits
	async fn raise_transfer_limits(&self);
}

/// Force-push `target`, recovering from classified failures between attempts
pub async fn push_with_retry(
	target: &dyn PushTarget,
	remote: &dyn RemoteManager,
	identity: &RemoteIdentity,
	policy: &RetryPolicy,
	progress: &dyn SyncProgressCallback,
) -> RetryReport {
	let mut report = RetryReport::default();

	for attempt in 0..policy.attempts {
		let timeout = policy.timeout_for(attempt);
		progress.on_event(SyncEvent::PushAttempt {
			attempt: attempt + 1,
			total: policy.attempts,
			timeout,
		});

		let output = target.push(timeout).await;
		if output.success {
			report.attempts.push(SyncAttempt { index: attempt, timeout, outcome: AttemptOutcome::Success });
			return report;
		}

		if let Some(line) = output.diagnostic() {
			progress.on_event(SyncEvent::PushError { line });
		}

		let class = classify(&output.stderr);
		let outcome = match class {
			Some(c) => AttemptOutcome::Classified(c),
			None => AttemptOutcome::Unclassified,
		};
		report.attempts.push(SyncAttempt { index: attempt, timeout, outcome });

		if let Some(c) = class.filter(|c| !c.is_retriable()) {
			warn!("Push to {} cannot succeed: {}", identity.slug(), c);
			return report;
		}

		if attempt + 1 == policy.attempts {
			break;
		}

		match class {
			Some(class) => {
				warn!("Push attempt {} failed: {}", attempt + 1, class);
				recover(class, &output, attempt, timeout, target, remote, identity, progress).await;
			}
			None => {
				warn!("Push attempt {} failed", attempt + 1);
				tokio::time::sleep(Duration::from_secs(5 * (attempt as u64 + 1))).await;
			}
		}
	}

	report
}

#[allow(clippy::too_many_arguments)]
async fn recover(
	class: FailureClass,
	output: &CommandOutput,
	attempt: usize,
	timeout: Duration,
	target: &dyn PushTarget,
	remote: &dyn RemoteManager,
	identity: &RemoteIdentity,
	progress: &dyn SyncProgressCallback,
) {
	let notify = |detail: String| progress.on_event(SyncEvent::Recovering { class, detail });

	match class {
		FailureClass::NothingToPush => {}
		FailureClass::PushProtection => {
			let ids = bypass_ids(&output.stderr);
			if ids.is_empty() {
				notify("recreating repo".to_string());
				remote.recreate(identity).await;
			} else {
				notify(format!("bypassing {} secret blocks", ids.len()));
				for id in &ids {
					if !remote.bypass_push_protection(identity, id).await {
						debug!("Bypass of secret {} failed", id);
					}
				}
			}
		}
		FailureClass::RemoteMissing => {
			notify("ensuring remote exists".to_string());
			remote.ensure_exists(identity).await;
		}
		FailureClass::OversizedObject => {
			notify("pushing large-file objects".to_string());
			let out = target.push_large_files(timeout * 2).await;
			if !out.success {
				debug!("Large-file push failed: {}", out.stderr.trim());
			}
			tokio::time::sleep(LARGE_FILE_SETTLE).await;
		}
		FailureClass::LargeFileBackend => {
			notify("large-file backend error, retrying with larger buffer".to_string());
			target.raise_transfer_limits().await;
			tokio::time::sleep(BACKEND_SETTLE).await;
		}
		FailureClass::RateLimited => {
			let wait = Duration::from_secs(60 * (attempt as u64 + 1));
			notify(format!("rate limited, waiting {}s", wait.as_secs()));
			tokio::time::sleep(wait).await;
		}
		FailureClass::TimedOut => {
			tokio::time::sleep(TIMEOUT_BACKOFF).await;
		}
	}
}


// vim: ts=4
