//! Fast path: reuse a valid repository, always commit, push

use std::fs;
use std::time::Duration;

use super::{commit_message, SyncContext, SyncOutcome, SyncReport};
use crate::callbacks::SyncEvent;
use crate::hygiene;
use crate::lfs;
use crate::logging::*;
use crate::retry::{push_with_retry, PushTarget, RetryPolicy};
use crate::strategies::SyncStrategy;

const STAGE_TIMEOUT: Duration = Duration::from_secs(600);
const LFS_PUSH_TIMEOUT: Duration = Duration::from_secs(900);
const SUBMODULES_FILE: &str = ".gitmodules";

/// Returns `None` when the caller should fall back to a full sync
pub(super) async fn run(ctx: &SyncContext<'_>) -> Option<SyncReport> {
	let repo = &ctx.repo;
	let root = repo.root();

	let locks = hygiene::remove_locks(root);
	if locks > 0 {
		debug!("Removed {} stale lock files", locks);
	}

	let zap = hygiene::zap_nested_metadata(root, ctx.config.nested_zap_cap).await;
	let zapped = !zap.removed.is_empty();
	if zapped {
		info!("Removed {} nested repositories", zap.removed.len());
		for rel in &zap.removed {
			repo.untrack(rel).await;
		}
		let submodules = root.join(SUBMODULES_FILE);
		if submodules.exists() {
			if let Err(e) = fs::remove_file(&submodules) {
				debug!("Cannot remove {}: {}", submodules.display(), e);
			}
		}
	}

	let has_changes = !repo.is_worktree_clean().await || repo.has_untracked().await || zapped;
	if has_changes {
		let out = repo.stage_all(STAGE_TIMEOUT).await;
		if !out.success {
			warn!("Staging failed: {}", out.diagnostic().unwrap_or_default());
		}
	}

	let out = repo.commit(&commit_message(), true, STAGE_TIMEOUT).await;
	if !out.success {
		warn!("Commit failed: {}", out.diagnostic().unwrap_or_default());
		return None;
	}

	ctx.remote.ensure_exists(&ctx.identity).await;

	let outcome = if has_changes { SyncOutcome::Pushed } else { SyncOutcome::Synced };

	let out = repo.push(ctx.config.quick_push_timeout()).await;
	if out.success {
		if has_changes && lfs::tracks_large_files(root) {
			let lfs = repo.lfs_push(LFS_PUSH_TIMEOUT).await;
			if !lfs.success {
				debug!("Large-file push failed: {}", lfs.stderr.trim());
			}
		}
		return Some(ctx.report(SyncStrategy::Incremental, outcome, None, 1));
	}

	if let Some(line) = out.diagnostic() {
		ctx.progress.on_event(SyncEvent::PushError { line });
	}
	info!("Quick push failed, retrying");

	let policy = RetryPolicy::new(ctx.config.retry_base_timeout(), ctx.config.incremental_attempts);
	let report = push_with_retry(repo, ctx.remote, &ctx.identity, &policy, ctx.progress).await;
	if report.succeeded() {
		// A push that needed the retry loop always counts as a real push
		let attempts = 1 + report.attempt_count();
		Some(ctx.report(SyncStrategy::Incremental, SyncOutcome::Pushed, None, attempts))
	} else {
		None
	}
}

// vim: ts=4
