//! Slow path: rebuild the repository from scratch in seven steps

use super::{commit_message, SyncContext, SyncOutcome, SyncReport};
use crate::callbacks::SyncEvent;
use crate::error::SyncError;
use crate::hygiene;
use crate::lfs;
use crate::logging::*;
use crate::retry::{push_with_retry, RetryPolicy};
use crate::scan::{ScanReport, REMOTE_FILE_LIMIT};
use crate::strategies::SyncStrategy;
use crate::util::{scaled_timeout, truncate_chars};

const TOTAL_STEPS: usize = 7;
const INIT_ERROR_CHARS: usize = 200;

const STEP_LABELS: [&str; TOTAL_STEPS] = [
	"Initializing repository",
	"Configuring large files",
	"Staging files",
	"Committing",
	"Setting up remote",
	"Pushing",
	"Done",
];

fn step(ctx: &SyncContext<'_>, n: usize) {
	ctx.progress.on_event(SyncEvent::StepStarted {
		step: n,
		total: TOTAL_STEPS,
		label: STEP_LABELS[n - 1],
	});
}

pub(super) async fn run(ctx: &SyncContext<'_>, scan: &ScanReport) -> Result<SyncReport, SyncError> {
	let repo = &ctx.repo;
	let files = scan.total_files;

	// 1. Initialize
	step(ctx, 1);
	hygiene::destroy_metadata(&repo.metadata_dir()).await;
	let out = repo.init().await;
	if !out.success {
		return Err(SyncError::InitFailed {
			message: truncate_chars(out.stderr.trim(), INIT_ERROR_CHARS).to_string(),
		});
	}
	repo.configure_identity(&ctx.config.owner).await;
	if let Err(e) = repo.write_speed_config() {
		warn!("Cannot write repository settings: {}", e);
	}
	if ctx.config.mark_safe_directory {
		repo.mark_safe_directory().await;
	}

	// 2. Large files
	step(ctx, 2);
	let rules = lfs::setup_large_files(repo, &scan.large_files).await;
	if rules.is_empty() {
		let oversized = scan.large_files.iter().filter(|f| f.size > REMOTE_FILE_LIMIT).count();
		if oversized > 0 {
			warn!(
				"{} files exceed the {} MiB remote limit and will be rejected",
				oversized,
				REMOTE_FILE_LIMIT >> 20
			);
		}
	}

	// 3. Stage
	step(ctx, 3);
	hygiene::remove_locks(repo.root());
	let stage_timeout = scaled_timeout(files, 50, 600, 3600);
	let out = repo.stage_all(stage_timeout).await;
	if !out.success {
		warn!("Staging reported an error: {}", out.diagnostic().unwrap_or_default());
	}
	let staged = repo.count_staged(stage_timeout).await;
	ctx.progress.on_event(SyncEvent::Staged { count: staged });
	if staged == 0 {
		hygiene::destroy_metadata(&repo.metadata_dir()).await;
		return Err(SyncError::NothingStaged);
	}

	// 4. Commit
	step(ctx, 4);
	let message = format!("{} - {} files", commit_message(), staged);
	let out = repo.commit(&message, false, stage_timeout).await;
	if !out.success {
		hygiene::destroy_metadata(&repo.metadata_dir()).await;
		return Err(SyncError::CommitFailed {
			message: out.diagnostic().unwrap_or_else(|| "unknown error".to_string()),
		});
	}

	// 5. Remote
	step(ctx, 5);
	let out = repo.add_remote(&ctx.identity.remote_url()).await;
	if !out.success {
		debug!("remote add failed: {}", out.stderr.trim());
	}
	repo.rename_branch().await;
	ctx.remote.ensure_exists(&ctx.identity).await;

	// 6. Push
	step(ctx, 6);
	let push_timeout = scaled_timeout(files, 20, 1800, 7200);
	let policy = RetryPolicy::new(push_timeout, ctx.config.full_attempts);
	let report = push_with_retry(repo, ctx.remote, &ctx.identity, &policy, ctx.progress).await;
	if !report.succeeded() {
		return Err(SyncError::PushFailed { repo: ctx.identity.slug() });
	}
	if !rules.is_empty() {
		let out = repo.lfs_push(push_timeout).await;
		if !out.success {
			warn!("Large-file push failed: {}", out.diagnostic().unwrap_or_default());
		}
	}

	// 7. Done
	step(ctx, 7);
	let report = ctx.report(SyncStrategy::Full, SyncOutcome::Success, Some(staged), report.attempt_count());
	info!("{} files pushed in {:.1}s", staged, report.elapsed.as_secs_f64());
	Ok(report)
}

// vim: ts=4
