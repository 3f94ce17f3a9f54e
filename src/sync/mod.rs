//! Sync strategy selection and the public entry point
//!
//! ```rust,ignore
//! use pushr::sync::SyncBuilder;
//!
//! let report = SyncBuilder::new("./notes").sync().await?;
//! println!("{} {}", report.outcome, report.web_url);
//! ```

mod full;
mod incremental;

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::callbacks::{NoProgress, SyncEvent, SyncProgressCallback};
use crate::config::Config;
use crate::error::SyncError;
use crate::git::GitRepo;
use crate::identity::RemoteIdentity;
use crate::logging::*;
use crate::remote::{GhCli, RemoteManager};
use crate::repo_state;
use crate::scan;
use crate::strategies::{StrategyMode, SyncStrategy};

/// Result label shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
	/// Incremental sync pushed real changes
	Pushed,
	/// Incremental sync had nothing to change
	Synced,
	/// Full sync completed
	Success,
}

impl fmt::Display for SyncOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncOutcome::Pushed => write!(f, "PUSHED"),
			SyncOutcome::Synced => write!(f, "SYNCED"),
			SyncOutcome::Success => write!(f, "SUCCESS"),
		}
	}
}

/// Summary of a completed sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
	pub strategy: SyncStrategy,
	pub outcome: SyncOutcome,
	/// Staged file count; only known on the full path
	pub staged: Option<usize>,
	pub elapsed: Duration,
	pub web_url: String,
	/// Push attempts made, including the quick push on the incremental path
	pub push_attempts: usize,
}

/// Everything an engine needs for one run
pub(crate) struct SyncContext<'a> {
	pub repo: GitRepo,
	pub identity: RemoteIdentity,
	pub config: &'a Config,
	pub remote: &'a dyn RemoteManager,
	pub progress: &'a dyn SyncProgressCallback,
	pub started: Instant,
}

impl SyncContext<'_> {
	pub fn report(
		&self,
		strategy: SyncStrategy,
		outcome: SyncOutcome,
		staged: Option<usize>,
		push_attempts: usize,
	) -> SyncReport {
		SyncReport {
			strategy,
			outcome,
			staged,
			elapsed: self.started.elapsed(),
			web_url: self.identity.web_url(),
			push_attempts,
		}
	}
}

/// Builder for a sync run
pub struct SyncBuilder {
	folder: PathBuf,
	config: Config,
	remote: Option<Box<dyn RemoteManager>>,
	progress: Option<Arc<dyn SyncProgressCallback>>,
}

impl SyncBuilder {
	pub fn new(folder: impl Into<PathBuf>) -> Self {
		SyncBuilder { folder: folder.into(), config: Config::default(), remote: None, progress: None }
	}

	pub fn config(mut self, config: Config) -> Self {
		self.config = config;
		self
	}

	/// Use `remote` instead of the `gh` CLI
	pub fn remote(mut self, remote: Box<dyn RemoteManager>) -> Self {
		self.remote = Some(remote);
		self
	}

	pub fn progress(mut self, progress: Arc<dyn SyncProgressCallback>) -> Self {
		self.progress = Some(progress);
		self
	}

	/// Run the sync
	pub async fn sync(self) -> Result<SyncReport, SyncError> {
		self.config.validate()?;
		let remote = self.remote.unwrap_or_else(|| Box::new(GhCli::default()));
		let progress = self.progress.unwrap_or_else(|| Arc::new(NoProgress));
		run(&self.folder, &self.config, remote.as_ref(), progress.as_ref()).await
	}
}

async fn run(
	folder: &std::path::Path,
	config: &Config,
	remote: &dyn RemoteManager,
	progress: &dyn SyncProgressCallback,
) -> Result<SyncReport, SyncError> {
	let started = Instant::now();
	let display = folder.display().to_string();
	if !folder.exists() {
		return Err(SyncError::FolderMissing { path: display });
	}
	if !folder.is_dir() {
		return Err(SyncError::NotADirectory { path: display });
	}
	let root = fs::canonicalize(folder)?;

	let identity = RemoteIdentity::for_folder(&root, &config.owner, &config.remote_base);
	info!("Syncing {} -> {}", root.display(), identity.slug());

	let ctx = SyncContext {
		repo: GitRepo::new(&root, config.branch.as_str()),
		identity,
		config,
		remote,
		progress,
		started,
	};

	if config.strategy == StrategyMode::Auto && repo_state::has_valid_repo(&ctx.repo, &ctx.identity).await
	{
		progress.on_event(SyncEvent::StrategyChosen { strategy: SyncStrategy::Incremental });
		match incremental::run(&ctx).await {
			Some(report) => return Ok(report),
			None => warn!("Incremental sync failed, falling back to full sync"),
		}
	}

	progress.on_event(SyncEvent::StrategyChosen { strategy: SyncStrategy::Full });
	let scan = scan::scan_and_clean(&root, config.large_file_threshold, progress);
	if scan.total_files == 0 {
		return Err(SyncError::NoFiles { path: display });
	}
	full::run(&ctx, &scan).await
}

/// `Auto commit YYYY-MM-DD HH:MM:SS`
pub(crate) fn commit_message() -> String {
	format!("Auto commit {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_outcome_labels() {
		assert_eq!(SyncOutcome::Pushed.to_string(), "PUSHED");
		assert_eq!(SyncOutcome::Synced.to_string(), "SYNCED");
		assert_eq!(SyncOutcome::Success.to_string(), "SUCCESS");
	}

	#[test]
	fn test_commit_message_format() {
		let message = commit_message();
		let stamp = message.trim_start_matches("Auto commit ");
		assert_eq!(stamp.len(), "2024-01-31 12:00:00".len());
		assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());
	}
}

// vim: ts=4
