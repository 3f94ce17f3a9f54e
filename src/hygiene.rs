//! Repository metadata hygiene
//!
//! Lock clearing, the directories-only nested metadata zapper used on the
//! incremental path, and forced destruction of a metadata directory.
//! Everything here is best-effort: errors are logged, never returned.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::*;

/// Name of the repository metadata directory
pub const METADATA_DIR: &str = ".git";

/// Default upper bound on nested metadata removals per run
pub const DEFAULT_ZAP_CAP: usize = 100;

/// Result of [`zap_nested_metadata`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZapReport {
	/// Parent directories (relative to the root) whose metadata was removed
	pub removed: Vec<PathBuf>,
	/// The removal cap was reached and the walk stopped early
	pub capped: bool,
}

/// Remaining number of removals the zapper may perform
#[derive(Debug)]
struct ZapBudget {
	remaining: usize,
}

impl ZapBudget {
	fn new(cap: usize) -> Self {
		ZapBudget { remaining: cap }
	}

	fn exhausted(&self) -> bool {
		self.remaining == 0
	}

	fn consume(&mut self) {
		self.remaining = self.remaining.saturating_sub(1);
	}
}

/// Timeout for the shell's forced removal of one nested metadata directory
#[cfg(windows)]
const FORCED_REMOVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Remove metadata directories nested anywhere below `root`
///
/// Only directory entries are inspected, file contents are never stat'ed.
/// Stops after `cap` removals.
pub async fn zap_nested_metadata(root: &Path, cap: usize) -> ZapReport {
	let mut budget = ZapBudget::new(cap);
	let mut found = Vec::new();
	find_nested(root, 0, &mut budget, &mut found);

	let mut removed = Vec::with_capacity(found.len());
	for git_dir in found {
		debug!("Removing nested metadata {}", git_dir.display());
		remove_dir_best_effort(&git_dir).await;
		let parent = git_dir.parent().unwrap_or(root);
		removed.push(parent.strip_prefix(root).unwrap_or(parent).to_path_buf());
	}

	let capped = budget.exhausted();
	if capped {
		warn!("Stopped at {} nested {} directories (too many)", cap, METADATA_DIR);
	}
	ZapReport { removed, capped }
}

fn find_nested(dir: &Path, depth: usize, budget: &mut ZapBudget, found: &mut Vec<PathBuf>) {
	if budget.exhausted() {
		return;
	}
	let entries = match fs::read_dir(dir) {
		Ok(e) => e,
		Err(e) => {
			debug!("Cannot read {}: {}", dir.display(), e);
			return;
		}
	};

	for entry in entries.flatten() {
		if budget.exhausted() {
			return;
		}
		// file_type() does not follow symlinks
		let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
		if !is_dir {
			continue;
		}

		let path = entry.path();
		if entry.file_name() == METADATA_DIR {
			if depth > 0 {
				found.push(path);
				budget.consume();
			}
		} else {
			find_nested(&path, depth + 1, budget, found);
		}
	}
}

async fn remove_dir_best_effort(path: &Path) {
	if let Err(e) = fs::remove_dir_all(path) {
		debug!("Cannot remove {}: {}", path.display(), e);
	}
	#[cfg(windows)]
	{
		if path.exists() {
			let target = path.to_string_lossy().into_owned();
			let out = crate::process::run(
				"cmd",
				&["/C", "rd", "/s", "/q", &target],
				None,
				FORCED_REMOVE_TIMEOUT,
			)
			.await;
			if !out.success {
				debug!("rd {} failed: {}", target, out.stderr.trim());
			}
		}
	}
}

/// Delete stale `*.lock` files left in the metadata directory of `root`
///
/// Returns the number of files removed.
pub fn remove_locks(root: &Path) -> usize {
	fn sweep(dir: &Path, count: &mut usize) {
		let entries = match fs::read_dir(dir) {
			Ok(e) => e,
			Err(_) => return,
		};
		for entry in entries.flatten() {
			let path = entry.path();
			let file_type = match entry.file_type() {
				Ok(t) => t,
				Err(_) => continue,
			};
			if file_type.is_dir() {
				sweep(&path, count);
			} else if entry.file_name().to_string_lossy().ends_with(".lock") {
				match fs::remove_file(&path) {
					Ok(()) => {
						debug!("Removed stale lock {}", path.display());
						*count += 1;
					}
					Err(e) => debug!("Cannot remove lock {}: {}", path.display(), e),
				}
			}
		}
	}

	let mut count = 0;
	let git_dir = root.join(METADATA_DIR);
	if git_dir.is_dir() {
		sweep(&git_dir, &mut count);
	}
	count
}

/// Forcibly destroy a metadata directory
///
/// Tries a plain recursive delete, then (on Windows) the shell's forced
/// removal, then clears read-only bits file by file before a last delete.
pub async fn destroy_metadata(git_dir: &Path) {
	if !git_dir.exists() {
		return;
	}
	let _ = fs::remove_dir_all(git_dir);
	if !git_dir.exists() {
		return;
	}

	#[cfg(windows)]
	{
		let target = git_dir.to_string_lossy().into_owned();
		crate::process::run("cmd", &["/C", "rd", "/s", "/q", &target], None, Duration::from_secs(30))
			.await;
		tokio::time::sleep(Duration::from_millis(300)).await;
		if !git_dir.exists() {
			return;
		}
	}

	warn!("Forcing removal of {}", git_dir.display());
	force_writable_sweep(git_dir);
	if let Err(e) = fs::remove_dir_all(git_dir) {
		warn!("Could not fully remove {}: {}", git_dir.display(), e);
	}
	// Give slow filesystems a moment before reinitializing
	if git_dir.exists() {
		tokio::time::sleep(Duration::from_millis(300)).await;
	}
}

fn force_writable_sweep(dir: &Path) {
	let entries = match fs::read_dir(dir) {
		Ok(e) => e,
		Err(_) => return,
	};
	for entry in entries.flatten() {
		let path = entry.path();
		let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
		if let Ok(meta) = fs::metadata(&path) {
			let mut perms = meta.permissions();
			perms.set_readonly(false);
			let _ = fs::set_permissions(&path, perms);
		}
		if is_dir {
			force_writable_sweep(&path);
		} else {
			let _ = fs::remove_file(&path);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn nested_repo(root: &Path, rel: &str) {
		let git = root.join(rel).join(METADATA_DIR);
		fs::create_dir_all(git.join("objects")).unwrap();
		fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();
		fs::write(root.join(rel).join("file.txt"), "content").unwrap();
	}

	#[tokio::test]
	async fn test_zap_removes_nested_only() {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		fs::create_dir_all(root.join(METADATA_DIR)).unwrap();
		nested_repo(root, "a");
		nested_repo(root, "deep/b/c");

		let mut report = zap_nested_metadata(root, DEFAULT_ZAP_CAP).await;
		report.removed.sort();

		assert_eq!(report.removed, vec![PathBuf::from("a"), PathBuf::from("deep/b/c")]);
		assert!(!report.capped);
		assert!(root.join(METADATA_DIR).exists());
		assert!(!root.join("a").join(METADATA_DIR).exists());
		assert!(!root.join("deep/b/c").join(METADATA_DIR).exists());
		assert!(root.join("deep/b/c/file.txt").exists());
	}

	#[tokio::test]
	async fn test_zap_respects_cap() {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		for i in 0..5 {
			nested_repo(root, &format!("vendor/dep{}", i));
		}

		let report = zap_nested_metadata(root, 3).await;

		assert_eq!(report.removed.len(), 3);
		assert!(report.capped);
		let remaining = (0..5)
			.filter(|i| root.join(format!("vendor/dep{}", i)).join(METADATA_DIR).exists())
			.count();
		assert_eq!(remaining, 2);
	}

	#[tokio::test]
	async fn test_zap_ignores_metadata_files() {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		fs::create_dir(root.join("worktree")).unwrap();
		fs::write(root.join("worktree").join(METADATA_DIR), "gitdir: ../elsewhere\n").unwrap();

		let report = zap_nested_metadata(root, DEFAULT_ZAP_CAP).await;

		assert!(report.removed.is_empty());
		assert!(root.join("worktree").join(METADATA_DIR).exists());
	}

	#[test]
	fn test_remove_locks() {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		let git = root.join(METADATA_DIR);
		fs::create_dir_all(git.join("refs/heads")).unwrap();
		fs::write(git.join("index.lock"), "").unwrap();
		fs::write(git.join("refs/heads/main.lock"), "").unwrap();
		fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();
		fs::write(root.join("outside.lock"), "").unwrap();

		assert_eq!(remove_locks(root), 2);
		assert!(!git.join("index.lock").exists());
		assert!(git.join("HEAD").exists());
		assert!(root.join("outside.lock").exists());
	}

	#[test]
	fn test_remove_locks_without_metadata() {
		let dir = TempDir::new().unwrap();
		assert_eq!(remove_locks(dir.path()), 0);
	}

	#[tokio::test]
	async fn test_destroy_metadata() {
		let dir = TempDir::new().unwrap();
		let git = dir.path().join(METADATA_DIR);
		fs::create_dir_all(git.join("objects/ab")).unwrap();
		let object = git.join("objects/ab/cdef");
		fs::write(&object, "blob").unwrap();
		let mut perms = fs::metadata(&object).unwrap().permissions();
		perms.set_readonly(true);
		fs::set_permissions(&object, perms).unwrap();

		destroy_metadata(&git).await;

		assert!(!git.exists());
	}

	#[tokio::test]
	async fn test_destroy_missing_metadata_is_noop() {
		let dir = TempDir::new().unwrap();
		destroy_metadata(&dir.path().join(METADATA_DIR)).await;
		assert!(dir.path().exists());
	}
}

// vim: ts=4
