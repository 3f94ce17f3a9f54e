//! Thin typed wrapper over the `git` tool
//!
//! Every operation is scoped to an explicit worktree root; nothing here
//! depends on the process's current directory.

use async_trait::async_trait;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use crate::hygiene::METADATA_DIR;
use crate::logging::*;
use crate::process::{self, CommandOutput};
use crate::retry::PushTarget;

/// Timeout for quick commands (config edits, ref lookups)
pub const QUICK_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for commands without a more specific budget
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Performance settings appended to a fresh repository's config in one write
pub const SPEED_CONFIG_BLOCK: &str = "[core]
\tautocrlf = false
\tlongpaths = true
\tpreloadindex = true
\tfscache = true
\tuntrackedCache = true
\tfsmonitor = true
\tcompression = 1
\tbigFileThreshold = 1m
[http]
\tpostBuffer = 524288000
\tlowSpeedLimit = 1000
\tlowSpeedTime = 600
[pack]
\twindowMemory = 256m
\tpackSizeLimit = 512m
\tthreads = 0
";

/// Settings that make large-file transfers more forgiving
pub const TRANSFER_LIMITS: [(&str, &str); 3] = [
	("http.postBuffer", "1048576000"),
	("lfs.transfer.maxretries", "10"),
	("lfs.transfer.maxverifies", "10"),
];

fn shortstat_pattern() -> Option<&'static Regex> {
	static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
	PATTERN.get_or_init(|| Regex::new(r"(\d+) files? changed").ok()).as_ref()
}

/// Number of files in a `git diff --shortstat` summary
pub fn parse_shortstat(summary: &str) -> Option<usize> {
	shortstat_pattern()?.captures(summary).and_then(|cap| cap[1].parse().ok())
}

/// Local repository rooted at a worktree directory
#[derive(Debug, Clone)]
pub struct GitRepo {
	root: PathBuf,
	branch: String,
}

impl GitRepo {
	pub fn new(root: impl Into<PathBuf>, branch: impl Into<String>) -> Self {
		GitRepo { root: root.into(), branch: branch.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn metadata_dir(&self) -> PathBuf {
		self.root.join(METADATA_DIR)
	}

	/// Run `git <args>` inside the worktree
	pub async fn git(&self, args: &[&str], timeout: Duration) -> CommandOutput {
		process::run("git", args, Some(&self.root), timeout).await
	}

	async fn set_config(&self, key: &str, value: &str) {
		let out = self.git(&["config", key, value], QUICK_TIMEOUT).await;
		if !out.success {
			debug!("git config {} failed: {}", key, out.stderr.trim());
		}
	}

	/// Initialize a fresh repository on the configured branch
	pub async fn init(&self) -> CommandOutput {
		let root = self.root.to_string_lossy().into_owned();
		self.git(&["init", "-b", &self.branch, &root], DEFAULT_TIMEOUT).await
	}

	/// Set the committer identity for this repository
	pub async fn configure_identity(&self, owner: &str) {
		self.set_config("user.name", owner).await;
		self.set_config("user.email", &format!("{}@users.noreply.github.com", owner)).await;
	}

	/// Append [`SPEED_CONFIG_BLOCK`] unless it is already present
	pub fn write_speed_config(&self) -> io::Result<()> {
		let path = self.metadata_dir().join("config");
		let content = String::from_utf8_lossy(&fs::read(&path)?).into_owned();
		if content.contains("preloadindex") {
			return Ok(());
		}
		let mut file = OpenOptions::new().append(true).open(&path)?;
		file.write_all(SPEED_CONFIG_BLOCK.as_bytes())
	}

	/// Trust the worktree even when owned by another user
	pub async fn mark_safe_directory(&self) {
		let root = self.root.to_string_lossy().into_owned();
		let out = self
			.git(&["config", "--global", "--add", "safe.directory", &root], DEFAULT_TIMEOUT)
			.await;
		if !out.success {
			debug!("Cannot register safe.directory: {}", out.stderr.trim());
		}
	}

	/// Apply [`TRANSFER_LIMITS`]
	pub async fn raise_limits(&self) {
		for (key, value) in TRANSFER_LIMITS.iter() {
			self.set_config(key, value).await;
		}
	}

	pub async fn set_config_many(&self, settings: &[(&str, &str)]) {
		for (key, value) in settings {
			self.set_config(key, value).await;
		}
	}

	/// Stage everything, overriding ignore rules in subdirectories
	pub async fn stage_all(&self, timeout: Duration) -> CommandOutput {
		self.git(&["add", "-A", "--force"], timeout).await
	}

	/// Number of staged files; 0 if it cannot be determined
	pub async fn count_staged(&self, timeout: Duration) -> usize {
		let out = self.git(&["diff", "--cached", "--shortstat"], timeout).await;
		if out.success {
			if let Some(count) = parse_shortstat(&out.stdout) {
				return count;
			}
		}
		let out = self.git(&["diff", "--cached", "--name-only"], timeout).await;
		if out.success {
			return out.stdout.lines().filter(|l| !l.trim().is_empty()).count();
		}
		0
	}

	pub async fn commit(&self, message: &str, allow_empty: bool, timeout: Duration) -> CommandOutput {
		let mut args = vec!["commit", "-m", message];
		if allow_empty {
			args.insert(1, "--allow-empty");
		}
		self.git(&args, timeout).await
	}

	pub async fn add_remote(&self, url: &str) -> CommandOutput {
		self.git(&["remote", "add", "origin", url], DEFAULT_TIMEOUT).await
	}

	/// Rename the current branch to the configured one
	pub async fn rename_branch(&self) -> CommandOutput {
		self.git(&["branch", "-M", &self.branch], DEFAULT_TIMEOUT).await
	}

	/// HEAD resolves to a commit
	pub async fn head_resolves(&self) -> bool {
		self.git(&["rev-parse", "--verify", "HEAD"], QUICK_TIMEOUT).await.success
	}

	/// Tracked files match HEAD
	pub async fn is_worktree_clean(&self) -> bool {
		self.git(&["diff", "--quiet", "HEAD"], Duration::from_secs(120)).await.success
	}

	/// Untracked, non-ignored files exist
	pub async fn has_untracked(&self) -> bool {
		let out = self
			.git(
				&["ls-files", "--others", "--exclude-standard", "--directory", "-z"],
				Duration::from_secs(60),
			)
			.await;
		out.success && !out.stdout.trim().is_empty()
	}

	/// Drop `rel` from the index, keeping the files on disk
	pub async fn untrack(&self, rel: &Path) {
		let rel = rel.to_string_lossy().replace('\\', "/");
		let out = self.git(&["rm", "--cached", "-r", "-f", &rel], QUICK_TIMEOUT).await;
		if !out.success {
			debug!("Cannot untrack {}: {}", rel, out.stderr.trim());
		}
	}

	pub async fn lfs_install(&self) -> bool {
		self.git(&["lfs", "install", "--local"], DEFAULT_TIMEOUT).await.success
	}

	pub async fn lfs_track(&self, pattern: &str) -> bool {
		self.git(&["lfs", "track", pattern], DEFAULT_TIMEOUT).await.success
	}

	pub async fn lfs_push(&self, timeout: Duration) -> CommandOutput {
		self.git(&["lfs", "push", "--all", "origin", &self.branch], timeout).await
	}
}

#[async_trait]
impl PushTarget for GitRepo {
	async fn push(&self, timeout: Duration) -> CommandOutput {
		self.git(&["push", "origin", &self.branch, "--force"], timeout).await
	}

	async fn push_large_files(&self, timeout: Duration) -> CommandOutput {
		self.lfs_push(timeout).await
	}

	async fn raise_transfer_limits(&self) {
		self.raise_limits().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_parse_shortstat() {
		assert_eq!(parse_shortstat(" 1 file changed, 1 insertion(+)\n"), Some(1));
		assert_eq!(parse_shortstat(" 1234 files changed, 5 insertions(+), 2 deletions(-)"), Some(1234));
		assert_eq!(parse_shortstat(""), None);
		assert_eq!(parse_shortstat("nothing to see"), None);
	}

	#[test]
	fn test_speed_config_has_all_keys() {
		for key in [
			"autocrlf",
			"longpaths",
			"preloadindex",
			"fscache",
			"untrackedCache",
			"fsmonitor",
			"compression",
			"bigFileThreshold",
			"postBuffer",
			"lowSpeedLimit",
			"lowSpeedTime",
			"windowMemory",
			"packSizeLimit",
			"threads",
		]
		.iter()
		{
			assert!(SPEED_CONFIG_BLOCK.contains(&format!("\t{} = ", key)), "{}", key);
		}
	}

	#[test]
	fn test_write_speed_config_once() {
		let dir = TempDir::new().unwrap();
		let git = dir.path().join(METADATA_DIR);
		fs::create_dir(&git).unwrap();
		fs::write(git.join("config"), "[core]\n\tbare = false\n").unwrap();

		let repo = GitRepo::new(dir.path(), "main");
		repo.write_speed_config().unwrap();
		repo.write_speed_config().unwrap();

		let content = fs::read_to_string(git.join("config")).unwrap();
		assert!(content.starts_with("[core]\n\tbare = false\n"));
		assert_eq!(content.matches("preloadindex").count(), 1);
	}

	#[test]
	fn test_write_speed_config_missing_file() {
		let dir = TempDir::new().unwrap();
		let repo = GitRepo::new(dir.path(), "main");
		assert!(repo.write_speed_config().is_err());
	}
}

// vim: ts=4
