//! Large-file routing
//!
//! Files found above the threshold are tracked through the large-file
//! storage side channel, both by exact path and by extension, so later
//! files with the same extension are routed automatically.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::git::GitRepo;
use crate::logging::*;
use crate::scan::LargeFileRecord;

/// Attributes file holding the tracking declarations
pub const ATTRIBUTES_FILE: &str = ".gitattributes";

/// Side-channel transfer settings applied before install
pub const LFS_SETTINGS: [(&str, &str); 6] = [
	("lfs.transfer.maxretries", "10"),
	("lfs.transfer.maxverifies", "10"),
	("lfs.dialtimeout", "300"),
	("lfs.tlstimeout", "600"),
	("lfs.activitytimeout", "600"),
	("http.postBuffer", "1048576000"),
];

/// Track patterns for a set of large files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingRules {
	/// Exact relative paths, forward-slash separated
	pub paths: Vec<String>,
	/// One `*.ext` pattern per distinct lower-cased extension
	pub extensions: Vec<String>,
}

impl TrackingRules {
	pub fn from_records(records: &[LargeFileRecord]) -> Self {
		let mut extensions = BTreeSet::new();
		let mut paths = Vec::with_capacity(records.len());
		for record in records {
			paths.push(record.path.to_string_lossy().replace('\\', "/"));
			if let Some(ext) = record.path.extension() {
				extensions.insert(format!("*.{}", ext.to_string_lossy().to_lowercase()));
			}
		}
		TrackingRules { paths, extensions: extensions.into_iter().collect() }
	}

	pub fn is_empty(&self) -> bool {
		self.paths.is_empty() && self.extensions.is_empty()
	}

	/// All patterns in registration order: paths first, then extensions
	pub fn patterns(&self) -> impl Iterator<Item = &str> {
		self.paths.iter().chain(self.extensions.iter()).map(String::as_str)
	}
}

/// Configure the side channel and register tracking rules for `records`
///
/// Returns the rules that were registered; empty if there was nothing to
/// route or the side channel could not be installed.
pub async fn setup_large_files(repo: &GitRepo, records: &[LargeFileRecord]) -> TrackingRules {
	if records.is_empty() {
		return TrackingRules::default();
	}
	info!("{} large files -> LFS", records.len());

	repo.set_config_many(&LFS_SETTINGS).await;
	if !repo.lfs_install().await {
		warn!("git lfs install failed; large files will be pushed inline");
		return TrackingRules::default();
	}

	let rules = TrackingRules::from_records(records);
	for pattern in rules.patterns() {
		if !repo.lfs_track(pattern).await {
			debug!("git lfs track {} failed", pattern);
		}
	}
	rules
}

/// Whether the worktree declares side-channel tracking
pub fn tracks_large_files(root: &Path) -> bool {
	match fs::read(root.join(ATTRIBUTES_FILE)) {
		Ok(bytes) => String::from_utf8_lossy(&bytes).to_lowercase().contains("lfs"),
		Err(_) => false,
	}
}


// vim: ts=4
