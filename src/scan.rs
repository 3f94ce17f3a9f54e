//! Single-pass filesystem scan with fused hygiene
//!
//! The scan visits every file once. While walking it deletes files whose
//! names are reserved device names on Windows and nested repository
//! metadata directories, and records files above the large-file threshold.
//! Per-entry errors are logged and skipped; the scan itself never fails.

use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::callbacks::{SyncEvent, SyncProgressCallback};
use crate::hygiene::METADATA_DIR;
use crate::logging::*;

/// Files above this size are routed through the large-file side channel
pub const LARGE_FILE_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Hard per-file ceiling of the hosting service
pub const REMOTE_FILE_LIMIT: u64 = 100 * 1024 * 1024;

/// Device names Windows refuses to use as file names
pub const RESERVED_NAMES: [&str; 22] = [
	"con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
	"com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

const PROGRESS_EVERY_FILES: usize = 1000;
const PROGRESS_EVERY: Duration = Duration::from_secs(5);

/// A file too large for inline storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LargeFileRecord {
	/// Path relative to the scan root
	pub path: PathBuf,
	pub size: u64,
}

/// Result of [`scan_and_clean`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
	pub total_files: usize,
	pub large_files: Vec<LargeFileRecord>,
	pub removed_reserved: usize,
}

/// Whether `file_name` is a reserved device name, ignoring case and extension
pub fn is_reserved_name(file_name: &str) -> bool {
	let lower = file_name.to_lowercase();
	let stem = lower.split('.').next().unwrap_or("");
	RESERVED_NAMES.contains(&stem) || RESERVED_NAMES.contains(&lower.as_str())
}

#[cfg(windows)]
fn removable_path(path: &Path) -> PathBuf {
	// Reserved names can only be deleted through a verbatim path
	let raw = path.as_os_str().to_string_lossy();
	if raw.starts_with(r"\\?\") {
		path.to_path_buf()
	} else {
		PathBuf::from(format!(r"\\?\{}", raw))
	}
}

#[cfg(not(windows))]
fn removable_path(path: &Path) -> PathBuf {
	path.to_path_buf()
}

/// Walk `root` once, removing reserved-name files and nested metadata
///
/// The root's own metadata directory is skipped, not removed.
pub fn scan_and_clean(root: &Path, threshold: u64, progress: &dyn SyncProgressCallback) -> ScanReport {
	info!("Scanning {}...", root.display());

	let walker = WalkBuilder::new(root)
		.standard_filters(false)
		.hidden(false)
		.follow_links(false)
		.filter_entry(|entry| {
			if entry.file_name() != METADATA_DIR {
				return true;
			}
			let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
			if is_dir && entry.depth() > 1 {
				debug!("Removing nested metadata {}", entry.path().display());
				if let Err(e) = fs::remove_dir_all(entry.path()) {
					debug!("Cannot remove {}: {}", entry.path().display(), e);
				}
			}
			// Never descend into any metadata directory
			!is_dir
		})
		.build();

	let mut report = ScanReport::default();
	let mut last_update = Instant::now();

	for result in walker {
		let entry = match result {
			Ok(entry) => entry,
			Err(e) => {
				debug!("Skipping unreadable entry: {}", e);
				continue;
			}
		};
		if entry.depth() == 0 || entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
			continue;
		}

		let path = entry.path();
		let name = entry.file_name().to_string_lossy();
		if is_reserved_name(&name) {
			debug!("Removing reserved name {}", path.display());
			match fs::remove_file(removable_path(path)) {
				Ok(()) => report.removed_reserved += 1,
				Err(e) => debug!("Cannot remove {}: {}", path.display(), e),
			}
			continue;
		}

		report.total_files += 1;
		if report.total_files % PROGRESS_EVERY_FILES == 0 || last_update.elapsed() > PROGRESS_EVERY {
			progress.on_event(SyncEvent::ScanProgress {
				files: report.total_files,
				large: report.large_files.len(),
			});
			last_update = Instant::now();
		}

		match fs::metadata(path) {
			Ok(meta) if meta.len() > threshold => {
				let rel = path.strip_prefix(root).unwrap_or(path).to_path_buf();
				report.large_files.push(LargeFileRecord { path: rel, size: meta.len() });
			}
			Ok(_) => {}
			Err(e) => debug!("Cannot stat {}: {}", path.display(), e),
		}
	}

	info!("Scan complete: {} files, {} large", report.total_files, report.large_files.len());
	progress.on_event(SyncEvent::ScanComplete {
		files: report.total_files,
		large: report.large_files.len(),
	});
	report
}


// vim: ts=4
