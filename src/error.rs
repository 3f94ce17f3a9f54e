//! Error types for pushr operations

use std::error::Error;
use std::fmt;
use std::io;
use std::time::Duration;

/// Main error type for sync operations
///
/// Only fatal conditions are represented here. Transient push failures are
/// absorbed by the retry loop and surface at most as [`SyncError::PushFailed`].
#[derive(Debug)]
pub enum SyncError {
	/// Target folder does not exist
	FolderMissing { path: String },

	/// Target exists but is not a directory
	NotADirectory { path: String },

	/// Scan found nothing to commit
	NoFiles { path: String },

	/// Repository could not be (re)initialized
	InitFailed { message: String },

	/// Staging finished with an empty index
	NothingStaged,

	/// Commit command failed
	CommitFailed { message: String },

	/// Push retries exhausted or aborted
	PushFailed { repo: String },

	/// Invalid configuration
	InvalidConfig { message: String },

	/// I/O error
	Io(io::Error),
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::FolderMissing { path } => write!(f, "{} does not exist", path),
			SyncError::NotADirectory { path } => write!(f, "{} is not a directory", path),
			SyncError::NoFiles { path } => write!(f, "No files in {}", path),
			SyncError::InitFailed { message } => write!(f, "git init failed: {}", message),
			SyncError::NothingStaged => write!(f, "0 files staged"),
			SyncError::CommitFailed { message } => write!(f, "Commit failed: {}", message),
			SyncError::PushFailed { repo } => write!(f, "PUSH FAILED: {}", repo),
			SyncError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			SyncError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for SyncError {}

impl From<io::Error> for SyncError {
	fn from(e: io::Error) -> Self {
		SyncError::Io(e)
	}
}

/// Failure to run a single external command to completion
#[derive(Debug)]
pub enum CommandError {
	/// Process could not be started
	SpawnFailed { cmd: String, source: io::Error },

	/// Process started but waiting on it failed
	WaitFailed { cmd: String, source: io::Error },

	/// Process exceeded its time budget and was killed
	Timeout { cmd: String, timeout: Duration },
}

impl fmt::Display for CommandError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CommandError::SpawnFailed { cmd, source } => {
				write!(f, "Failed to spawn '{}': {}", cmd, source)
			}
			CommandError::WaitFailed { cmd, source } => {
				write!(f, "Failed to wait for '{}': {}", cmd, source)
			}
			CommandError::Timeout { cmd, timeout } => {
				write!(f, "'{}' timed out after {}s", cmd, timeout.as_secs())
			}
		}
	}
}

impl Error for CommandError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			CommandError::SpawnFailed { source, .. } | CommandError::WaitFailed { source, .. } => {
				Some(source)
			}
			CommandError::Timeout { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sync_error_display() {
		let err = SyncError::PushFailed { repo: "my-repo".to_string() };
		assert_eq!(err.to_string(), "PUSH FAILED: my-repo");

		let err = SyncError::NoFiles { path: "/tmp/empty".to_string() };
		assert!(err.to_string().contains("/tmp/empty"));
	}

	#[test]
	fn test_io_error_conversion() {
		let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
		let err: SyncError = io_err.into();
		assert!(matches!(err, SyncError::Io(_)));
	}

	#[test]
	fn test_command_timeout_display() {
		let err =
			CommandError::Timeout { cmd: "git push".to_string(), timeout: Duration::from_secs(120) };
		assert_eq!(err.to_string(), "'git push' timed out after 120s");
		assert!(err.source().is_none());
	}
}

// vim: ts=4
