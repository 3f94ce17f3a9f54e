//! Configuration for pushr
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (--config, or ~/.config/pushr/config.toml)
//! 3. Environment variables (PUSHR_* prefix)
//! 4. CLI flags (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SyncError;
use crate::hygiene::DEFAULT_ZAP_CAP;
use crate::scan::LARGE_FILE_THRESHOLD;
use crate::strategies::StrategyMode;

/// Account that owns the synced repositories unless configured otherwise
pub const DEFAULT_OWNER: &str = "Michaelunkai";

/// Host base URL unless configured otherwise
pub const DEFAULT_REMOTE_BASE: &str = "https://github.com";

/// Configuration for a sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// REMOTE
	// ========================================================================
	/// Account owning the remote repository
	pub owner: String,

	/// Base URL of the host; remote is `{remoteBase}/{owner}/{name}.git`
	pub remote_base: String,

	/// Branch created and force-pushed
	pub branch: String,

	// ========================================================================
	// SCANNING
	// ========================================================================
	/// Files above this many bytes go through the large-file side channel
	pub large_file_threshold: u64,

	/// Maximum nested metadata directories removed on the incremental path
	pub nested_zap_cap: usize,

	// ========================================================================
	// SYNC BEHAVIOR
	// ========================================================================
	/// How the sync path is chosen
	pub strategy: StrategyMode,

	/// Register the folder in the global safe.directory list on full sync
	pub mark_safe_directory: bool,

	// ========================================================================
	// PUSH
	// ========================================================================
	/// Timeout of the single quick push on the incremental path
	pub quick_push_timeout_secs: u64,

	/// Base timeout of the incremental retry loop
	pub retry_base_timeout_secs: u64,

	/// Attempt budget of the incremental retry loop
	pub incremental_attempts: usize,

	/// Attempt budget of the full-sync retry loop
	pub full_attempts: usize,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			owner: DEFAULT_OWNER.to_string(),
			remote_base: DEFAULT_REMOTE_BASE.to_string(),
			branch: "main".to_string(),

			large_file_threshold: LARGE_FILE_THRESHOLD,
			nested_zap_cap: DEFAULT_ZAP_CAP,

			strategy: StrategyMode::Auto,
			mark_safe_directory: true,

			quick_push_timeout_secs: 120,
			retry_base_timeout_secs: 1800,
			incremental_attempts: 5,
			full_attempts: 7,
		}
	}
}

impl Config {
	/// `$XDG_CONFIG_HOME/pushr/config.toml`, else `~/.config/pushr/config.toml`
	pub fn default_path() -> Option<PathBuf> {
		if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
			if !dir.is_empty() {
				return Some(PathBuf::from(dir).join("pushr").join("config.toml"));
			}
		}
		std::env::var("HOME")
			.ok()
			.map(|home| PathBuf::from(home).join(".config").join("pushr").join("config.toml"))
	}

	/// Parse a TOML or JSON config file (by extension)
	pub fn from_file(path: &Path) -> Result<Self, SyncError> {
		let text = fs::read_to_string(path).map_err(|e| SyncError::InvalidConfig {
			message: format!("cannot read {}: {}", path.display(), e),
		})?;
		let is_json = path.extension().map(|e| e.eq_ignore_ascii_case("json")).unwrap_or(false);
		let parsed = if is_json {
			serde_json::from_str(&text).map_err(|e| e.to_string())
		} else {
			toml::from_str(&text).map_err(|e| e.to_string())
		};
		parsed.map_err(|message| SyncError::InvalidConfig {
			message: format!("{}: {}", path.display(), message),
		})
	}

	/// Defaults, then config file, then environment
	///
	/// An explicit `path` must exist; the default location is optional.
	pub fn load(path: Option<&Path>) -> Result<Self, SyncError> {
		let mut config = match path {
			Some(p) => Self::from_file(p)?,
			None => match Self::default_path() {
				Some(p) if p.is_file() => Self::from_file(&p)?,
				_ => Self::default(),
			},
		};
		config.apply_env_from(|key| std::env::var(key).ok());
		config.validate()?;
		Ok(config)
	}

	/// Apply `PUSHR_OWNER` and `PUSHR_REMOTE_BASE` from `lookup`
	pub fn apply_env_from<F>(&mut self, lookup: F)
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(owner) = lookup("PUSHR_OWNER").filter(|v| !v.is_empty()) {
			self.owner = owner;
		}
		if let Some(base) = lookup("PUSHR_REMOTE_BASE").filter(|v| !v.is_empty()) {
			self.remote_base = base;
		}
	}

	pub fn validate(&self) -> Result<(), SyncError> {
		let invalid = |message: &str| Err(SyncError::InvalidConfig { message: message.to_string() });
		if self.owner.trim().is_empty() {
			return invalid("owner must not be empty");
		}
		if self.branch.trim().is_empty() {
			return invalid("branch must not be empty");
		}
		if self.large_file_threshold == 0 {
			return invalid("largeFileThreshold must be greater than 0");
		}
		if self.nested_zap_cap == 0 {
			return invalid("nestedZapCap must be greater than 0");
		}
		if self.incremental_attempts == 0 || self.full_attempts == 0 {
			return invalid("attempt budgets must be greater than 0");
		}
		Ok(())
	}

	pub fn quick_push_timeout(&self) -> Duration {
		Duration::from_secs(self.quick_push_timeout_secs)
	}

	pub fn retry_base_timeout(&self) -> Duration {
		Duration::from_secs(self.retry_base_timeout_secs)
	}
}


// vim: ts=4
