//! Strategy and mode enums
//!
//! Each enum includes a FromStr implementation for CLI and config parsing.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// STRATEGY MODE
// ============================================================================

/// How the selector picks a sync path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyMode {
	/// Incremental when the existing repository is valid, full otherwise (default)
	#[default]
	Auto,

	/// Always rebuild the repository from scratch
	Full,
}

impl FromStr for StrategyMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"auto" | "smart" => Ok(Self::Auto),
			"full" | "rebuild" => Ok(Self::Full),
			_ => Err(format!("Unknown strategy: {}. Valid options: auto, full", s)),
		}
	}
}

impl std::fmt::Display for StrategyMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Auto => write!(f, "auto"),
			Self::Full => write!(f, "full"),
		}
	}
}

// ============================================================================
// SYNC STRATEGY
// ============================================================================

/// The path a run actually took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStrategy {
	/// Reuse the existing repository, commit and push
	Incremental,

	/// Reinitialize, stage everything, commit and push
	Full,
}

impl std::fmt::Display for SyncStrategy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Incremental => write!(f, "incremental"),
			Self::Full => write!(f, "full"),
		}
	}
}


// vim: ts=4
