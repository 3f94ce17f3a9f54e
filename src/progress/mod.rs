//! Progress display callback for CLI sync
//!
//! Renders sync events to stderr: a step bar for full syncs, a
//! throttled counter line while scanning, and one line per push attempt.

pub mod constants;

use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

use crate::callbacks::{SyncEvent, SyncProgressCallback};
use crate::logging::*;

/// Progress display constants
pub use constants::*;

/// Render `step` of `total` as a fixed-width bar
pub fn step_bar(step: usize, total: usize) -> String {
	let ratio = if total > 0 { step as f64 / total as f64 } else { 0.0 };
	let filled = (ratio.clamp(0.0, 1.0) * PROGRESS_BAR_WIDTH as f64) as usize;
	format!("[{}{}]", "=".repeat(filled), " ".repeat(PROGRESS_BAR_WIDTH - filled))
}

/// CLI progress callback
pub struct CliProgressCallback {
	last_update: Mutex<Instant>,
	// A `\r` line is pending and needs a newline before regular output
	inline: Mutex<bool>,
}

impl CliProgressCallback {
	pub fn new() -> Self {
		Self { last_update: Mutex::new(Instant::now()), inline: Mutex::new(false) }
	}

	fn line(&self, text: &str) {
		let mut inline = self.inline.lock().unwrap_or_else(|e| e.into_inner());
		let mut err = std::io::stderr();
		if *inline {
			let _ = writeln!(err);
			*inline = false;
		}
		let _ = writeln!(err, "{}", text);
	}

	fn inline(&self, text: &str) {
		let mut last = self.last_update.lock().unwrap_or_else(|e| e.into_inner());
		if last.elapsed().as_millis() < UPDATE_THROTTLE_MS {
			return;
		}
		*last = Instant::now();
		drop(last);

		let mut err = std::io::stderr();
		let _ = write!(err, "\r{}", text);
		let _ = err.flush();
		*self.inline.lock().unwrap_or_else(|e| e.into_inner()) = true;
	}
}

impl Default for CliProgressCallback {
	fn default() -> Self {
		Self::new()
	}
}

impl SyncProgressCallback for CliProgressCallback {
	fn on_event(&self, event: SyncEvent) {
		match event {
			SyncEvent::StrategyChosen { strategy } => {
				debug!("Strategy: {}", strategy);
			}
			SyncEvent::StepStarted { step, total, label } => {
				self.line(&format!("{} {}/{} {}", step_bar(step, total), step, total, label));
			}
			SyncEvent::ScanProgress { files, large } => {
				self.inline(&format!("  Scanning: {} files, {} large", files, large));
			}
			SyncEvent::ScanComplete { files, large } => {
				self.line(&format!("  Scanned {} files ({} large)", files, large));
			}
			SyncEvent::Staged { count } => {
				self.line(&format!("  {} files staged", count));
			}
			SyncEvent::PushAttempt { attempt, total, timeout } => {
				self.line(&format!("  Push {}/{} (timeout {}s)", attempt, total, timeout.as_secs()));
			}
			SyncEvent::PushError { line } => {
				self.line(&format!("  ! {}", line));
			}
			SyncEvent::Recovering { class, detail } => {
				self.line(&format!("  ~ {}: {}", class, detail));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_step_bar_width() {
		assert_eq!(step_bar(0, 7), format!("[{}]", " ".repeat(PROGRESS_BAR_WIDTH)));
		assert_eq!(step_bar(7, 7), format!("[{}]", "=".repeat(PROGRESS_BAR_WIDTH)));
		assert_eq!(step_bar(1, 2).matches('=').count(), PROGRESS_BAR_WIDTH / 2);
		assert_eq!(step_bar(9, 7).len(), PROGRESS_BAR_WIDTH + 2);
		assert_eq!(step_bar(1, 0).len(), PROGRESS_BAR_WIDTH + 2);
	}
}

// vim: ts=4
