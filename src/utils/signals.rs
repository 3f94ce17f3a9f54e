//! Signal handlers for termination
//!
//! A run interrupted mid-way may leave `*.lock` files in the metadata
//! directory; the next incremental run sweeps them before touching the index.

use tracing::{debug, warn};

/// Exit status for SIGINT (128 + 2)
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit status for SIGTERM (128 + 15)
pub const EXIT_TERMINATED: i32 = 143;

/// Spawn a task that exits the process on SIGINT or SIGTERM
///
/// Child commands are spawned with `kill_on_drop`, but `exit` skips
/// destructors, so in-flight git processes may outlive us briefly.
#[cfg(unix)]
pub fn setup_signal_handlers() {
	tokio::spawn(async {
		use tokio::signal::unix::{signal, SignalKind};

		let mut sigterm = match signal(SignalKind::terminate()) {
			Ok(stream) => stream,
			Err(e) => {
				warn!("Failed to setup SIGTERM handler: {}", e);
				return;
			}
		};

		let mut sigint = match signal(SignalKind::interrupt()) {
			Ok(stream) => stream,
			Err(e) => {
				warn!("Failed to setup SIGINT handler: {}", e);
				return;
			}
		};

		tokio::select! {
			_ = sigterm.recv() => {
				debug!("Received SIGTERM, exiting");
				std::process::exit(EXIT_TERMINATED);
			}
			_ = sigint.recv() => {
				debug!("Received SIGINT, exiting");
				std::process::exit(EXIT_INTERRUPTED);
			}
		}
	});
}

#[cfg(not(unix))]
pub fn setup_signal_handlers() {
	tokio::spawn(async {
		match tokio::signal::ctrl_c().await {
			Ok(()) => {
				debug!("Received Ctrl-C, exiting");
				std::process::exit(EXIT_INTERRUPTED);
			}
			Err(e) => warn!("Failed to setup Ctrl-C handler: {}", e),
		}
	});
}

// vim: ts=4
