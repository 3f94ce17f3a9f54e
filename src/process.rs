//! External command execution
//!
//! Every tool invocation goes through [`run`]: output is captured, the
//! credential prompt is disabled and the child is killed once its timeout
//! expires. Spawn errors and timeouts are folded into a failed
//! [`CommandOutput`] so callers only ever branch on `success`.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::CommandError;
use crate::logging::*;
use crate::util::truncate_chars;

/// Error text reported for a command that ran out of time
pub const TIMEOUT_MESSAGE: &str = "timeout";

/// Maximum length of a diagnostic line shown to the user
pub const DIAGNOSTIC_MAX_CHARS: usize = 120;

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
	pub success: bool,
	pub stdout: String,
	pub stderr: String,
}

impl CommandOutput {
	pub fn ok(stdout: impl Into<String>) -> Self {
		CommandOutput { success: true, stdout: stdout.into(), stderr: String::new() }
	}

	pub fn failed(stderr: impl Into<String>) -> Self {
		CommandOutput { success: false, stdout: String::new(), stderr: stderr.into() }
	}

	fn from_error(err: CommandError) -> Self {
		match err {
			CommandError::Timeout { .. } => CommandOutput::failed(TIMEOUT_MESSAGE),
			other => CommandOutput::failed(other.to_string()),
		}
	}

	/// First stderr line worth showing to a user, truncated
	///
	/// Skips blank lines, the `To <url>` banner, `remote:` chatter and
	/// separator rules.
	pub fn diagnostic(&self) -> Option<String> {
		self.stderr
			.lines()
			.map(str::trim)
			.find(|line| {
				!line.is_empty()
					&& !line.starts_with("To ")
					&& !line.starts_with("remote:")
					&& !line.contains("----")
			})
			.map(|line| truncate_chars(line, DIAGNOSTIC_MAX_CHARS).to_string())
	}
}

fn describe(program: &str, args: &[&str]) -> String {
	let mut cmd = program.to_string();
	for arg in args {
		cmd.push(' ');
		cmd.push_str(arg);
	}
	cmd
}

/// Run `program` with `args`, optionally inside `cwd`, for at most `timeout`
pub async fn run(program: &str, args: &[&str], cwd: Option<&Path>, timeout: Duration) -> CommandOutput {
	debug!("$ {} (timeout {}s)", describe(program, args), timeout.as_secs());
	match try_run(program, args, cwd, timeout).await {
		Ok(output) => {
			if !output.success {
				debug!("{} failed: {}", program, output.stderr.trim());
			}
			output
		}
		Err(e) => {
			debug!("{}", e);
			CommandOutput::from_error(e)
		}
	}
}

async fn try_run(
	program: &str,
	args: &[&str],
	cwd: Option<&Path>,
	timeout: Duration,
) -> Result<CommandOutput, CommandError> {
	let mut cmd = Command::new(program);
	cmd.args(args)
		.env("GIT_TERMINAL_PROMPT", "0")
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true);
	if let Some(dir) = cwd {
		cmd.current_dir(dir);
	}

	let child = cmd
		.spawn()
		.map_err(|source| CommandError::SpawnFailed { cmd: describe(program, args), source })?;

	// Dropping the wait future on timeout drops the child, which kills it
	match tokio::time::timeout(timeout, child.wait_with_output()).await {
		Ok(Ok(output)) => Ok(CommandOutput {
			success: output.status.success(),
			stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
			stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
		}),
		Ok(Err(source)) => Err(CommandError::WaitFailed { cmd: describe(program, args), source }),
		Err(_) => Err(CommandError::Timeout { cmd: describe(program, args), timeout }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_diagnostic_skips_noise() {
		let out = CommandOutput::failed(
			"\nTo https://github.com/owner/repo.git\nremote: ----\nremote: Resolving...\n ! [rejected] main -> main (fetch first)\nerror: failed to push some refs\n",
		);
		assert_eq!(out.diagnostic().as_deref(), Some("! [rejected] main -> main (fetch first)"));
	}

	#[test]
	fn test_diagnostic_truncates() {
		let long = "x".repeat(300);
		let out = CommandOutput::failed(long);
		assert_eq!(out.diagnostic().map(|l| l.len()), Some(DIAGNOSTIC_MAX_CHARS));
	}

	#[test]
	fn test_diagnostic_empty() {
		assert_eq!(CommandOutput::failed("  \n").diagnostic(), None);
		assert_eq!(CommandOutput::ok("fine").diagnostic(), None);
	}

	#[tokio::test]
	async fn test_missing_program_is_a_failed_output() {
		let out = run("pushr-no-such-program", &["--version"], None, Duration::from_secs(5)).await;
		assert!(!out.success);
		assert!(out.stderr.contains("Failed to spawn"));
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_timeout_reports_timeout() {
		let out = run("sleep", &["5"], None, Duration::from_millis(100)).await;
		assert!(!out.success);
		assert_eq!(out.stderr, TIMEOUT_MESSAGE);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_captures_output() {
		let out = run("sh", &["-c", "echo out; echo err >&2; exit 3"], None, Duration::from_secs(5))
			.await;
		assert!(!out.success);
		assert_eq!(out.stdout.trim(), "out");
		assert_eq!(out.stderr.trim(), "err");
	}
}

// vim: ts=4
