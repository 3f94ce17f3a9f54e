//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use pushr::identity::RemoteIdentity;
use pushr::process::{self, CommandOutput};
use pushr::remote::{RemoteManager, Visibility};
use pushr::retry::PushTarget;

/// Whether a usable `git` is on PATH
pub fn git_available() -> bool {
	std::process::Command::new("git")
		.arg("--version")
		.output()
		.map(|o| o.status.success())
		.unwrap_or(false)
}

/// Run `git <args>` in `dir`, panicking on failure; returns stdout
pub fn git(dir: &Path, args: &[&str]) -> String {
	let out = std::process::Command::new("git").args(args).current_dir(dir).output().unwrap();
	assert!(
		out.status.success(),
		"git {:?} failed: {}",
		args,
		String::from_utf8_lossy(&out.stderr)
	);
	String::from_utf8_lossy(&out.stdout).into_owned()
}

/// The only bare repository kept for `owner` under `base`
pub fn bare_repo(base: &Path, owner: &str) -> PathBuf {
	let mut repos: Vec<PathBuf> =
		fs::read_dir(base.join(owner)).unwrap().map(|e| e.unwrap().path()).collect();
	assert_eq!(repos.len(), 1);
	repos.remove(0)
}

/// Install an executable `pre-receive` hook into a bare repository
#[cfg(unix)]
pub fn install_pre_receive(bare: &Path, script: &str) {
	use std::os::unix::fs::PermissionsExt;

	let hook = bare.join("hooks").join("pre-receive");
	fs::create_dir_all(hook.parent().unwrap()).unwrap();
	fs::write(&hook, script).unwrap();
	fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Remote manager keeping bare repositories under a local directory
///
/// Pair with `remoteBase` set to the same directory so pushes land in
/// `{base}/{owner}/{name}.git`.
pub struct LocalRemote {
	base: PathBuf,
}

impl LocalRemote {
	pub fn new(base: impl Into<PathBuf>) -> Self {
		LocalRemote { base: base.into() }
	}

	pub fn path_for(&self, identity: &RemoteIdentity) -> PathBuf {
		self.base.join(identity.owner()).join(format!("{}.git", identity.name()))
	}
}

#[async_trait]
impl RemoteManager for LocalRemote {
	async fn view(&self, identity: &RemoteIdentity) -> Result<Visibility, String> {
		let path = self.path_for(identity);
		if path.join("HEAD").is_file() {
			Ok(Visibility::Public)
		} else {
			Err(format!("{} not found", path.display()))
		}
	}

	async fn create(&self, identity: &RemoteIdentity, _public: bool) -> bool {
		let path = self.path_for(identity);
		if fs::create_dir_all(&path).is_err() {
			return false;
		}
		let target = path.to_string_lossy().into_owned();
		process::run("git", &["init", "--bare", "-q", "-b", "main", &target], None, Duration::from_secs(30))
			.await
			.success
	}

	async fn edit_visibility(&self, _identity: &RemoteIdentity, _public: bool) -> bool {
		true
	}

	async fn delete(&self, identity: &RemoteIdentity) -> bool {
		fs::remove_dir_all(self.path_for(identity)).is_ok()
	}

	async fn bypass_push_protection(&self, _identity: &RemoteIdentity, _placeholder_id: &str) -> bool {
		true
	}
}

/// Remote manager that records every call
#[derive(Default)]
pub struct RecordingRemote {
	pub exists: Mutex<bool>,
	pub calls: Mutex<Vec<String>>,
}

impl RecordingRemote {
	pub fn existing() -> Self {
		RecordingRemote { exists: Mutex::new(true), calls: Mutex::new(Vec::new()) }
	}

	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().unwrap().clone()
	}

	fn record(&self, call: String) {
		self.calls.lock().unwrap().push(call);
	}
}

#[async_trait]
impl RemoteManager for RecordingRemote {
	async fn view(&self, _identity: &RemoteIdentity) -> Result<Visibility, String> {
		self.record("view".to_string());
		if *self.exists.lock().unwrap() {
			Ok(Visibility::Public)
		} else {
			Err("not found".to_string())
		}
	}

	async fn create(&self, _identity: &RemoteIdentity, public: bool) -> bool {
		self.record(format!("create public={}", public));
		*self.exists.lock().unwrap() = true;
		true
	}

	async fn edit_visibility(&self, _identity: &RemoteIdentity, public: bool) -> bool {
		self.record(format!("edit public={}", public));
		true
	}

	async fn delete(&self, _identity: &RemoteIdentity) -> bool {
		self.record("delete".to_string());
		*self.exists.lock().unwrap() = false;
		true
	}

	async fn bypass_push_protection(&self, _identity: &RemoteIdentity, placeholder_id: &str) -> bool {
		self.record(format!("bypass {}", placeholder_id));
		true
	}
}

/// Push target replaying scripted outcomes; succeeds once the script runs out
#[derive(Default)]
pub struct ScriptedTarget {
	script: Mutex<VecDeque<CommandOutput>>,
	pub push_timeouts: Mutex<Vec<Duration>>,
	pub large_file_pushes: Mutex<Vec<Duration>>,
	pub limit_raises: Mutex<usize>,
}

impl ScriptedTarget {
	pub fn failing_with(errors: &[&str]) -> Self {
		let script = errors.iter().map(|e| CommandOutput::failed(*e)).collect();
		ScriptedTarget { script: Mutex::new(script), ..Default::default() }
	}

	pub fn pushes(&self) -> usize {
		self.push_timeouts.lock().unwrap().len()
	}
}

#[async_trait]
impl PushTarget for ScriptedTarget {
	async fn push(&self, timeout: Duration) -> CommandOutput {
		self.push_timeouts.lock().unwrap().push(timeout);
		self.script.lock().unwrap().pop_front().unwrap_or_else(|| CommandOutput::ok(""))
	}

	async fn push_large_files(&self, timeout: Duration) -> CommandOutput {
		self.large_file_pushes.lock().unwrap().push(timeout);
		CommandOutput::ok("")
	}

	async fn raise_transfer_limits(&self) {
		*self.limit_raises.lock().unwrap() += 1;
	}
}

/// Identity used by tests that never touch a real remote
pub fn identity() -> RemoteIdentity {
	RemoteIdentity::new("tester", "notes", "https://github.com")
}

// vim: ts=4
