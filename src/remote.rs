//! Remote repository management
//!
//! The hosting provider is an external collaborator. The sync engines only
//! need the handful of operations on [`RemoteManager`]; [`GhCli`] provides
//! them through the `gh` command-line tool.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::identity::RemoteIdentity;
use crate::logging::*;
use crate::process;

/// Pause after creating a repository so the host can finish provisioning
pub const CREATE_SETTLE: Duration = Duration::from_secs(2);

/// Pause after each step of a delete-and-recreate cycle
pub const RECREATE_SETTLE: Duration = Duration::from_secs(3);

/// Repository visibility as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
	Public,
	Private,
	Internal,
	Other(String),
}

impl FromStr for Visibility {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_uppercase().as_str() {
			"PUBLIC" => Ok(Self::Public),
			"PRIVATE" => Ok(Self::Private),
			"INTERNAL" => Ok(Self::Internal),
			"" => Err("empty visibility".to_string()),
			other => Ok(Self::Other(other.to_string())),
		}
	}
}

impl fmt::Display for Visibility {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Public => write!(f, "public"),
			Self::Private => write!(f, "private"),
			Self::Internal => write!(f, "internal"),
			Self::Other(v) => write!(f, "{}", v.to_lowercase()),
		}
	}
}

/// Operations the sync engines need from the hosting provider
#[async_trait]
pub trait RemoteManager: Send + Sync {
	/// Current visibility, or an error if the repository is not reachable
	async fn view(&self, identity: &RemoteIdentity) -> Result<Visibility, String>;

	async fn create(&self, identity: &RemoteIdentity, public: bool) -> bool;

	async fn edit_visibility(&self, identity: &RemoteIdentity, public: bool) -> bool;

	async fn delete(&self, identity: &RemoteIdentity) -> bool;

	/// Acknowledge one secret-scanning block so the next push goes through
	async fn bypass_push_protection(&self, identity: &RemoteIdentity, placeholder_id: &str) -> bool;

	/// Make sure the repository exists and is public
	async fn ensure_exists(&self, identity: &RemoteIdentity) {
		match self.view(identity).await {
			Err(e) => {
				info!("Creating remote repository {}", identity.slug());
				debug!("view {} failed: {}", identity.slug(), e);
				if !self.create(identity, true).await {
					warn!("Could not create {}", identity.slug());
				}
				tokio::time::sleep(CREATE_SETTLE).await;
			}
			Ok(Visibility::Public) => {}
			Ok(visibility) => {
				info!("Making {} public (was {})", identity.slug(), visibility);
				if !self.edit_visibility(identity, true).await {
					warn!("Could not change visibility of {}", identity.slug());
				}
			}
		}
	}

	/// Delete the repository and create it again, empty and public
	async fn recreate(&self, identity: &RemoteIdentity) {
		if !self.delete(identity).await {
			warn!("Could not delete {}", identity.slug());
		}
		tokio::time::sleep(RECREATE_SETTLE).await;
		if !self.create(identity, true).await {
			warn!("Could not recreate {}", identity.slug());
		}
		tokio::time::sleep(RECREATE_SETTLE).await;
	}
}

#[derive(Debug, Deserialize)]
struct RepoView {
	visibility: String,
}

/// [`RemoteManager`] backed by the `gh` CLI
///
/// Authentication is whatever `gh` is already configured with.
#[derive(Debug, Clone)]
pub struct GhCli {
	program: String,
	timeout: Duration,
	bypass_timeout: Duration,
}

impl GhCli {
	pub fn new() -> Self {
		GhCli {
			program: "gh".to_string(),
			timeout: Duration::from_secs(30),
			bypass_timeout: Duration::from_secs(15),
		}
	}

	async fn gh(&self, args: &[&str], timeout: Duration) -> process::CommandOutput {
		process::run(&self.program, args, None, timeout).await
	}
}

impl Default for GhCli {
	fn default() -> Self {
		Self::new()
	}
}

/// Parse `gh repo view --json visibility` output
fn parse_view(stdout: &str) -> Result<Visibility, String> {
	let view: RepoView = serde_json::from_str(stdout.trim())
		.map_err(|e| format!("unexpected view output: {}", e))?;
	view.visibility.parse()
}

#[async_trait]
impl RemoteManager for GhCli {
	async fn view(&self, identity: &RemoteIdentity) -> Result<Visibility, String> {
		let slug = identity.slug();
		let out = self.gh(&["repo", "view", &slug, "--json", "visibility"], self.timeout).await;
		if !out.success {
			return Err(out.stderr.trim().to_string());
		}
		// A repository we can see but cannot parse still exists
		Ok(parse_view(&out.stdout).unwrap_or_else(Visibility::Other))
	}

	async fn create(&self, identity: &RemoteIdentity, public: bool) -> bool {
		let slug = identity.slug();
		let flag = if public { "--public" } else { "--private" };
		self.gh(&["repo", "create", &slug, flag], self.timeout).await.success
	}

	async fn edit_visibility(&self, identity: &RemoteIdentity, public: bool) -> bool {
		let slug = identity.slug();
		let visibility = if public { "public" } else { "private" };
		self.gh(
			&[
				"repo",
				"edit",
				&slug,
				"--visibility",
				visibility,
				"--accept-visibility-change-consequences",
			],
			self.timeout,
		)
		.await
		.success
	}

	async fn delete(&self, identity: &RemoteIdentity) -> bool {
		let slug = identity.slug();
		self.gh(&["repo", "delete", &slug, "--yes"], self.timeout).await.success
	}

	async fn bypass_push_protection(&self, identity: &RemoteIdentity, placeholder_id: &str) -> bool {
		let endpoint = format!("repos/{}/secret-scanning/push-protection-bypasses", identity.slug());
		let placeholder = format!("placeholder_id={}", placeholder_id);
		self.gh(
			&["api", "-X", "POST", &endpoint, "-f", "reason=will_fix_later", "-f", &placeholder],
			self.bypass_timeout,
		)
		.await
		.success
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	#[test]
	fn test_parse_view() {
		assert_eq!(parse_view(r#"{"visibility":"PUBLIC"}"#), Ok(Visibility::Public));
		assert_eq!(parse_view("{\"visibility\":\"PRIVATE\"}\n"), Ok(Visibility::Private));
		assert!(parse_view("PUBLIC").is_err());
	}

	#[test]
	fn test_visibility_from_str() {
		assert_eq!("public".parse::<Visibility>(), Ok(Visibility::Public));
		assert_eq!(" Internal ".parse::<Visibility>(), Ok(Visibility::Internal));
		assert_eq!("secret".parse::<Visibility>(), Ok(Visibility::Other("SECRET".to_string())));
		assert!("".parse::<Visibility>().is_err());
	}

	/// Records calls; `view` answers with a fixed result
	struct Scripted {
		view: Result<Visibility, String>,
		calls: Mutex<Vec<String>>,
	}

	impl Scripted {
		fn new(view: Result<Visibility, String>) -> Self {
			Scripted { view, calls: Mutex::new(Vec::new()) }
		}

		fn calls(&self) -> Vec<String> {
			self.calls.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl RemoteManager for Scripted {
		async fn view(&self, _identity: &RemoteIdentity) -> Result<Visibility, String> {
			self.calls.lock().unwrap().push("view".to_string());
			self.view.clone()
		}

		async fn create(&self, _identity: &RemoteIdentity, public: bool) -> bool {
			self.calls.lock().unwrap().push(format!("create public={}", public));
			true
		}

		async fn edit_visibility(&self, _identity: &RemoteIdentity, public: bool) -> bool {
			self.calls.lock().unwrap().push(format!("edit public={}", public));
			true
		}

		async fn delete(&self, _identity: &RemoteIdentity) -> bool {
			self.calls.lock().unwrap().push("delete".to_string());
			true
		}

		async fn bypass_push_protection(&self, _identity: &RemoteIdentity, id: &str) -> bool {
			self.calls.lock().unwrap().push(format!("bypass {}", id));
			true
		}
	}

	fn identity() -> RemoteIdentity {
		RemoteIdentity::new("owner", "repo", "https://github.com")
	}

	#[tokio::test(start_paused = true)]
	async fn test_ensure_exists_creates_missing() {
		let remote = Scripted::new(Err("Could not resolve to a Repository".to_string()));
		let start = tokio::time::Instant::now();
		remote.ensure_exists(&identity()).await;
		assert_eq!(remote.calls(), vec!["view", "create public=true"]);
		assert_eq!(start.elapsed(), CREATE_SETTLE);
	}

	#[tokio::test(start_paused = true)]
	async fn test_ensure_exists_publishes_private() {
		let remote = Scripted::new(Ok(Visibility::Private));
		remote.ensure_exists(&identity()).await;
		assert_eq!(remote.calls(), vec!["view", "edit public=true"]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_ensure_exists_public_is_noop() {
		let remote = Scripted::new(Ok(Visibility::Public));
		remote.ensure_exists(&identity()).await;
		assert_eq!(remote.calls(), vec!["view"]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_recreate() {
		let remote = Scripted::new(Ok(Visibility::Public));
		let start = tokio::time::Instant::now();
		remote.recreate(&identity()).await;
		assert_eq!(remote.calls(), vec!["delete", "create public=true"]);
		assert_eq!(start.elapsed(), RECREATE_SETTLE * 2);
	}
}

// vim: ts=4
