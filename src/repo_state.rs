//! Classification of existing local repository metadata

use std::fs;
use std::path::Path;

use crate::git::GitRepo;
use crate::hygiene::METADATA_DIR;
use crate::identity::RemoteIdentity;
use crate::logging::*;

/// What was found in the folder's metadata directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
	/// No HEAD or config file
	Missing,
	/// Config does not mention the expected owner and repository name
	Foreign,
	/// HEAD does not resolve to a commit
	Unborn,
	/// Usable for an incremental sync
	Valid,
}

impl RepoState {
	pub fn is_valid(self) -> bool {
		self == RepoState::Valid
	}
}

/// Whether a repository config text belongs to `identity`, ignoring case
pub fn config_matches(config_text: &str, identity: &RemoteIdentity) -> bool {
	let text = config_text.to_lowercase();
	text.contains(&identity.name().to_lowercase()) && text.contains(&identity.owner().to_lowercase())
}

/// Inspect the metadata under `repo`'s root; never fails
pub async fn classify(repo: &GitRepo, identity: &RemoteIdentity) -> RepoState {
	let git_dir = repo.root().join(METADATA_DIR);
	let config_path = git_dir.join("config");
	if !git_dir.join("HEAD").is_file() || !config_path.is_file() {
		return RepoState::Missing;
	}

	let config = match fs::read(&config_path) {
		Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
		Err(e) => {
			debug!("Cannot read {}: {}", config_path.display(), e);
			return RepoState::Missing;
		}
	};
	if !config_matches(&config, identity) {
		return RepoState::Foreign;
	}

	if repo.head_resolves().await {
		RepoState::Valid
	} else {
		RepoState::Unborn
	}
}

/// Shorthand for `classify(..).is_valid()`
pub async fn has_valid_repo(repo: &GitRepo, identity: &RemoteIdentity) -> bool {
	let state = classify(repo, identity).await;
	debug!("Repository state of {}: {:?}", repo.root().display(), state);
	state.is_valid()
}


// vim: ts=4
