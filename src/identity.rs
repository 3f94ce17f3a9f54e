//! Remote repository identity derived from the local folder name
//!
//! The identity is never stored: it is recomputed from the folder name on
//! every run, so renaming the folder retargets the sync.

use std::path::Path;

/// Name used when the folder name has no usable characters
pub const PLACEHOLDER_NAME: &str = "unnamed-repo";

/// Longest repository name the host accepts
pub const MAX_NAME_LEN: usize = 100;

/// Turn a folder name into a repository name
///
/// Lower-cases, turns spaces into hyphens, drops everything outside
/// `[a-z0-9-_]` and keeps at most [`MAX_NAME_LEN`] characters.
pub fn repo_name_for(folder_name: &str) -> String {
	let name: String = folder_name
		.replace(' ', "-")
		.to_lowercase()
		.chars()
		.filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_'))
		.take(MAX_NAME_LEN)
		.collect();

	if name.is_empty() {
		PLACEHOLDER_NAME.to_string()
	} else {
		name
	}
}

/// Owner account, repository name and host base URL of the sync target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIdentity {
	owner: String,
	name: String,
	base: String,
}

impl RemoteIdentity {
	pub fn new(owner: &str, name: &str, base: &str) -> Self {
		RemoteIdentity {
			owner: owner.to_string(),
			name: name.to_string(),
			base: base.trim_end_matches('/').to_string(),
		}
	}

	/// Identity for the folder at `root`
	pub fn for_folder(root: &Path, owner: &str, base: &str) -> Self {
		let folder_name = root.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
		Self::new(owner, &repo_name_for(&folder_name), base)
	}

	pub fn owner(&self) -> &str {
		&self.owner
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// `owner/name`, as the hosting CLI expects it
	pub fn slug(&self) -> String {
		format!("{}/{}", self.owner, self.name)
	}

	/// URL registered as the `origin` remote
	pub fn remote_url(&self) -> String {
		format!("{}/{}/{}.git", self.base, self.owner, self.name)
	}

	/// Browsable URL of the repository
	pub fn web_url(&self) -> String {
		format!("{}/{}/{}", self.base, self.owner, self.name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_well_formed(name: &str) {
		assert!(!name.is_empty());
		assert!(name.chars().count() <= MAX_NAME_LEN);
		assert!(name.chars().all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_')), "{}", name);
	}

	#[test]
	fn test_spaces_and_case() {
		assert_eq!(repo_name_for("My Cool Project"), "my-cool-project");
		assert_eq!(repo_name_for("snake_case-Name"), "snake_case-name");
	}

	#[test]
	fn test_strips_invalid_characters() {
		assert_eq!(repo_name_for("notes (2024)!"), "notes-2024");
		assert_eq!(repo_name_for("a.b.c"), "abc");
		assert_eq!(repo_name_for("Ünïcödé"), "ncd");
	}

	#[test]
	fn test_placeholder_when_empty() {
		assert_eq!(repo_name_for(""), PLACEHOLDER_NAME);
		assert_eq!(repo_name_for("!!!"), PLACEHOLDER_NAME);
		assert_eq!(repo_name_for("日本語"), PLACEHOLDER_NAME);
	}

	#[test]
	fn test_truncates_to_limit() {
		let name = repo_name_for(&"a".repeat(250));
		assert_eq!(name.len(), MAX_NAME_LEN);
	}

	#[test]
	fn test_names_are_always_well_formed() {
		let samples = [
			"",
			" ",
			"Hello World",
			"ALLCAPS",
			"tab\tand\nnewline",
			"emoji 🚀 rocket",
			"C:\\weird\\path",
			"--__--",
			"İstanbul",
			&"Mixed Case 123 ".repeat(20),
		];
		for sample in samples.iter() {
			assert_well_formed(&repo_name_for(sample));
		}
	}

	#[test]
	fn test_deterministic() {
		assert_eq!(repo_name_for("Same Name"), repo_name_for("Same Name"));
	}

	#[test]
	fn test_identity_urls() {
		let id = RemoteIdentity::for_folder(Path::new("/home/me/My Notes"), "alice", "https://github.com/");
		assert_eq!(id.name(), "my-notes");
		assert_eq!(id.slug(), "alice/my-notes");
		assert_eq!(id.remote_url(), "https://github.com/alice/my-notes.git");
		assert_eq!(id.web_url(), "https://github.com/alice/my-notes");
	}

	#[test]
	fn test_identity_for_root_path() {
		let id = RemoteIdentity::for_folder(Path::new("/"), "alice", "https://github.com");
		assert_eq!(id.name(), PLACEHOLDER_NAME);
	}
}

// vim: ts=4
