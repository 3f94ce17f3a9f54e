//! # pushr - Mirror a folder to a hosted git repository
//!
//! pushr converges a local directory to a force-pushed remote repository
//! without manual intervention. It picks an incremental path when the
//! folder already holds a valid repository for the expected remote, and
//! rebuilds the repository from scratch otherwise.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pushr::sync::SyncBuilder;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = SyncBuilder::new("./notes").sync().await?;
//!     println!("{} {}", report.outcome, report.web_url);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom remote and progress
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pushr::{config::Config, progress::CliProgressCallback, remote::GhCli, sync::SyncBuilder};
//!
//! let config = Config { owner: "alice".to_string(), ..Config::default() };
//! let report = SyncBuilder::new("./notes")
//!     .config(config)
//!     .remote(Box::new(GhCli::new()))
//!     .progress(Arc::new(CliProgressCallback::new()))
//!     .sync()
//!     .await?;
//! ```

pub mod callbacks;
pub mod config;
pub mod error;
pub mod git;
pub mod hygiene;
pub mod identity;
pub mod lfs;
pub mod logging;
pub mod process;
pub mod progress;
pub mod remote;
pub mod repo_state;
pub mod retry;
pub mod scan;
pub mod strategies;
pub mod sync;
pub mod util;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::SyncError;
pub use identity::RemoteIdentity;
pub use sync::{SyncBuilder, SyncOutcome, SyncReport};

// vim: ts=4
