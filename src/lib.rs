//! repo-insight - GitHub repository analytics reports
//!
//! This library resolves a repository URL, fetches repository details, recent
//! commits, contributors, languages, open issues, the latest release and
//! weekly commit activity, and assembles them into a [`data::Report`] in which
//! every section carries its own outcome.
//!
//! # Features
//!
//! - Direct GitHub REST v3 client or a backend proxy, behind one provider trait
//! - Concurrent section fetches; one failing section never hides the others
//! - Derived metrics: language shares, short SHAs, recent weekly activity
//! - Text, JSON and standalone HTML output
//!
//! # Example
//!
//! ```no_run
//! use repo_insight::{aggregator, github::{ClientConfig, GitHubClient}, identifier, render};
//!
//! # async fn run() -> repo_insight::Result<()> {
//! let id = identifier::resolve("https://github.com/octocat/Hello-World")?;
//! let client = GitHubClient::new(ClientConfig::default())?;
//!
//! let report = aggregator::analyze(&client, &id).await?;
//! println!("{}", render::render_text(&report));
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod data;
pub mod error;
pub mod github;
pub mod html;
pub mod identifier;
pub mod metrics;
pub mod normalize;
pub mod outcome;
pub mod provider;
pub mod proxy;
pub mod render;

pub use error::{Error, Result};
pub use outcome::SectionOutcome;
