//! Repository identifier resolution

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Host accepted by [`resolve`]
pub const DEFAULT_HOST: &str = "github.com";

/// Canonical `(owner, name)` pair for a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepositoryIdentifier {
    owner: String,
    name: String,
}

impl RepositoryIdentifier {
    /// Build an identifier from already-split parts.
    ///
    /// Both parts must be non-empty; a trailing `.git` is stripped from `name`.
    pub fn new(owner: &str, name: &str) -> Result<Self> {
        let owner = owner.trim();
        let name = name.trim();
        let name = name.strip_suffix(".git").unwrap_or(name);

        if owner.is_empty() {
            return Err(Error::ParseError("repository owner is empty".to_string()));
        }
        if name.is_empty() {
            return Err(Error::ParseError("repository name is empty".to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Web URL of the repository on the given host
    pub fn html_url(&self, host: &str) -> String {
        format!("https://{}/{}/{}", host, self.owner, self.name)
    }
}

impl fmt::Display for RepositoryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a repository URL on [`DEFAULT_HOST`] into an identifier
pub fn resolve(input: &str) -> Result<RepositoryIdentifier> {
    resolve_with_host(input, DEFAULT_HOST)
}

/// Parse a repository URL such as `https://github.com/owner/repo[.git][/...]`.
///
/// Only full URLs whose host equals `host` are accepted; extra path segments
/// after the repository name (e.g. `/tree/main`) are ignored.
pub fn resolve_with_host(input: &str, host: &str) -> Result<RepositoryIdentifier> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::ParseError(
            "Please enter a GitHub repository URL.".to_string(),
        ));
    }

    let url = url::Url::parse(input)
        .map_err(|e| Error::ParseError(format!("'{}' is not a valid URL ({})", input, e)))?;

    match url.host_str() {
        Some(h) if h.eq_ignore_ascii_case(host) => {}
        Some(h) => {
            return Err(Error::ParseError(format!(
                "hostname must be {}, got {}",
                host, h
            )))
        }
        None => return Err(Error::ParseError(format!("URL has no host, expected {}", host))),
    }

    let parts: Vec<&str> = url.path().split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return Err(Error::ParseError(format!(
            "expected a repository path like https://{}/owner/repo",
            host
        )));
    }

    RepositoryIdentifier::new(parts[0], parts[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_https() {
        let id = resolve("https://github.com/octocat/Hello-World").unwrap();
        assert_eq!(id.owner(), "octocat");
        assert_eq!(id.name(), "Hello-World");
    }

    #[test]
    fn test_resolve_with_git_suffix() {
        let id = resolve("https://github.com/owner/repo.git").unwrap();
        assert_eq!(id.owner(), "owner");
        assert_eq!(id.name(), "repo");
    }

    #[test]
    fn test_resolve_ignores_extra_segments() {
        let id = resolve("https://github.com/owner/repo/tree/main/src").unwrap();
        assert_eq!(id.to_string(), "owner/repo");

        let id = resolve("  https://github.com//owner//repo/  ").unwrap();
        assert_eq!(id.to_string(), "owner/repo");
    }

    #[test]
    fn test_resolve_rejects_other_hosts() {
        let err = resolve("https://gitlab.com/owner/repo").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
        assert!(err.to_string().contains("github.com"));
    }

    #[test]
    fn test_resolve_rejects_short_paths() {
        assert!(matches!(resolve("https://github.com/owner"), Err(Error::ParseError(_))));
        assert!(matches!(resolve("https://github.com/"), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_resolve_rejects_empty_and_malformed() {
        assert!(matches!(resolve(""), Err(Error::ParseError(_))));
        assert!(matches!(resolve("   "), Err(Error::ParseError(_))));
        assert!(matches!(resolve("owner/repo"), Err(Error::ParseError(_))));
        assert!(matches!(resolve("https://github.com/owner/.git"), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_resolve_custom_host() {
        let id = resolve_with_host("https://git.example.org/team/tool.git", "git.example.org")
            .unwrap();
        assert_eq!(id.to_string(), "team/tool");
        assert!(resolve_with_host("https://github.com/team/tool", "git.example.org").is_err());
    }

    #[test]
    fn test_html_url() {
        let id = RepositoryIdentifier::new("octocat", "Hello-World").unwrap();
        assert_eq!(id.html_url("github.com"), "https://github.com/octocat/Hello-World");
    }
}
