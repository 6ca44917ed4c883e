//! Normalized report data structures

use crate::identifier::RepositoryIdentifier;
use crate::outcome::SectionOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// The seven resource kinds that make up a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Details,
    Commits,
    Contributors,
    Languages,
    Issues,
    Release,
    Frequency,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Details,
        ResourceKind::Commits,
        ResourceKind::Contributors,
        ResourceKind::Languages,
        ResourceKind::Issues,
        ResourceKind::Release,
        ResourceKind::Frequency,
    ];

    /// Human-readable section title
    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Details => "Repository Details",
            ResourceKind::Commits => "Recent Commits",
            ResourceKind::Contributors => "Top Contributors",
            ResourceKind::Languages => "Languages",
            ResourceKind::Issues => "Open Issues",
            ResourceKind::Release => "Latest Release",
            ResourceKind::Frequency => "Commit Frequency",
        }
    }

    /// Placeholder shown when the section resolved to `Empty`
    pub fn empty_message(&self) -> &'static str {
        match self {
            ResourceKind::Details => "No repository details available.",
            ResourceKind::Commits => "No commit activity found or repository is empty.",
            ResourceKind::Contributors => "No contributor data found.",
            ResourceKind::Languages => "Language data not available.",
            ResourceKind::Issues => "No open issues.",
            ResourceKind::Release => "No releases found for this repository.",
            ResourceKind::Frequency => "No commit activity data available.",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Details => "details",
            ResourceKind::Commits => "commits",
            ResourceKind::Contributors => "contributors",
            ResourceKind::Languages => "languages",
            ResourceKind::Issues => "issues",
            ResourceKind::Release => "release",
            ResourceKind::Frequency => "frequency",
        };
        f.write_str(name)
    }
}

/// Repository metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoDetails {
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub language: Option<String>,
    pub owner: OwnerInfo,
    pub created_at: Option<DateTime<Utc>>,
    pub last_push: Option<DateTime<Utc>>,
    pub url: String,
}

/// Repository owner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerInfo {
    pub login: String,
    pub profile_url: String,
}

/// A recent commit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitEntry {
    /// Commit message (first line)
    pub message: String,
    /// Author name from the commit metadata
    pub author_name: String,
    /// Profile of the associated platform account, if any
    pub author_profile_url: Option<String>,
    pub date: DateTime<Utc>,
    /// Full commit SHA, at least 7 ASCII characters
    pub sha: String,
}

impl CommitEntry {
    /// Abbreviated 7-character SHA
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub login: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub contributions: u64,
}

/// Byte count and share of one language
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    /// Percentage of total bytes, rounded to 2 decimal places
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: Option<DateTime<Utc>>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseSummary {
    pub name: Option<String>,
    pub tag_name: String,
    /// Absent for draft-like releases; never fabricated
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    /// Raw release notes as written upstream
    pub body: String,
}

/// Commit total for one week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitFrequencyBucket {
    /// Week start, epoch seconds
    pub week_start: i64,
    pub total_commits: u64,
}

/// Complete analytics report for one repository
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub repository: RepositoryIdentifier,
    pub generated_at: DateTime<Utc>,
    pub details: SectionOutcome<RepoDetails>,
    pub commits: SectionOutcome<Vec<CommitEntry>>,
    pub contributors: SectionOutcome<Vec<Contributor>>,
    pub languages: SectionOutcome<Vec<LanguageShare>>,
    pub issues: SectionOutcome<Vec<IssueSummary>>,
    pub release: SectionOutcome<ReleaseSummary>,
    pub frequency: SectionOutcome<Vec<CommitFrequencyBucket>>,
}

impl Report {
    /// State name of every section, in [`ResourceKind::ALL`] order
    pub fn section_states(&self) -> [(ResourceKind, &'static str); 7] {
        [
            (ResourceKind::Details, self.details.state()),
            (ResourceKind::Commits, self.commits.state()),
            (ResourceKind::Contributors, self.contributors.state()),
            (ResourceKind::Languages, self.languages.state()),
            (ResourceKind::Issues, self.issues.state()),
            (ResourceKind::Release, self.release.state()),
            (ResourceKind::Frequency, self.frequency.state()),
        ]
    }

    /// Number of sections that resolved to `Error`
    pub fn error_count(&self) -> usize {
        self.section_states()
            .iter()
            .filter(|(_, state)| *state == "error")
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sha() {
        let commit = CommitEntry {
            message: "Initial commit".to_string(),
            author_name: "Octo Cat".to_string(),
            author_profile_url: None,
            date: Utc::now(),
            sha: "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d".to_string(),
        };
        assert_eq!(commit.short_sha(), "7fd1a60");
    }

    #[test]
    fn test_kind_display_and_titles() {
        assert_eq!(ResourceKind::Frequency.to_string(), "frequency");
        assert_eq!(ResourceKind::Release.title(), "Latest Release");
        assert_eq!(ResourceKind::ALL.len(), 7);
    }
}
