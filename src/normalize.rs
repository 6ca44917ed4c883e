//! Normalization of raw provider responses into section outcomes
//!
//! Each resource kind has one entry point taking the provider's
//! [`FetchResult`] and returning a [`SectionOutcome`]. Upstream quirks
//! (missing optional fields, "still computing" statuses, empty collections,
//! pull requests mixed into issues) are absorbed here so the rest of the
//! crate only sees the stable shapes from [`crate::data`].

use crate::data::{
    CommitEntry, CommitFrequencyBucket, Contributor, IssueSummary, LanguageShare, OwnerInfo,
    RepoDetails, ReleaseSummary,
};
use crate::error::{Error, ProviderError};
use crate::metrics;
use crate::outcome::SectionOutcome;
use crate::provider::{FetchResult, RawResponse, STATUS_ACCEPTED, STATUS_NO_CONTENT};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const CONTRIBUTORS_PENDING_MESSAGE: &str =
    "Contributor data is still being calculated by GitHub. Please try again shortly.";
pub const FREQUENCY_PENDING_MESSAGE: &str =
    "Commit frequency data is still being calculated by GitHub. Please try again in a moment.";

const UNKNOWN_AUTHOR: &str = "Unknown author";
const STATUS_NOT_FOUND: u16 = 404;
const STATUS_CONFLICT: u16 = 409;

// Raw upstream shapes

#[derive(Debug, Deserialize)]
struct RawRepo {
    name: String,
    description: Option<String>,
    stargazers_count: u64,
    forks_count: u64,
    open_issues_count: u64,
    language: Option<String>,
    owner: Option<RawAccount>,
    created_at: Option<DateTime<Utc>>,
    pushed_at: Option<DateTime<Utc>>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    login: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCommitItem {
    sha: String,
    commit: RawCommitData,
    author: Option<RawAccount>,
}

#[derive(Debug, Deserialize)]
struct RawCommitData {
    message: Option<String>,
    author: Option<RawGitSignature>,
    committer: Option<RawGitSignature>,
}

#[derive(Debug, Deserialize)]
struct RawGitSignature {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawContributor {
    login: Option<String>,
    avatar_url: Option<String>,
    html_url: Option<String>,
    contributions: u64,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    html_url: String,
    user: Option<RawAccount>,
    created_at: Option<DateTime<Utc>>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawRelease {
    name: Option<String>,
    tag_name: String,
    published_at: Option<DateTime<Utc>>,
    html_url: String,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWeek {
    week: i64,
    total: u64,
}

fn decode<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, String> {
    serde_json::from_value(body).map_err(|e| Error::ResponseError(e.to_string()).to_string())
}

fn failure<T>(err: ProviderError) -> SectionOutcome<T> {
    SectionOutcome::Error(err.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Normalize repository metadata
pub fn details(result: FetchResult) -> SectionOutcome<RepoDetails> {
    match result {
        Ok(response) => details_from(response).unwrap_or_else(SectionOutcome::Error),
        Err(ProviderError::Status {
            status: STATUS_NOT_FOUND,
            ..
        }) => SectionOutcome::error("Repository not found."),
        Err(err) => failure(err),
    }
}

fn details_from(response: RawResponse) -> Result<SectionOutcome<RepoDetails>, String> {
    let raw: RawRepo = decode(response.body)?;

    let owner = raw
        .owner
        .and_then(|o| Some(OwnerInfo {
            login: o.login?,
            profile_url: o.html_url?,
        }))
        .ok_or_else(|| {
            Error::ResponseError("repository owner is missing".to_string()).to_string()
        })?;

    Ok(SectionOutcome::Ok(RepoDetails {
        name: raw.name,
        description: non_blank(raw.description),
        stars: raw.stargazers_count,
        forks: raw.forks_count,
        open_issues: raw.open_issues_count,
        language: non_blank(raw.language),
        owner,
        created_at: raw.created_at,
        last_push: raw.pushed_at,
        url: raw.html_url,
    }))
}

/// Normalize the recent commit list
pub fn commits(result: FetchResult) -> SectionOutcome<Vec<CommitEntry>> {
    match result {
        Ok(response) if response.status == STATUS_NO_CONTENT => SectionOutcome::Empty,
        Ok(response) => commits_from(response).unwrap_or_else(SectionOutcome::Error),
        // Upstream answers 409 for a repository without any commits
        Err(ProviderError::Status {
            status: STATUS_CONFLICT,
            ..
        }) => SectionOutcome::Empty,
        Err(err) => failure(err),
    }
}

fn commits_from(response: RawResponse) -> Result<SectionOutcome<Vec<CommitEntry>>, String> {
    let items: Vec<RawCommitItem> = decode(response.body)?;

    let entries = items
        .into_iter()
        .map(|item| -> Result<CommitEntry, String> {
            metrics::validate_sha(&item.sha)?;

            let signature = item.commit.author.or(item.commit.committer);
            let (author_name, date) = match signature {
                Some(sig) => (non_blank(sig.name), sig.date),
                None => (None, None),
            };
            let date = date.ok_or_else(|| {
                Error::ResponseError(format!("commit {} has no date", item.sha)).to_string()
            })?;

            Ok(CommitEntry {
                message: metrics::first_line(item.commit.message.as_deref().unwrap_or(""))
                    .to_string(),
                author_name: author_name.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                author_profile_url: item.author.and_then(|a| a.html_url),
                date,
                sha: item.sha,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(SectionOutcome::from_items(entries))
}

/// Normalize the contributor list, preserving upstream order
pub fn contributors(result: FetchResult) -> SectionOutcome<Vec<Contributor>> {
    match result {
        Ok(response) if response.status == STATUS_ACCEPTED => {
            SectionOutcome::pending(CONTRIBUTORS_PENDING_MESSAGE)
        }
        Ok(response) if response.status == STATUS_NO_CONTENT => SectionOutcome::Empty,
        Ok(response) => contributors_from(response).unwrap_or_else(SectionOutcome::Error),
        Err(err) => failure(err),
    }
}

fn contributors_from(response: RawResponse) -> Result<SectionOutcome<Vec<Contributor>>, String> {
    let items: Vec<RawContributor> = decode(response.body)?;

    let contributors = items
        .into_iter()
        .map(|c| Contributor {
            login: c.login.unwrap_or_default(),
            avatar_url: c.avatar_url.unwrap_or_default(),
            profile_url: c.html_url.unwrap_or_default(),
            contributions: c.contributions,
        })
        .collect();

    Ok(SectionOutcome::from_items(contributors))
}

/// Normalize the language byte map into percentage shares
pub fn languages(result: FetchResult) -> SectionOutcome<Vec<LanguageShare>> {
    match result {
        Ok(response) if response.status == STATUS_NO_CONTENT => SectionOutcome::Empty,
        Ok(response) => languages_from(response).unwrap_or_else(SectionOutcome::Error),
        Err(ProviderError::Status {
            status: STATUS_NOT_FOUND,
            ..
        }) => SectionOutcome::Empty,
        Err(err) => failure(err),
    }
}

fn languages_from(response: RawResponse) -> Result<SectionOutcome<Vec<LanguageShare>>, String> {
    let map = response.body.as_object().ok_or_else(|| {
        Error::ResponseError("language breakdown is not an object".to_string()).to_string()
    })?;

    let entries = map
        .iter()
        .map(|(language, bytes)| {
            bytes
                .as_u64()
                .map(|b| (language.clone(), b))
                .ok_or_else(|| {
                    Error::ResponseError(format!("byte count for {} is not a number", language))
                        .to_string()
                })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(match metrics::language_shares(&entries) {
        Some(shares) => SectionOutcome::Ok(shares),
        None => SectionOutcome::Empty,
    })
}

/// Normalize open issues, dropping pull requests
pub fn issues(result: FetchResult) -> SectionOutcome<Vec<IssueSummary>> {
    match result {
        Ok(response) if response.status == STATUS_NO_CONTENT => SectionOutcome::Empty,
        Ok(response) => issues_from(response).unwrap_or_else(SectionOutcome::Error),
        Err(ProviderError::Status {
            status: STATUS_NOT_FOUND,
            ..
        }) => SectionOutcome::error(
            "Issues not found (repository might be private or issues disabled).",
        ),
        Err(err) => failure(err),
    }
}

fn issues_from(response: RawResponse) -> Result<SectionOutcome<Vec<IssueSummary>>, String> {
    let items: Vec<RawIssue> = decode(response.body)?;

    let issues = items
        .into_iter()
        .filter(|issue| issue.pull_request.is_none())
        .map(|issue| IssueSummary {
            number: issue.number,
            title: issue.title,
            author: issue.user.and_then(|u| u.login).unwrap_or_default(),
            created_at: issue.created_at,
            url: issue.html_url,
        })
        .collect();

    Ok(SectionOutcome::from_items(issues))
}

/// Normalize the latest release
pub fn release(result: FetchResult) -> SectionOutcome<ReleaseSummary> {
    match result {
        Ok(response) if response.status == STATUS_NO_CONTENT => SectionOutcome::Empty,
        Ok(response) => release_from(response).unwrap_or_else(SectionOutcome::Error),
        // Upstream answers 404 when nothing has been released
        Err(ProviderError::Status {
            status: STATUS_NOT_FOUND,
            ..
        }) => SectionOutcome::Empty,
        Err(err) => failure(err),
    }
}

fn release_from(response: RawResponse) -> Result<SectionOutcome<ReleaseSummary>, String> {
    let raw: RawRelease = decode(response.body)?;

    Ok(SectionOutcome::Ok(ReleaseSummary {
        name: non_blank(raw.name),
        tag_name: raw.tag_name,
        published_at: raw.published_at,
        url: raw.html_url,
        body: raw.body.unwrap_or_default(),
    }))
}

/// Normalize the weekly commit activity series
pub fn frequency(result: FetchResult) -> SectionOutcome<Vec<CommitFrequencyBucket>> {
    match result {
        Ok(response) if response.status == STATUS_ACCEPTED => {
            SectionOutcome::pending(FREQUENCY_PENDING_MESSAGE)
        }
        Ok(response) if response.status == STATUS_NO_CONTENT => SectionOutcome::Empty,
        Ok(response) => frequency_from(response).unwrap_or_else(SectionOutcome::Error),
        Err(ProviderError::Status {
            status: STATUS_NOT_FOUND,
            ..
        }) => SectionOutcome::error("Commit activity stats not found."),
        Err(err) => failure(err),
    }
}

fn frequency_from(
    response: RawResponse,
) -> Result<SectionOutcome<Vec<CommitFrequencyBucket>>, String> {
    let weeks: Vec<RawWeek> = decode(response.body)?;

    let buckets = weeks
        .into_iter()
        .map(|w| CommitFrequencyBucket {
            week_start: w.week,
            total_commits: w.total,
        })
        .collect();

    Ok(SectionOutcome::from_items(metrics::recent_weeks(buckets)))
}
