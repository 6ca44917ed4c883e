//! Backend proxy provider
//!
//! Talks to an intermediary service exposing `POST /analyze` with body
//! `{owner, repo}`. The service answers with every section at once:
//!
//! ```text
//! {repo_details, commit_activity, contributor_stats, languages,
//!  open_issues_list, latest_release, commit_frequency}
//! ```
//!
//! A top-level `{error}` is a total failure. Inside a section, `{error}`
//! marks that section as failed and `{message}` marks it as pending or empty.
//! Section payloads use the proxy's simplified field names and are translated
//! back into upstream shapes so the regular normalizers apply.

use crate::data::ResourceKind;
use crate::error::{Error, ProviderError, Result};
use crate::identifier::{RepositoryIdentifier, DEFAULT_HOST};
use crate::provider::{
    FetchResult, RawResponse, ResourceProvider, STATUS_ACCEPTED, STATUS_NO_CONTENT,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    owner: &'a str,
    repo: &'a str,
}

/// Proxy response held for the analysis in flight
#[derive(Debug)]
struct Loaded {
    id: RepositoryIdentifier,
    body: Value,
}

/// Resource provider backed by an `/analyze` proxy
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
    host: String,
    loaded: RwLock<Option<Loaded>>,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        url::Url::parse(base_url)?;

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base_url: base_url.to_string(),
            host: DEFAULT_HOST.to_string(),
            loaded: RwLock::new(None),
        })
    }

    /// Platform host used to build owner profile URLs
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    fn section_key(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::Details => "repo_details",
            ResourceKind::Commits => "commit_activity",
            ResourceKind::Contributors => "contributor_stats",
            ResourceKind::Languages => "languages",
            ResourceKind::Issues => "open_issues_list",
            ResourceKind::Release => "latest_release",
            ResourceKind::Frequency => "commit_frequency",
        }
    }
}

#[async_trait]
impl ResourceProvider for ProxyClient {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn prepare(&self, id: &RepositoryIdentifier) -> Result<()> {
        // Drop any response left over from a previous analysis first
        *self.loaded.write().await = None;

        let url = format!("{}/analyze", self.base_url);
        info!("Requesting analysis of {} from {}", id, url);

        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest {
                owner: id.owner(),
                repo: id.name(),
            })
            .send()
            .await
            .map_err(|e| Error::UnreachableError(e.to_string()))?;

        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            Error::ResponseError(format!("proxy returned non-JSON body ({})", e))
        })?;

        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(Error::ProxyError(error.to_string()));
        }
        if !status.is_success() {
            return Err(Error::UpstreamError {
                status: status.as_u16(),
                message: None,
            });
        }

        *self.loaded.write().await = Some(Loaded {
            id: id.clone(),
            body,
        });
        Ok(())
    }

    async fn fetch(&self, id: &RepositoryIdentifier, kind: ResourceKind) -> FetchResult {
        let guard = self.loaded.read().await;
        let loaded = guard
            .as_ref()
            .filter(|l| &l.id == id)
            .ok_or_else(|| ProviderError::Transport("no proxy response loaded".to_string()))?;

        let key = Self::section_key(kind);
        let section = loaded.body.get(key).ok_or_else(|| {
            ProviderError::Remote(format!("section '{}' is not provided by the proxy", key))
        })?;
        debug!("Serving {} for {} from proxy section {}", kind, id, key);

        translate_section(kind, section, id, &self.host)
    }
}

fn field(value: &Value, name: &str) -> Value {
    value.get(name).cloned().unwrap_or(Value::Null)
}

fn map_items(section: &Value, f: impl Fn(&Value) -> Value) -> Value {
    match section.as_array() {
        Some(items) => Value::Array(items.iter().map(f).collect()),
        None => section.clone(),
    }
}

/// Convert one proxy section into the upstream-shaped response it stands for
fn translate_section(
    kind: ResourceKind,
    section: &Value,
    id: &RepositoryIdentifier,
    host: &str,
) -> FetchResult {
    if let Some(error) = section.get("error").and_then(Value::as_str) {
        return Err(ProviderError::Remote(error.to_string()));
    }

    if let Some(message) = section.get("message").and_then(Value::as_str) {
        let computing = message.contains("being calculated");
        let status = match kind {
            ResourceKind::Contributors | ResourceKind::Frequency if computing => STATUS_ACCEPTED,
            _ => STATUS_NO_CONTENT,
        };
        return Ok(RawResponse::with_status(status, Value::Null));
    }

    let body = match kind {
        ResourceKind::Details => {
            let owner = match section.get("owner") {
                Some(owner) if owner.is_object() => owner.clone(),
                _ => json!({
                    "login": id.owner(),
                    "html_url": format!("https://{}/{}", host, id.owner()),
                }),
            };
            json!({
                "name": field(section, "name"),
                "description": field(section, "description"),
                "stargazers_count": field(section, "stars"),
                "forks_count": field(section, "forks"),
                "open_issues_count": field(section, "open_issues"),
                "language": field(section, "language"),
                "owner": owner,
                "created_at": field(section, "created_at"),
                "pushed_at": field(section, "last_push"),
                "html_url": field(section, "url"),
            })
        }
        ResourceKind::Commits => map_items(section, |c| {
            json!({
                "sha": field(c, "sha"),
                "commit": {
                    "message": field(c, "message"),
                    "author": {"name": field(c, "author"), "date": field(c, "date")},
                },
                "author": null,
            })
        }),
        ResourceKind::Contributors => map_items(section, |c| {
            json!({
                "login": field(c, "login"),
                "avatar_url": field(c, "avatar_url"),
                "html_url": field(c, "profile_url"),
                "contributions": field(c, "contributions"),
            })
        }),
        ResourceKind::Languages => section.clone(),
        ResourceKind::Issues => map_items(section, |i| {
            json!({
                "number": field(i, "number"),
                "title": field(i, "title"),
                "html_url": field(i, "url"),
                "user": {"login": field(i, "user")},
                "created_at": field(i, "created_at"),
            })
        }),
        ResourceKind::Release => json!({
            "name": field(section, "name"),
            "tag_name": field(section, "tag_name"),
            "published_at": field(section, "published_at"),
            "html_url": field(section, "url"),
            "body": field(section, "body"),
        }),
        ResourceKind::Frequency => map_items(section, |w| {
            json!({
                "week": field(w, "week_start_timestamp"),
                "total": field(w, "total_commits"),
            })
        }),
    };

    Ok(RawResponse::ok(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use crate::outcome::SectionOutcome;
    use mockito::Matcher;

    fn hello_world() -> RepositoryIdentifier {
        RepositoryIdentifier::new("octocat", "Hello-World").unwrap()
    }

    fn proxy_body() -> Value {
        json!({
            "repo_details": {
                "name": "Hello-World",
                "description": null,
                "stars": 80,
                "forks": 9,
                "open_issues": 0,
                "language": "Rust",
                "created_at": "2011-01-26T19:01:12Z",
                "last_push": "2011-01-26T19:06:43Z",
                "url": "https://github.com/octocat/Hello-World"
            },
            "commit_activity": [
                {"sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e", "message": "Fix\n\nbody",
                 "author": "Mona", "date": "2011-04-14T16:00:49Z"}
            ],
            "contributor_stats": {"message": "Contributor data is being calculated by GitHub. Please try again shortly."},
            "languages": {"message": "Language data not available."},
            "open_issues_list": {"error": "HTTP error fetching open issues: 500 - boom"},
            "latest_release": {"message": "No releases found for this repository."},
            "commit_frequency": [{"week_start_timestamp": 1336280400, "total_commits": 89}]
        })
    }

    #[test]
    fn test_translate_details_fills_owner() {
        let id = hello_world();
        let body = proxy_body();
        let raw = translate_section(ResourceKind::Details, &body["repo_details"], &id, "github.com");
        match normalize::details(raw) {
            SectionOutcome::Ok(details) => {
                assert_eq!(details.stars, 80);
                assert_eq!(details.owner.login, "octocat");
                assert_eq!(details.owner.profile_url, "https://github.com/octocat");
                assert_eq!(details.description, None);
            }
            other => panic!("expected ok, got {:?}", other),
        }
    }

    #[test]
    fn test_translate_degraded_sections() {
        let id = hello_world();
        let body = proxy_body();

        let contributors =
            translate_section(ResourceKind::Contributors, &body["contributor_stats"], &id, "github.com");
        assert!(matches!(normalize::contributors(contributors), SectionOutcome::Pending(_)));

        let languages = translate_section(ResourceKind::Languages, &body["languages"], &id, "github.com");
        assert_eq!(normalize::languages(languages), SectionOutcome::Empty);

        let issues = translate_section(ResourceKind::Issues, &body["open_issues_list"], &id, "github.com");
        assert_eq!(
            normalize::issues(issues),
            SectionOutcome::Error("HTTP error fetching open issues: 500 - boom".to_string())
        );

        let release = translate_section(ResourceKind::Release, &body["latest_release"], &id, "github.com");
        assert_eq!(normalize::release(release), SectionOutcome::Empty);
    }

    #[test]
    fn test_translate_frequency_messages() {
        let id = hello_world();

        let computing = json!({"message": "Commit frequency data is being calculated by GitHub."});
        let raw = translate_section(ResourceKind::Frequency, &computing, &id, "github.com");
        assert!(matches!(normalize::frequency(raw), SectionOutcome::Pending(_)));

        // Only "being calculated" means pending; any other message is an empty section
        let unavailable =
            json!({"message": "No commit activity data available (stats may still be being computed)."});
        let raw = translate_section(ResourceKind::Frequency, &unavailable, &id, "github.com");
        assert_eq!(normalize::frequency(raw), SectionOutcome::Empty);
    }

    #[test]
    fn test_translate_lists() {
        let id = hello_world();
        let body = proxy_body();

        let commits = translate_section(ResourceKind::Commits, &body["commit_activity"], &id, "github.com");
        let commits = normalize::commits(commits);
        let commits = commits.as_ok().unwrap();
        assert_eq!(commits[0].message, "Fix");
        assert_eq!(commits[0].author_name, "Mona");
        assert_eq!(commits[0].author_profile_url, None);

        let weeks = translate_section(ResourceKind::Frequency, &body["commit_frequency"], &id, "github.com");
        let weeks = normalize::frequency(weeks);
        assert_eq!(weeks.as_ok().unwrap()[0].total_commits, 89);
    }

    #[tokio::test]
    async fn test_prepare_and_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analyze")
            .match_body(Matcher::Json(json!({"owner": "octocat", "repo": "Hello-World"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(proxy_body().to_string())
            .create_async()
            .await;

        let proxy = ProxyClient::new(&server.url()).unwrap();
        let id = hello_world();
        proxy.prepare(&id).await.unwrap();

        let details = proxy.fetch(&id, ResourceKind::Details).await.unwrap();
        assert_eq!(details.body["stargazers_count"], json!(80));
        mock.assert_async().await;

        let other = RepositoryIdentifier::new("someone", "else").unwrap();
        assert!(proxy.fetch(&other, ResourceKind::Details).await.is_err());
    }

    #[tokio::test]
    async fn test_prepare_top_level_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Repository not found."}"#)
            .create_async()
            .await;

        let proxy = ProxyClient::new(&server.url()).unwrap();
        let err = proxy.prepare(&hello_world()).await.unwrap_err();
        assert_eq!(err.to_string(), "Proxy error: Repository not found.");
    }

    #[tokio::test]
    async fn test_missing_section_is_unsupported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze")
            .with_status(200)
            .with_body(r#"{"repo_details": {"name": "x"}}"#)
            .create_async()
            .await;

        let proxy = ProxyClient::new(&server.url()).unwrap();
        let id = hello_world();
        proxy.prepare(&id).await.unwrap();

        let err = proxy.fetch(&id, ResourceKind::Frequency).await.unwrap_err();
        assert!(matches!(err, ProviderError::Remote(_)));
    }

    #[test]
    fn test_new_rejects_invalid_base() {
        assert!(ProxyClient::new("not a url").is_err());
    }
}
