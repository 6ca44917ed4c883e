//! GitHub API integration

use crate::data::ResourceKind;
use crate::error::{Error, ProviderError, Result};
use crate::identifier::RepositoryIdentifier;
use crate::provider::{FetchResult, RawResponse, ResourceProvider, STATUS_ACCEPTED};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// GitHub client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API root, without trailing slash
    pub api_base: String,
    /// Personal access token
    pub token: Option<String>,
    pub user_agent: String,
    pub commits_per_page: u32,
    pub contributors_per_page: u32,
    pub issues_per_page: u32,
    /// Delay before retrying a 202 statistics response once; `None` disables the retry
    pub pending_retry: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            user_agent: "repo-insight".to_string(),
            commits_per_page: 5,
            contributors_per_page: 10,
            issues_per_page: 5,
            pending_retry: Some(Duration::from_secs(2)),
        }
    }
}

/// GitHub API client
pub struct GitHubClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| Error::ConfigError("Invalid user agent".to_string()))?,
        );

        if let Some(ref t) = config.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", t))
                    .map_err(|_| Error::ConfigError("Invalid token format".to_string()))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Check if we have authentication
    pub fn is_authenticated(&self) -> bool {
        self.config.token.is_some()
    }

    /// REST endpoint serving the given resource kind
    pub fn endpoint(&self, id: &RepositoryIdentifier, kind: ResourceKind) -> String {
        let repo = format!(
            "{}/repos/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            id.owner(),
            id.name()
        );

        match kind {
            ResourceKind::Details => repo,
            ResourceKind::Commits => {
                format!("{}/commits?per_page={}", repo, self.config.commits_per_page)
            }
            ResourceKind::Contributors => format!(
                "{}/contributors?per_page={}&anon=0",
                repo, self.config.contributors_per_page
            ),
            ResourceKind::Languages => format!("{}/languages", repo),
            ResourceKind::Issues => format!(
                "{}/issues?state=open&sort=created&direction=desc&per_page={}",
                repo, self.config.issues_per_page
            ),
            ResourceKind::Release => format!("{}/releases/latest", repo),
            ResourceKind::Frequency => format!("{}/stats/commit_activity", repo),
        }
    }

    async fn get(&self, url: &str) -> FetchResult {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if status.is_success() {
            // Non-JSON bodies are passed through and rejected by the normalizer
            let body = if text.trim().is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
            };
            return Ok(RawResponse::with_status(status.as_u16(), body));
        }

        if is_rate_limited(status, &headers) {
            let reset = header_str(&headers, RATE_LIMIT_RESET).and_then(|v| v.parse::<i64>().ok());
            warn!("GitHub rate limit hit for {} (reset: {:?})", url, reset);
            return Err(ProviderError::RateLimited { reset });
        }

        Err(ProviderError::Status {
            status: status.as_u16(),
            message: error_message(&text),
        })
    }
}

#[async_trait]
impl ResourceProvider for GitHubClient {
    fn name(&self) -> &str {
        "github"
    }

    async fn fetch(&self, id: &RepositoryIdentifier, kind: ResourceKind) -> FetchResult {
        let url = self.endpoint(id, kind);
        let response = self.get(&url).await?;

        let computed_upstream = matches!(kind, ResourceKind::Contributors | ResourceKind::Frequency);
        match self.config.pending_retry {
            Some(delay) if computed_upstream && response.status == STATUS_ACCEPTED => {
                debug!("{} for {} still computing, retrying in {:?}", kind, id, delay);
                tokio::time::sleep(delay).await;
                self.get(&url).await
            }
            _ => Ok(response),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && header_str(headers, RATE_LIMIT_REMAINING) == Some("0"))
}

/// Extract GitHub's `message` field, or the first 100 characters of a non-JSON body
fn error_message(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string()),
        Err(_) => Some(text.chars().take(100).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> GitHubClient {
        GitHubClient::new(ClientConfig {
            api_base: server.url(),
            pending_retry: None,
            ..Default::default()
        })
        .unwrap()
    }

    fn hello_world() -> RepositoryIdentifier {
        RepositoryIdentifier::new("octocat", "Hello-World").unwrap()
    }

    #[test]
    fn test_endpoints() {
        let client = GitHubClient::new(ClientConfig::default()).unwrap();
        let id = hello_world();
        assert_eq!(
            client.endpoint(&id, ResourceKind::Details),
            "https://api.github.com/repos/octocat/Hello-World"
        );
        assert_eq!(
            client.endpoint(&id, ResourceKind::Commits),
            "https://api.github.com/repos/octocat/Hello-World/commits?per_page=5"
        );
        assert_eq!(
            client.endpoint(&id, ResourceKind::Frequency),
            "https://api.github.com/repos/octocat/Hello-World/stats/commit_activity"
        );
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message": "Not Found"}"#),
            Some("Not Found".to_string())
        );
        assert_eq!(error_message("   "), None);
        assert_eq!(error_message("<html>oops</html>"), Some("<html>oops</html>".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octocat/Hello-World/languages")
            .match_header("accept", "application/vnd.github.v3+json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"C": 78769, "Python": 7769}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client
            .fetch(&hello_world(), ResourceKind::Languages)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"C": 78769, "Python": 7769}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/octocat/Hello-World/contributors")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .with_header("x-ratelimit-reset", "1704112215")
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch(&hello_world(), ResourceKind::Contributors)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::RateLimited {
                reset: Some(1_704_112_215)
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_too_many_requests() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/octocat/Hello-World/languages")
            .with_status(429)
            .with_header("x-ratelimit-reset", "1704112215")
            .with_body(r#"{"message": "You have exceeded a secondary rate limit"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch(&hello_world(), ResourceKind::Languages)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::RateLimited {
                reset: Some(1_704_112_215)
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_forbidden_without_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/octocat/Hello-World")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "42")
            .with_body(r#"{"message": "Resource not accessible"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch(&hello_world(), ResourceKind::Details)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::Status {
                status: 403,
                message: Some("Resource not accessible".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_pending_is_retried_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octocat/Hello-World/stats/commit_activity")
            .with_status(202)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;

        let client = GitHubClient::new(ClientConfig {
            api_base: server.url(),
            pending_retry: Some(Duration::from_millis(10)),
            ..Default::default()
        })
        .unwrap();

        let response = client
            .fetch(&hello_world(), ResourceKind::Frequency)
            .await
            .unwrap();

        assert_eq!(response.status, 202);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        let client = GitHubClient::new(ClientConfig {
            // Port 9 (discard) on localhost is not expected to accept HTTP
            api_base: "http://127.0.0.1:9".to_string(),
            pending_retry: None,
            ..Default::default()
        })
        .unwrap();

        let err = client
            .fetch(&hello_world(), ResourceKind::Details)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
