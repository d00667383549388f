//! REST client for the changed-file lookups.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Url};
use routing::{ChangeLookup, CommitRef, LookupError, PullRequestNumber, RepositoryRef};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{classify_failure, classify_transport, malformed_body, rate_limit_info, GitHubClientError};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

const MEDIA_TYPE: &str = "application/vnd.github+json";

/// Page size requested from the file-listing endpoints.
const FILES_PER_PAGE: usize = 100;

/// GitHub lists at most 3000 files per commit or pull request.
const MAX_FILE_PAGES: usize = 30;

/// Connection settings for [`GitHubClient`].
#[derive(Clone)]
pub struct GitHubClientConfig {
    /// Base URL of the REST API.
    pub api_url: String,
    /// Token sent as `Authorization: Bearer`. Anonymous requests are heavily
    /// rate limited but work for public repositories.
    pub token: Option<String>,
    /// Per-request timeout. Expiry surfaces as [`LookupError::Transport`].
    pub timeout: Duration,
    /// `User-Agent` header; GitHub rejects requests without one.
    pub user_agent: String,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            token: None,
            timeout: Duration::from_secs(10),
            user_agent: concat!("fanout/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl std::fmt::Debug for GitHubClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClientConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// [`ChangeLookup`] over the GitHub REST API.
///
/// Makes exactly one attempt per request; retrying is left to the webhook
/// sender's redelivery.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: Url,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    filename: String,
}

impl GitHubClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubClientError`] if the API URL is unusable or the HTTP
    /// client cannot be constructed.
    pub fn new(config: GitHubClientConfig) -> Result<Self, GitHubClientError> {
        let api_url = Url::parse(&config.api_url).map_err(|e| GitHubClientError::InvalidApiUrl {
            url: config.api_url.clone(),
            reason: e.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(GitHubClientError::InvalidApiUrl {
                url: config.api_url,
                reason: "URL cannot carry a path".into(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            api_url,
            token: config.token,
        })
    }

    /// Builds the URL `<api>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LookupError> {
        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "GitHub request failed");
            classify_transport(&e)
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| malformed_body(status, &e));
        }

        let rate_limit = rate_limit_info(response.headers());
        let body = response.text().await.unwrap_or_default();
        let err = classify_failure(status, rate_limit, &body);
        debug!(url = %url, status = status.as_u16(), error = %err, "GitHub request rejected");
        Err(err)
    }

    /// Walks `?per_page=&page=` until a short page or the file cap.
    async fn paged_files<T, F>(&self, base: Url, into_files: F) -> Result<Vec<String>, LookupError>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Vec<ChangedFile>,
    {
        let mut paths = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("per_page", &FILES_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let files = into_files(self.get_json(url).await?);
            let last_page = files.len() < FILES_PER_PAGE;
            paths.extend(files.into_iter().map(|f| f.filename));
            if last_page {
                break;
            }
        }
        Ok(paths)
    }
}

#[async_trait]
impl ChangeLookup for GitHubClient {
    #[instrument(skip_all, fields(repo = %repo, commit = %commit))]
    async fn commit_files(
        &self,
        repo: &RepositoryRef,
        commit: &CommitRef,
    ) -> Result<Vec<String>, LookupError> {
        let base = self.endpoint(&["repos", &repo.owner, &repo.name, "commits", commit.as_str()]);
        self.paged_files(base, |response: CommitResponse| response.files)
            .await
    }

    #[instrument(skip_all, fields(repo = %repo, number = %number))]
    async fn pull_request_files(
        &self,
        repo: &RepositoryRef,
        number: PullRequestNumber,
    ) -> Result<Vec<String>, LookupError> {
        let number_segment = number.to_string();
        let base = self.endpoint(&["repos", &repo.owner, &repo.name, "pulls", &number_segment, "files"]);
        self.paged_files(base, |files: Vec<ChangedFile>| files).await
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
