pub mod normalize;
#[cfg(test)]
pub(crate) mod test_support;
pub mod wire;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use reqwest::{RequestBuilder, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::pr::{PullRequest, PullRequestDetails, Repository};
use wire::{
    ErrorBody, GraphQlResponse, PullRequestConnection, PullRequestsData, RestCommit,
    RestPullRequest, SearchIssue, SearchResponse,
};

/// Page size for REST search and commit listing (the API maximum).
pub const REST_PAGE_SIZE: u32 = 100;

/// Pull requests requested per bulk GraphQL page. Each carries up to 100
/// commits, so this stays well inside GitHub's node limit.
pub const BULK_PAGE_SIZE: u32 = 50;

const BULK_QUERY: &str = r#"
query($owner: String!, $repo: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $repo) {
    pullRequests(first: $first, after: $after, states: MERGED, orderBy: {field: UPDATED_AT, direction: DESC}) {
      pageInfo { hasNextPage endCursor }
      nodes {
        number
        title
        body
        url
        mergedAt
        mergeCommit { oid }
        author { __typename login url }
        commits(first: 100) {
          nodes {
            commit {
              oid
              message
              authoredDate
              author { name email }
              parents(first: 100) { nodes { oid } }
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("GraphQL response did not include the repository")]
    MissingRepository,

    /// The worker pool's semaphore was closed while a fetch waited for a
    /// permit. `fetch_batch` never closes its own gate, but `acquire` can
    /// fail, so that failure is reported per number instead of panicking.
    #[error("Concurrency gate closed before the fetch could start")]
    GateClosed,
}

/// Anything that can produce one fully normalized pull request (metadata
/// plus commits) by number. The worker pool and the bulk paginator's author
/// fallback both go through this.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn fetch_pull_request(&self, number: u64) -> Result<PullRequest, FetchError>;
}

/// One page of issue search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub items: Vec<SearchIssue>,
    /// Page number GitHub advertised as `rel="next"`, if any
    pub next_page: Option<u32>,
}

/// REST + GraphQL client bound to a single repository.
///
/// Credentials and the request timeout are fixed at construction and reused
/// for every call.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    graphql_url: String,
    token: Option<String>,
    repo: Repository,
}

impl GitHubClient {
    pub fn new(config: &Config, repo: Repository) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url(),
            graphql_url: config.graphql_url(),
            token: config.github_token(),
            repo,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn rest_get(&self, path: &str) -> RequestBuilder {
        let request = self
            .http
            .get(format!("{}{}", self.api_url, path))
            .header(ACCEPT, "application/vnd.github+json");
        self.authorize(request)
    }

    /// GET /repos/{owner}/{repo}/pulls/{number}
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn get_pull(&self, number: u64) -> Result<RestPullRequest, FetchError> {
        let path = format!("/repos/{}/{}/pulls/{}", self.repo.owner, self.repo.name, number);
        let response = check_status(self.rest_get(&path).send().await?).await?;
        let pull = response.json::<RestPullRequest>().await?;
        debug!(title = pull.title.as_deref().unwrap_or_default(), "received PR metadata");
        Ok(pull)
    }

    /// State and mergeability of one pull request, from the detail endpoint
    /// alone. No commits are fetched.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn validation_details(&self, number: u64) -> Result<PullRequestDetails, FetchError> {
        let pull = self.get_pull(number).await?;
        Ok(normalize::details_from_rest(&pull))
    }

    /// GET /repos/{owner}/{repo}/pulls/{number}/commits
    ///
    /// Only the first page is read; GitHub caps this listing at 250 commits
    /// regardless.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn list_commits(&self, number: u64) -> Result<Vec<RestCommit>, FetchError> {
        let path = format!(
            "/repos/{}/{}/pulls/{}/commits",
            self.repo.owner, self.repo.name, number
        );
        let request = self
            .rest_get(&path)
            .query(&[("per_page", REST_PAGE_SIZE)]);
        let response = check_status(request.send().await?).await?;
        let commits = response.json::<Vec<RestCommit>>().await?;
        debug!(commits = commits.len(), "received PR commits");
        Ok(commits)
    }

    /// GET /search/issues, newest-created first.
    #[instrument(skip(self))]
    pub async fn search_issues(&self, query: &str, page: u32) -> Result<SearchPage, FetchError> {
        let request = self.rest_get("/search/issues").query(&[
            ("q", query.to_string()),
            ("sort", "created".to_string()),
            ("order", "desc".to_string()),
            ("per_page", REST_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ]);
        let response = check_status(request.send().await?).await?;
        let next_page = next_page(response.headers());
        let body = response.json::<SearchResponse>().await?;
        debug!(hits = body.items.len(), ?next_page, "received search page");

        Ok(SearchPage {
            items: body.items,
            next_page,
        })
    }

    /// Run the bulk pull request query for the page after `after`.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn query_pull_requests(
        &self,
        after: Option<&str>,
    ) -> Result<PullRequestConnection, FetchError> {
        let payload = json!({
            "query": BULK_QUERY,
            "variables": {
                "owner": self.repo.owner,
                "repo": self.repo.name,
                "first": BULK_PAGE_SIZE,
                "after": after,
            },
        });

        let request = self.authorize(self.http.post(&self.graphql_url).json(&payload));
        let response = check_status(request.send().await?).await?;
        let body = response.json::<GraphQlResponse<PullRequestsData>>().await?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(FetchError::GraphQl(messages.join("; ")));
        }

        let repository = body
            .data
            .and_then(|data| data.repository)
            .ok_or(FetchError::MissingRepository)?;
        Ok(repository.pull_requests)
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn fetch_pull_request(&self, number: u64) -> Result<PullRequest, FetchError> {
        let pull = self.get_pull(number).await?;
        let commits = self.list_commits(number).await?;
        Ok(normalize::from_rest(&pull, &commits))
    }
}

/// Turn a non-2xx response into [`FetchError::Status`], keeping GitHub's
/// `message` field when the body has one.
async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.message,
        Err(_) => text,
    };
    Err(FetchError::Status { status, message })
}

/// Extract the `page` parameter of the `rel="next"` entry of a Link header.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim().trim_start_matches('<').trim_end_matches('>');
        if !parts.any(|param| param.trim() == r#"rel="next""#) {
            return None;
        }
        let url = reqwest::Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}
