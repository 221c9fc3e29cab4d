//! Response shapes of the GitHub REST and GraphQL APIs, limited to the
//! fields the harvester reads. Anything GitHub may omit is an `Option` so
//! that a missing field never fails deserialization.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::Deserialize;

// REST: GET /repos/{owner}/{repo}/pulls/{number}

#[derive(Debug, Clone, Deserialize)]
pub struct RestPullRequest {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub html_url: Option<String>,
    pub merged_at: Option<DateTime<Utc>>,
    pub merge_commit_sha: Option<String>,
    pub user: Option<RestUser>,
    /// `open` or `closed`
    pub state: Option<String>,
    /// Null until GitHub has computed mergeability
    pub mergeable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestUser {
    pub login: Option<String>,
    pub html_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// REST: GET /repos/{owner}/{repo}/pulls/{number}/commits

#[derive(Debug, Clone, Deserialize)]
pub struct RestCommit {
    pub sha: Option<String>,
    pub commit: Option<RestCommitDetail>,
    pub parents: Option<Vec<RestParent>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestCommitDetail {
    pub message: Option<String>,
    pub author: Option<RestGitActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestGitActor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestParent {
    pub sha: Option<String>,
}

// REST: GET /search/issues

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchIssue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssue {
    pub number: u64,
    /// Present only when the hit is a pull request rather than an issue
    pub pull_request: Option<IgnoredAny>,
}

impl SearchIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

// GraphQL

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestsData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub pull_requests: PullRequestConnection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestConnection {
    #[serde(default)]
    pub nodes: Vec<PullRequestNode>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub merge_commit: Option<OidNode>,
    /// Null for some account states (deleted users, ghost accounts)
    pub author: Option<ActorNode>,
    pub commits: Option<CommitConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorNode {
    #[serde(rename = "__typename", default)]
    pub typename: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitConnection {
    #[serde(default)]
    pub nodes: Vec<PullRequestCommitNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestCommitNode {
    pub commit: GitCommitNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitNode {
    pub oid: String,
    #[serde(default)]
    pub message: String,
    pub authored_date: Option<DateTime<Utc>>,
    pub author: Option<GitActorNode>,
    pub parents: Option<ParentConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitActorNode {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParentConnection {
    #[serde(default)]
    pub nodes: Vec<OidNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OidNode {
    pub oid: String,
}
