//! Maps REST and GraphQL response shapes onto the canonical model.
//!
//! Pure functions only. Missing optional fields become `None` or an empty
//! string; they never produce an error.

use tracing::warn;

use super::wire::{ActorNode, GitCommitNode, PullRequestNode, RestCommit, RestPullRequest};
use crate::pr::{AuthorType, Commit, PullRequest, PullRequestDetails};

/// Map a provider account type tag to an [`AuthorType`].
///
/// Both APIs use the same tags (`User`, `Organization`, `Bot`). Anything
/// else falls back to `User`; non-empty unknown tags are logged.
pub fn classify_author(tag: &str) -> AuthorType {
    match tag {
        "User" => AuthorType::User,
        "Organization" => AuthorType::Organization,
        "Bot" => AuthorType::Bot,
        "" => AuthorType::User,
        other => {
            warn!(typename = %other, "unknown author type, treating as user");
            AuthorType::User
        }
    }
}

/// Build a [`PullRequest`] from a REST pull request and its commit list.
pub fn from_rest(pull: &RestPullRequest, commits: &[RestCommit]) -> PullRequest {
    let (author, author_url, author_type) = match &pull.user {
        Some(user) => (
            user.login.clone().unwrap_or_default(),
            user.html_url.clone().unwrap_or_default(),
            classify_author(user.kind.as_deref().unwrap_or_default()),
        ),
        None => (String::new(), String::new(), AuthorType::User),
    };

    PullRequest {
        number: pull.number,
        title: pull.title.clone().unwrap_or_default(),
        body: pull.body.clone().unwrap_or_default(),
        url: pull.html_url.clone().unwrap_or_default(),
        merged_at: pull.merged_at,
        merge_commit: pull.merge_commit_sha.clone(),
        author,
        author_url,
        author_type,
        // Entries without a git commit payload carry nothing usable.
        commits: commits.iter().filter_map(rest_commit).collect(),
    }
}

/// Validation view of a REST pull request. A `mergeable` GitHub has not
/// computed yet counts as not mergeable.
pub fn details_from_rest(pull: &RestPullRequest) -> PullRequestDetails {
    PullRequestDetails {
        number: pull.number,
        state: pull.state.clone().unwrap_or_default(),
        mergeable: pull.mergeable.unwrap_or(false),
    }
}

fn rest_commit(entry: &RestCommit) -> Option<Commit> {
    let detail = entry.commit.as_ref()?;
    let author = detail.author.as_ref();

    Some(Commit {
        sha: entry.sha.clone().unwrap_or_default(),
        message: detail.message.as_deref().unwrap_or_default().trim().to_string(),
        author: author.and_then(|a| a.name.clone()).unwrap_or_default(),
        email: author.and_then(|a| a.email.clone()).unwrap_or_default(),
        date: author.and_then(|a| a.date),
        parents: entry
            .parents
            .iter()
            .flatten()
            .filter_map(|p| p.sha.clone())
            .collect(),
    })
}

/// Build a [`PullRequest`] from one node of the bulk GraphQL query.
///
/// When the node has no author the author fields are left empty; deciding
/// whether to look the author up elsewhere is the caller's job.
pub fn from_graphql(node: &PullRequestNode) -> PullRequest {
    let (author, author_url, author_type) = match &node.author {
        Some(actor) => graphql_author(actor),
        None => (String::new(), String::new(), AuthorType::User),
    };

    PullRequest {
        number: node.number,
        title: node.title.clone(),
        body: node.body.clone(),
        url: node.url.clone(),
        merged_at: node.merged_at,
        merge_commit: node.merge_commit.as_ref().map(|c| c.oid.clone()),
        author,
        author_url,
        author_type,
        commits: node
            .commits
            .iter()
            .flat_map(|conn| conn.nodes.iter())
            .map(|n| graphql_commit(&n.commit))
            .collect(),
    }
}

fn graphql_author(actor: &ActorNode) -> (String, String, AuthorType) {
    (
        actor.login.clone(),
        actor.url.clone(),
        classify_author(&actor.typename),
    )
}

fn graphql_commit(commit: &GitCommitNode) -> Commit {
    let author = commit.author.as_ref();
    Commit {
        sha: commit.oid.clone(),
        message: commit.message.trim().to_string(),
        author: author.and_then(|a| a.name.clone()).unwrap_or_default(),
        email: author.and_then(|a| a.email.clone()).unwrap_or_default(),
        date: commit.authored_date,
        parents: commit
            .parents
            .iter()
            .flat_map(|conn| conn.nodes.iter())
            .map(|p| p.oid.clone())
            .collect(),
    }
}
