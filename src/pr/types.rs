use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login recorded when neither the bulk query nor the REST fallback
/// could tell us who opened a pull request.
pub const UNKNOWN_AUTHOR: &str = "[unknown]";

/// A merged (or in-flight) pull request, normalized from either the REST
/// or the GraphQL API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number (e.g., 42), unique within the repository
    pub number: u64,
    pub title: String,
    pub body: String,
    /// HTML URL of the PR
    pub url: String,
    /// When the PR was merged; None while unmerged
    pub merged_at: Option<DateTime<Utc>>,
    /// SHA of the merge commit, if GitHub reported one
    pub merge_commit: Option<String>,
    /// Author's GitHub login
    pub author: String,
    /// Author's profile URL
    pub author_url: String,
    pub author_type: AuthorType,
    /// Commits in the order the API returned them
    pub commits: Vec<Commit>,
}

impl PullRequest {
    /// Number of merge commits (commits with more than one parent) in this PR.
    pub fn merge_commit_count(&self) -> usize {
        self.commits.iter().filter(|c| c.is_merge()).count()
    }
}

/// Lightweight state of a pull request, fetched without its commits to
/// decide whether it is worth harvesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDetails {
    pub number: u64,
    /// `open` or `closed` as reported by GitHub
    pub state: String,
    pub mergeable: bool,
}

/// Kind of account that opened a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorType {
    #[default]
    User,
    Organization,
    Bot,
}

impl std::fmt::Display for AuthorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorType::User => write!(f, "user"),
            AuthorType::Organization => write!(f, "organization"),
            AuthorType::Bot => write!(f, "bot"),
        }
    }
}

/// A single commit belonging to a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    /// Commit message, trimmed at both ends
    pub message: String,
    /// Author display name
    pub author: String,
    /// Author email; empty when the source did not supply one
    pub email: String,
    /// Authored timestamp
    pub date: Option<DateTime<Utc>>,
    /// Parent commit SHAs
    pub parents: Vec<String>,
}

impl Commit {
    /// A commit with more than one parent is a merge commit.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_with_parents(parents: &[&str]) -> Commit {
        Commit {
            sha: "abc123".to_string(),
            message: "Fix typo".to_string(),
            author: "Alice".to_string(),
            email: String::new(),
            date: None,
            parents: parents.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_is_merge() {
        assert!(!commit_with_parents(&["p1"]).is_merge());
        assert!(commit_with_parents(&["p1", "p2"]).is_merge());
    }

    #[test]
    fn test_author_type_default_and_display() {
        assert_eq!(AuthorType::default(), AuthorType::User);
        assert_eq!(AuthorType::Organization.to_string(), "organization");
        assert_eq!(AuthorType::Bot.to_string(), "bot");
    }

    #[test]
    fn test_author_type_serializes_lowercase() {
        let json = serde_json::to_string(&AuthorType::Bot).unwrap();
        assert_eq!(json, "\"bot\"");
    }

    #[test]
    fn test_merge_commit_count() {
        let pr = PullRequest {
            number: 7,
            title: "Merge main".to_string(),
            body: String::new(),
            url: String::new(),
            merged_at: None,
            merge_commit: None,
            author: "alice".to_string(),
            author_url: String::new(),
            author_type: AuthorType::User,
            commits: vec![commit_with_parents(&["a"]), commit_with_parents(&["a", "b"])],
        };
        assert_eq!(pr.merge_commit_count(), 1);
    }
}
