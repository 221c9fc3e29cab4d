pub mod types;

pub use types::{AuthorType, Commit, PullRequest, PullRequestDetails, UNKNOWN_AUTHOR};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Invalid repository: {0} (expected owner/repo or https://github.com/owner/repo)")]
    Invalid(String),
}

/// The GitHub repository whose pull requests are harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a repository given either as `owner/repo` or as a GitHub URL
/// (`https://github.com/owner/repo`, optionally ending in `.git`).
pub fn parse_repository(input: &str) -> Result<Repository, RepoError> {
    let invalid = || RepoError::Invalid(input.to_string());
    let trimmed = input.trim();

    let segments: Vec<String> = if trimmed.contains("://") {
        let parsed = reqwest::Url::parse(trimmed).map_err(|_| invalid())?;
        if parsed.host_str() != Some("github.com") {
            return Err(invalid());
        }
        parsed
            .path_segments()
            .ok_or_else(invalid)?
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        trimmed.split('/').map(str::to_string).collect()
    };

    if segments.len() != 2 || segments.iter().any(|s| s.is_empty()) {
        return Err(invalid());
    }

    Ok(Repository {
        owner: segments[0].clone(),
        name: segments[1].trim_end_matches(".git").to_string(),
    })
}
