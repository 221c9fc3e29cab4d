use chrono::{DateTime, Utc};

/// Aggregate view of one harvest run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// `owner/repo`
    pub repository: String,
    /// How the PRs were gathered (e.g., "search", "graphql", "numbers")
    pub source: String,
    pub pull_requests: usize,
    pub commits: usize,
    /// Commits with more than one parent
    pub merge_commits: usize,
    pub authors: AuthorCounts,
    /// PRs whose author could not be determined
    pub unknown_authors: usize,
    pub newest_merge: Option<DateTime<Utc>>,
    pub oldest_merge: Option<DateTime<Utc>>,
    /// Error that left the harvest incomplete, if any
    pub error: Option<String>,
}

impl Summary {
    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }
}

/// Pull requests per author type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorCounts {
    pub users: usize,
    pub organizations: usize,
    pub bots: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_partial() {
        let mut summary = Summary {
            repository: "org/repo".to_string(),
            source: "graphql".to_string(),
            pull_requests: 0,
            commits: 0,
            merge_commits: 0,
            authors: AuthorCounts::default(),
            unknown_authors: 0,
            newest_merge: None,
            oldest_merge: None,
            error: None,
        };
        assert!(!summary.is_partial());
        summary.error = Some("GraphQL query failed".to_string());
        assert!(summary.is_partial());
    }
}
