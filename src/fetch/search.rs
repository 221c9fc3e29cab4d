//! Merged pull requests via the REST issue search.
//!
//! Search results are sorted by creation date, while the `since` bound
//! filters on merge date server-side. The two orders can diverge, so the
//! walk cannot stop early on a merge date: it always visits every page.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use super::{fetch_batch, Fetched};
use crate::github::{FetchError, GitHubClient};
use crate::pr::Repository;

/// Build the search predicate for merged PRs of `repo`, optionally merged
/// on or after the calendar day of `since`.
pub fn build_query(repo: &Repository, since: Option<DateTime<Utc>>) -> String {
    let mut query = format!("repo:{}/{} is:pr is:merged", repo.owner, repo.name);
    if let Some(since) = since {
        query.push_str(&format!(" merged:>={}", since.format("%Y-%m-%d")));
    }
    query
}

/// Collect every merged PR matching the search, fetching each PR's details
/// and commits through the worker pool.
///
/// Best effort: PRs that fail to fetch are logged and skipped. A failed
/// search page ends the walk and is returned with what was gathered.
#[instrument(skip(client), fields(repo = %client.repository()))]
pub async fn merged_since(client: &GitHubClient, since: Option<DateTime<Utc>>) -> Fetched<FetchError> {
    let query = build_query(client.repository(), since);
    let mut pull_requests = Vec::new();
    let mut page = 1;

    loop {
        let results = match client.search_issues(&query, page).await {
            Ok(results) => results,
            Err(e) => {
                warn!(page, error = %e, "search failed");
                return Fetched::partial(pull_requests, e);
            }
        };

        let numbers: Vec<u64> = results
            .items
            .iter()
            .filter(|item| item.is_pull_request())
            .map(|item| item.number)
            .collect();

        let batch = fetch_batch(client, &numbers).await;
        if let Some(error) = &batch.error {
            for (number, e) in &error.failures {
                warn!(pr = number, error = %e, "skipping pull request");
            }
        }

        info!(
            page,
            hits = results.items.len(),
            non_pr = results.items.len() - numbers.len(),
            fetched = batch.pull_requests.len(),
            "processed search page"
        );
        pull_requests.extend(batch.pull_requests);

        match results.next_page {
            Some(next) if next > page => page = next,
            _ => break,
        }
    }

    info!(total = pull_requests.len(), "search fetch complete");
    Fetched::complete(pull_requests)
}
