//! Merged pull requests via the GraphQL bulk query.
//!
//! Each page carries the PRs together with their commits, so the only
//! per-PR REST call left is the author lookup for nodes whose author came
//! back null.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::Fetched;
use crate::github::{normalize, FetchError, GitHubClient, PullRequestSource};
use crate::pr::{AuthorType, PullRequest, UNKNOWN_AUTHOR};

/// Collect merged PRs newest first, stopping at the first one merged
/// before `since`.
///
/// A failed page ends the walk; the PRs gathered from earlier pages are
/// returned alongside the error.
#[instrument(skip(client), fields(repo = %client.repository()))]
pub async fn merged_since(client: &GitHubClient, since: Option<DateTime<Utc>>) -> Fetched<FetchError> {
    let mut pull_requests = Vec::new();
    let mut after: Option<String> = None;
    let mut page = 1;

    loop {
        let connection = match client.query_pull_requests(after.as_deref()).await {
            Ok(connection) => connection,
            Err(e) => {
                warn!(page, error = %e, "bulk query failed");
                return Fetched::partial(pull_requests, e);
            }
        };
        info!(page, pull_requests = connection.nodes.len(), "fetched bulk page");

        for node in &connection.nodes {
            if let (Some(since), Some(merged_at)) = (since, node.merged_at) {
                if merged_at < since {
                    info!(
                        pr = node.number,
                        since = %since.format("%Y-%m-%d"),
                        total = pull_requests.len(),
                        "reached pull requests merged before since, stopping"
                    );
                    return Fetched::complete(pull_requests);
                }
            }

            let mut pr = normalize::from_graphql(node);
            if node.author.is_none() {
                recover_author(client, &mut pr).await;
            }
            pull_requests.push(pr);
        }

        if !connection.page_info.has_next_page {
            break;
        }
        match connection.page_info.end_cursor {
            Some(cursor) => after = Some(cursor),
            None => {
                warn!(page, "next page advertised without a cursor, stopping");
                break;
            }
        }
        page += 1;
    }

    info!(total = pull_requests.len(), "bulk fetch complete");
    Fetched::complete(pull_requests)
}

/// Fill in the author of `pr` from a single REST fetch. Falls back to
/// [`UNKNOWN_AUTHOR`] when that fails or has no author either.
pub async fn recover_author<S>(source: &S, pr: &mut PullRequest)
where
    S: PullRequestSource + ?Sized,
{
    warn!(pr = pr.number, "author missing from bulk response, fetching from REST API");

    match source.fetch_pull_request(pr.number).await {
        Ok(rest) if !rest.author.is_empty() => {
            pr.author = rest.author;
            pr.author_url = rest.author_url;
            pr.author_type = rest.author_type;
        }
        outcome => {
            if let Err(e) = outcome {
                debug!(pr = pr.number, error = %e, "author lookup failed");
            }
            pr.author = UNKNOWN_AUTHOR.to_string();
            pr.author_url = String::new();
            pr.author_type = AuthorType::User;
        }
    }
}
