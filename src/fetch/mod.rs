pub mod bulk;
pub mod search;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

use crate::github::{FetchError, PullRequestSource};
use crate::pr::PullRequest;

/// Upper bound on concurrent per-PR fetches.
pub const MAX_IN_FLIGHT: usize = 10;

/// Pull requests gathered by a fetch, plus the error that cut it short or
/// that some items hit. Both are meaningful together: an error does not
/// invalidate the pull requests that were collected.
#[derive(Debug)]
pub struct Fetched<E> {
    pub pull_requests: Vec<PullRequest>,
    pub error: Option<E>,
}

impl<E> Fetched<E> {
    pub fn complete(pull_requests: Vec<PullRequest>) -> Self {
        Self {
            pull_requests,
            error: None,
        }
    }

    pub fn partial(pull_requests: Vec<PullRequest>, error: E) -> Self {
        Self {
            pull_requests,
            error: Some(error),
        }
    }
}

/// Per-PR failures from one [`fetch_batch`] call.
#[derive(Debug)]
pub struct BatchError {
    pub failures: Vec<(u64, FetchError)>,
}

impl BatchError {
    /// Numbers of the pull requests that failed, in completion order.
    pub fn numbers(&self) -> Vec<u64> {
        self.failures.iter().map(|(number, _)| *number).collect()
    }
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "some PRs failed to fetch ({}):", self.failures.len())?;
        for (number, error) in &self.failures {
            write!(f, " [#{number}: {error}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

/// Fetch every pull request in `numbers` from `source`, at most
/// [`MAX_IN_FLIGHT`] at a time.
///
/// Waits for all of them. A failure only affects its own number: every
/// input ends up either in `pull_requests` or in the returned
/// [`BatchError`]. Output order follows completion, not input.
///
/// The fetches are futures polled by the calling task: they overlap while
/// waiting on the network but never run in parallel on several cores.
#[instrument(skip_all, fields(count = numbers.len()))]
pub async fn fetch_batch<S>(source: &S, numbers: &[u64]) -> Fetched<BatchError>
where
    S: PullRequestSource + ?Sized,
{
    if numbers.is_empty() {
        return Fetched::complete(Vec::new());
    }

    let gate = Semaphore::new(MAX_IN_FLIGHT);
    let mut pending: FuturesUnordered<_> = numbers
        .iter()
        .map(|&number| gated_fetch(&gate, source, number))
        .collect();

    let mut pull_requests = Vec::with_capacity(numbers.len());
    let mut failures = Vec::new();
    while let Some((number, result)) = pending.next().await {
        match result {
            Ok(pr) => pull_requests.push(pr),
            Err(e) => {
                debug!(pr = number, error = %e, "fetch failed");
                failures.push((number, e));
            }
        }
    }

    debug!(fetched = pull_requests.len(), failed = failures.len(), "batch complete");
    if failures.is_empty() {
        Fetched::complete(pull_requests)
    } else {
        Fetched::partial(pull_requests, BatchError { failures })
    }
}

/// Fetch one number once `gate` hands out a permit, holding it for the
/// whole fetch.
async fn gated_fetch<S>(
    gate: &Semaphore,
    source: &S,
    number: u64,
) -> (u64, Result<PullRequest, FetchError>)
where
    S: PullRequestSource + ?Sized,
{
    let result = match gate.acquire().await {
        Ok(_permit) => source.fetch_pull_request(number).await,
        Err(_) => Err(FetchError::GateClosed),
    };
    (number, result)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pr::AuthorType;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Minimal pull request for use as a fetch result.
    pub fn sample_pr(number: u64) -> PullRequest {
        PullRequest {
            number,
            title: format!("PR {number}"),
            body: String::new(),
            url: format!("https://github.com/org/repo/pull/{number}"),
            merged_at: None,
            merge_commit: None,
            author: "alice".to_string(),
            author_url: "https://github.com/alice".to_string(),
            author_type: AuthorType::User,
            commits: vec![],
        }
    }

    /// Source that records how many fetches overlap and fails on request.
    #[derive(Default)]
    pub struct CountingSource {
        pub failing: HashSet<u64>,
        pub calls: AtomicUsize,
        in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl CountingSource {
        pub fn failing(numbers: &[u64]) -> Self {
            Self {
                failing: numbers.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl PullRequestSource for CountingSource {
        async fn fetch_pull_request(&self, number: u64) -> Result<PullRequest, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(5)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.failing.contains(&number) {
                return Err(FetchError::Status {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    message: format!("PR {number} unavailable"),
                });
            }
            Ok(sample_pr(number))
        }
    }

    #[tokio::test]
    async fn test_empty_input_issues_no_calls() {
        let source = CountingSource::default();
        let fetched = fetch_batch(&source, &[]).await;
        assert!(fetched.pull_requests.is_empty());
        assert!(fetched.error.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_partial_failures_are_aggregated() {
        let numbers: Vec<u64> = (1..=25).collect();
        let source = CountingSource::failing(&[4, 13, 21]);

        let fetched = fetch_batch(&source, &numbers).await;

        assert_eq!(fetched.pull_requests.len(), 22);
        let error = fetched.error.expect("aggregate error");
        let mut failed = error.numbers();
        failed.sort_unstable();
        assert_eq!(failed, vec![4, 13, 21]);

        let message = error.to_string();
        assert!(message.contains("#4:"));
        assert!(message.contains("#13:"));
        assert!(message.contains("#21:"));
    }

    #[tokio::test]
    async fn test_every_number_has_exactly_one_outcome() {
        let numbers: Vec<u64> = (100..140).collect();
        let source = CountingSource::failing(&[101, 120, 139]);

        let fetched = fetch_batch(&source, &numbers).await;
        let failed = fetched.error.as_ref().map(BatchError::numbers).unwrap_or_default();

        let mut seen: Vec<u64> = fetched.pull_requests.iter().map(|pr| pr.number).collect();
        seen.extend(failed);
        seen.sort_unstable();
        assert_eq!(seen, numbers);
        assert_eq!(source.calls.load(Ordering::SeqCst), numbers.len());
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_ceiling() {
        let numbers: Vec<u64> = (1..=35).collect();
        let source = CountingSource::default();

        let fetched = fetch_batch(&source, &numbers).await;

        assert_eq!(fetched.pull_requests.len(), 35);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), MAX_IN_FLIGHT);
    }

    #[tokio::test]
    async fn test_closed_gate_fails_without_calling_source() {
        let source = CountingSource::default();
        let gate = Semaphore::new(MAX_IN_FLIGHT);
        gate.close();

        let (number, result) = gated_fetch(&gate, &source, 7).await;

        assert_eq!(number, 7);
        assert!(matches!(result, Err(FetchError::GateClosed)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_ceiling_on_multi_thread_runtime() {
        let numbers: Vec<u64> = (1..=50).collect();
        let source = CountingSource::default();

        fetch_batch(&source, &numbers).await;

        assert!(source.max_in_flight.load(Ordering::SeqCst) <= MAX_IN_FLIGHT);
    }
}
