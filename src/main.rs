mod config;
mod fetch;
mod github;
mod pr;
mod report;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

/// PR Harvest: collects merged GitHub Pull Requests and their commits as
/// input for changelog generation.
#[derive(Parser, Debug)]
#[command(name = "pr-harvest", version, about)]
struct Cli {
    /// Repository as owner/repo or https://github.com/owner/repo
    ///
    /// Falls back to repository.slug in .pr-harvest.toml.
    repo: Option<String>,

    /// Only PRs merged on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_since)]
    since: Option<DateTime<Utc>>,

    /// How to list merged PRs
    #[arg(long, value_enum, default_value_t = Strategy::Graphql)]
    strategy: Strategy,

    /// Fetch exactly these PR numbers instead of listing merged PRs
    #[arg(long = "pr", value_name = "NUMBER")]
    numbers: Vec<u64>,

    /// Only report state and mergeability of the --pr numbers, without
    /// fetching commits
    #[arg(long, requires = "numbers")]
    validate: bool,

    /// Optional output file path for a markdown changelog draft
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// REST issue search, then per-PR detail and commit fetches
    Search,
    /// GraphQL bulk query with commits inline
    Graphql,
}

/// Parse a calendar date as midnight UTC.
fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;

    let slug = cli
        .repo
        .clone()
        .or_else(|| config.repository.slug.clone())
        .ok_or("a repository is required: pass owner/repo or set repository.slug in .pr-harvest.toml")?;
    let repo = pr::parse_repository(&slug)?;
    debug!(owner = %repo.owner, name = %repo.name, "parsed repository");

    let _main_span = info_span!("pr_harvest", repo = %repo).entered();

    if config.github_token().is_none() {
        warn!("no GitHub token configured, using unauthenticated requests");
    }
    let client = github::GitHubClient::new(&config, repo.clone())?;

    if cli.validate {
        info!(count = cli.numbers.len(), "validating pull requests");
        for &number in &cli.numbers {
            let details = client.validation_details(number).await?;
            report::print_validation(&details);
        }
        return Ok(());
    }

    let (source, pull_requests, error): (&str, _, Option<Box<dyn std::error::Error>>) =
        if !cli.numbers.is_empty() {
            info!(count = cli.numbers.len(), "fetching pull requests by number");
            let fetched = fetch::fetch_batch(&client, &cli.numbers).await;
            if let Some(e) = &fetched.error {
                warn!(failed = ?e.numbers(), "some pull requests could not be fetched");
            }
            ("numbers", fetched.pull_requests, fetched.error.map(Into::into))
        } else {
            match cli.strategy {
                Strategy::Search => {
                    info!(since = ?cli.since, "fetching merged pull requests via search");
                    let fetched = fetch::search::merged_since(&client, cli.since).await;
                    ("search", fetched.pull_requests, fetched.error.map(Into::into))
                }
                Strategy::Graphql => {
                    info!(since = ?cli.since, "fetching merged pull requests via GraphQL");
                    let fetched = fetch::bulk::merged_since(&client, cli.since).await;
                    ("graphql", fetched.pull_requests, fetched.error.map(Into::into))
                }
            }
        };
    info!(pull_requests = pull_requests.len(), source, "harvest complete");

    let summary = report::build(&repo, source, &pull_requests, error.as_ref().map(|e| e.to_string()));
    report::output(&summary, &pull_requests, cli.output.as_deref())?;

    if summary.is_partial() {
        warn!("harvest incomplete, output contains partial results");
    }
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_since() {
        assert_eq!(
            parse_since("2024-01-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_since("01/01/2024").is_err());
    }

    #[test]
    fn test_cli_defaults_to_graphql() {
        let cli = Cli::try_parse_from(["pr-harvest", "org/repo"]).unwrap();
        assert_eq!(cli.strategy, Strategy::Graphql);
        assert!(cli.numbers.is_empty());
        assert!(cli.since.is_none());
        assert!(!cli.validate);
    }

    #[test]
    fn test_cli_validate_requires_numbers() {
        assert!(Cli::try_parse_from(["pr-harvest", "org/repo", "--validate"]).is_err());

        let cli = Cli::try_parse_from(["pr-harvest", "org/repo", "--validate", "--pr", "3"]).unwrap();
        assert!(cli.validate);
        assert_eq!(cli.numbers, vec![3]);
    }

    #[test]
    fn test_cli_parses_numbers_and_strategy() {
        let cli = Cli::try_parse_from([
            "pr-harvest", "org/repo", "--strategy", "search", "--since", "2024-03-01", "--pr", "4",
            "--pr", "9",
        ])
        .unwrap();
        assert_eq!(cli.strategy, Strategy::Search);
        assert_eq!(cli.numbers, vec![4, 9]);
        assert_eq!(cli.since, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
    }
}
