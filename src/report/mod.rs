pub mod types;

pub use types::{AuthorCounts, Summary};

use crate::pr::{AuthorType, PullRequest, PullRequestDetails, Repository, UNKNOWN_AUTHOR};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Summarize harvested pull requests.
///
/// `error` is the message of whatever cut the harvest short, if anything.
pub fn build(
    repo: &Repository,
    source: &str,
    pull_requests: &[PullRequest],
    error: Option<String>,
) -> Summary {
    let mut authors = AuthorCounts::default();
    for pr in pull_requests {
        match pr.author_type {
            AuthorType::User => authors.users += 1,
            AuthorType::Organization => authors.organizations += 1,
            AuthorType::Bot => authors.bots += 1,
        }
    }

    let merges = pull_requests.iter().filter_map(|pr| pr.merged_at);

    Summary {
        repository: repo.to_string(),
        source: source.to_string(),
        pull_requests: pull_requests.len(),
        commits: pull_requests.iter().map(|pr| pr.commits.len()).sum(),
        merge_commits: pull_requests.iter().map(PullRequest::merge_commit_count).sum(),
        authors,
        unknown_authors: pull_requests
            .iter()
            .filter(|pr| pr.author == UNKNOWN_AUTHOR)
            .count(),
        newest_merge: merges.clone().max(),
        oldest_merge: merges.min(),
        error,
    }
}

/// Output the summary to terminal (default) or write a markdown changelog
/// draft of the pull requests to a file.
#[instrument(skip(summary, pull_requests), fields(repo = %summary.repository, prs = summary.pull_requests))]
pub fn output(
    summary: &Summary,
    pull_requests: &[PullRequest],
    output_path: Option<&Path>,
) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing summary to terminal");
            print_terminal_summary(summary);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing changelog draft to file");
            write_markdown(summary, pull_requests, path)
        }
    }
}

/// Print the summary to the terminal with colors.
///
/// ═══ org/repo (graphql) ═══
/// Pull requests: 42 | Commits: 180 (3 merge commits)
/// Authors: 38 users, 0 organizations, 4 bots
/// Merged: 2024-01-02 .. 2024-06-30
fn print_terminal_summary(summary: &Summary) {
    println!();
    println!("═══ {} ({}) ═══", summary.repository.bold(), summary.source);
    println!(
        "Pull requests: {} | Commits: {} ({} merge commits)",
        summary.pull_requests.to_string().green().bold(),
        summary.commits,
        summary.merge_commits
    );
    println!(
        "Authors: {} users, {} organizations, {} bots",
        summary.authors.users,
        summary.authors.organizations,
        summary.authors.bots.to_string().yellow()
    );
    if summary.unknown_authors > 0 {
        println!(
            "{}",
            format!("Unknown authors: {}", summary.unknown_authors).yellow()
        );
    }
    if let Some(range) = merge_range(summary) {
        println!("Merged: {range}");
    }
    if let Some(error) = &summary.error {
        println!("{} {}", "Incomplete:".red().bold(), error);
    }
    println!();
}

/// Write the pull requests as a markdown changelog draft, newest merge
/// first.
///
/// # org/repo
/// _42 pull requests, 180 commits (source: graphql)_
///
/// - #42 Add OAuth2 login flow (@alice, 2024-06-30)
///   - `abc1234` Add token refresh
fn write_markdown(
    summary: &Summary,
    pull_requests: &[PullRequest],
    path: &Path,
) -> Result<(), ReportError> {
    let mut ordered: Vec<&PullRequest> = pull_requests.iter().collect();
    ordered.sort_by(|a, b| b.merged_at.cmp(&a.merged_at).then(b.number.cmp(&a.number)));

    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", summary.repository));
    md.push_str(&format!(
        "_{} pull requests, {} commits (source: {})_\n\n",
        summary.pull_requests, summary.commits, summary.source
    ));
    if let Some(error) = &summary.error {
        md.push_str(&format!("> **Incomplete:** {}\n\n", error));
    }

    for pr in ordered {
        let merged = pr
            .merged_at
            .map(|at| format!(", {}", at.format("%Y-%m-%d")))
            .unwrap_or_default();
        md.push_str(&format!("- #{} {} (@{}{})\n", pr.number, pr.title, pr.author, merged));
        for commit in &pr.commits {
            let short: String = commit.sha.chars().take(7).collect();
            let headline = commit.message.lines().next().unwrap_or_default();
            md.push_str(&format!("  - `{}` {}\n", short, headline));
        }
    }

    std::fs::write(path, md)?;
    Ok(())
}

/// Print one line per validated pull request.
///
/// #42 open, mergeable
pub fn print_validation(details: &PullRequestDetails) {
    let mergeable = if details.mergeable {
        "mergeable".green()
    } else {
        "not mergeable".yellow()
    };
    println!("#{} {}, {}", details.number, details.state, mergeable);
}

fn merge_range(summary: &Summary) -> Option<String> {
    let newest = summary.newest_merge?;
    let oldest = summary.oldest_merge?;
    Some(format!(
        "{} .. {}",
        oldest.format("%Y-%m-%d"),
        newest.format("%Y-%m-%d")
    ))
}
