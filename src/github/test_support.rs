//! Shared fixtures for tests that talk to a wiremock GitHub.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use wiremock::MockServer;

use super::GitHubClient;
use crate::config::Config;
use crate::pr::Repository;

/// Client for `org/repo` pointed at the mock server for both REST and GraphQL.
pub fn test_client(server: &MockServer) -> GitHubClient {
    let toml_str = format!(
        "[github]\ntoken = \"test-token\"\napi_url = \"{uri}\"\ngraphql_url = \"{uri}/graphql\"\ntimeout_secs = 5\n",
        uri = server.uri()
    );
    let config: Config = toml::from_str(&toml_str).unwrap();
    let repo = Repository {
        owner: "org".to_string(),
        name: "repo".to_string(),
    };
    GitHubClient::new(&config, repo).unwrap()
}

/// REST pull request body; `login: None` produces `"user": null`.
pub fn rest_pull(number: u64, login: Option<&str>) -> Value {
    let user = match login {
        Some(login) => json!({
            "login": login,
            "html_url": format!("https://github.com/{login}"),
            "type": "User"
        }),
        None => Value::Null,
    };
    json!({
        "number": number,
        "title": format!("PR {number}"),
        "body": "",
        "html_url": format!("https://github.com/org/repo/pull/{number}"),
        "merged_at": "2024-02-01T00:00:00Z",
        "merge_commit_sha": format!("merge{number}"),
        "user": user
    })
}

/// REST commit listing with a single commit.
pub fn rest_commits(number: u64) -> Value {
    json!([{
        "sha": format!("sha{number}"),
        "commit": {
            "message": format!("Commit for {number}\n"),
            "author": {"name": "Dev", "email": "dev@example.com", "date": "2024-01-31T00:00:00Z"}
        },
        "parents": [{"sha": "parent"}]
    }])
}

/// One node of the bulk query; `login: None` produces `"author": null`.
pub fn graphql_node(number: u64, merged_at: DateTime<Utc>, login: Option<&str>) -> Value {
    let author = match login {
        Some(login) => json!({
            "__typename": "User",
            "login": login,
            "url": format!("https://github.com/{login}")
        }),
        None => Value::Null,
    };
    json!({
        "number": number,
        "title": format!("PR {number}"),
        "body": "",
        "url": format!("https://github.com/org/repo/pull/{number}"),
        "mergedAt": merged_at.to_rfc3339(),
        "mergeCommit": {"oid": format!("merge{number}")},
        "author": author,
        "commits": {"nodes": [{"commit": {
            "oid": format!("sha{number}"),
            "message": format!("Commit for {number}"),
            "authoredDate": "2024-01-31T00:00:00Z",
            "author": {"name": "Dev", "email": "dev@example.com"},
            "parents": {"nodes": [{"oid": "parent"}]}
        }}]}
    })
}

/// Full GraphQL response body for one page of the bulk query.
pub fn graphql_page(nodes: Vec<Value>, has_next_page: bool, end_cursor: Option<&str>) -> Value {
    json!({
        "data": {
            "repository": {
                "pullRequests": {
                    "pageInfo": {"hasNextPage": has_next_page, "endCursor": end_cursor},
                    "nodes": nodes
                }
            }
        }
    })
}
