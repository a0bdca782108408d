//! Commit activity and contributor ranking

use super::note_failure;
use crate::collector::types::{CommitMetrics, ContributorCount};
use crate::github::pagination::PageSet;
use crate::github::records::Commit;
use std::collections::HashMap;

/// Count commits per login, highest first, ties by login. Commits without a
/// linked account are not ranked.
pub fn rank_contributors(commits: &[Commit]) -> Vec<ContributorCount> {
    let mut per_login: HashMap<&str, u64> = HashMap::new();
    for commit in commits {
        if let Some(author) = &commit.author {
            *per_login.entry(author.login.as_str()).or_default() += 1;
        }
    }

    let mut ranked: Vec<ContributorCount> = per_login
        .into_iter()
        .map(|(login, commits)| ContributorCount {
            login: login.to_string(),
            commits,
        })
        .collect();
    ranked.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.login.cmp(&b.login)));
    ranked
}

/// `commits` holds the listing since 30 days ago.
pub fn extract_commit_metrics(commits: &PageSet<Commit>, top_n: usize) -> CommitMetrics {
    let mut errors = Vec::new();
    note_failure(&mut errors, "commits.count_30d", &commits.response);

    let ranked = commits.items().map(rank_contributors);

    CommitMetrics {
        count_30d: commits.items().map(|c| c.len() as u64),
        authors_30d: ranked.as_ref().map(|r| r.len() as u64),
        top: ranked
            .map(|r| r.into_iter().take(top_n).collect())
            .unwrap_or_default(),
        available: commits.response.is_success(),
        truncated: commits.truncated,
        errors,
    }
}
