use futures::stream::{self, StreamExt};

use crate::classify::KeywordMatcher;
use crate::db::Repository;
use crate::models::{NewPost, RawPost};

use super::PostProducer;

// Max concurrent handle fetches
const MAX_CONCURRENT_FETCHES: usize = 5;

/// Summary of one collection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectReport {
    pub handles: usize,
    pub handles_failed: usize,
    pub fetched: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl std::fmt::Display for CollectReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} new, {} duplicates, {} failed across {} handles ({} unreachable)",
            self.inserted, self.duplicates, self.failed, self.handles, self.handles_failed
        )
    }
}

/// Run one collection cycle over `handles`.
///
/// Fetches each handle's recent posts concurrently, then classifies and
/// stores one handle's batch at a time, each batch committed as a unit.
/// No failure is fatal to the cycle: an unreachable handle is logged and
/// skipped, a failed batch write is logged and the next handle proceeds.
/// Safe to re-run over overlapping windows; the id constraint turns
/// re-collected posts into counted duplicates.
pub async fn run_collection(
    repo: &Repository,
    producer: &dyn PostProducer,
    matcher: &KeywordMatcher,
    handles: &[String],
) -> CollectReport {
    let mut report = CollectReport {
        handles: handles.len(),
        ..Default::default()
    };

    tracing::info!(
        "Starting cycle: {} handles | {} keywords",
        handles.len(),
        matcher.len()
    );
    if matcher.is_empty() {
        tracing::warn!("Keyword set is empty; every post will be Financial Awareness");
    }

    let fetches: Vec<(String, crate::error::Result<Vec<RawPost>>)> =
        stream::iter(handles.iter().cloned())
        .map(|handle| async move {
            let result = producer.fetch_posts(&handle).await;
            (handle, result)
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    for (handle, result) in fetches {
        let raw_posts = match result {
            Ok(raw_posts) => raw_posts,
            Err(e) => {
                tracing::warn!("Skipping @{handle}: {e}");
                report.handles_failed += 1;
                continue;
            }
        };

        report.fetched += raw_posts.len();
        let batch = classify_batch(&handle, raw_posts, matcher);

        match repo.insert_posts(batch).await {
            Ok(outcome) => {
                tracing::info!(
                    "Committed @{handle}: {} new, {} duplicates, {} failed",
                    outcome.inserted,
                    outcome.duplicates,
                    outcome.failed
                );
                report.inserted += outcome.inserted;
                report.duplicates += outcome.duplicates;
                report.failed += outcome.failed;
            }
            Err(e) => {
                tracing::error!("Failed to commit batch for @{handle}: {e}");
                report.handles_failed += 1;
            }
        }
    }

    tracing::info!("Cycle complete: {report}");
    report
}

fn classify_batch(handle: &str, raw_posts: Vec<RawPost>, matcher: &KeywordMatcher) -> Vec<NewPost> {
    raw_posts
        .into_iter()
        .map(|raw| {
            let classification = matcher.classify(&raw.text);
            NewPost {
                id: raw.id,
                handle: format!("@{handle}"),
                content: raw.text,
                category: classification.category,
                matched_keyword: classification.matched_keyword,
                created_at: raw.created_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use crate::error::{AppError, Result};
    use crate::models::{Category, PostFilter};

    use super::*;

    struct StubProducer {
        timelines: HashMap<String, Vec<RawPost>>,
        failing: Vec<String>,
    }

    impl StubProducer {
        fn new() -> Self {
            Self {
                timelines: HashMap::new(),
                failing: Vec::new(),
            }
        }

        fn with_posts(mut self, handle: &str, posts: Vec<RawPost>) -> Self {
            self.timelines.insert(handle.to_string(), posts);
            self
        }

        fn with_failure(mut self, handle: &str) -> Self {
            self.failing.push(handle.to_string());
            self
        }
    }

    #[async_trait]
    impl PostProducer for StubProducer {
        async fn fetch_posts(&self, handle: &str) -> Result<Vec<RawPost>> {
            if self.failing.iter().any(|h| h == handle) {
                return Err(AppError::XApi(format!("unreachable: {handle}")));
            }
            Ok(self.timelines.get(handle).cloned().unwrap_or_default())
        }
    }

    fn raw(id: &str, text: &str) -> RawPost {
        RawPost {
            id: id.to_string(),
            text: text.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        }
    }

    async fn repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    fn handles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn classifies_and_stores_posts_per_handle() {
        let (_dir, repo) = repo().await;
        let producer = StubProducer::new()
            .with_posts("trader", vec![raw("1", "Buying $TCS today"), raw("2", "markets look calm")])
            .with_posts("analyst", vec![raw("3", "BAJAJ-AUTO hits 52-week high")]);
        let matcher = KeywordMatcher::compile(["TCS", "BAJAJ-AUTO"]);

        let report =
            run_collection(&repo, &producer, &matcher, &handles(&["trader", "analyst"])).await;

        assert_eq!(report.handles, 2);
        assert_eq!(report.handles_failed, 0);
        assert_eq!(report.fetched, 3);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.duplicates, 0);

        let posts = repo.query_posts(&PostFilter::default()).await.unwrap();
        assert_eq!(posts.len(), 3);

        let by_id = |id: &str| posts.iter().find(|p| p.id == id).unwrap();
        assert_eq!(by_id("1").category, Category::StockSpecific);
        assert_eq!(by_id("1").matched_keyword.as_deref(), Some("TCS"));
        assert_eq!(by_id("1").handle, "@trader");
        assert_eq!(by_id("2").category, Category::FinancialAwareness);
        assert_eq!(by_id("2").matched_keyword, None);
        assert_eq!(by_id("3").matched_keyword.as_deref(), Some("BAJAJ-AUTO"));
        assert_eq!(by_id("3").handle, "@analyst");
    }

    #[tokio::test]
    async fn recollecting_overlapping_windows_is_idempotent() {
        let (_dir, repo) = repo().await;
        let producer = StubProducer::new().with_posts("trader", vec![raw("1", "Buying $TCS today")]);
        let matcher = KeywordMatcher::compile(["TCS"]);
        let handles = handles(&["trader"]);

        let first = run_collection(&repo, &producer, &matcher, &handles).await;
        assert_eq!(first.inserted, 1);

        let second = run_collection(&repo, &producer, &matcher, &handles).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 1);

        let posts = repo.query_posts(&PostFilter::default()).await.unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn an_unreachable_handle_does_not_abort_the_cycle() {
        let (_dir, repo) = repo().await;
        let producer = StubProducer::new()
            .with_failure("flaky")
            .with_posts("trader", vec![raw("1", "TCS results out")]);
        let matcher = KeywordMatcher::compile(["TCS"]);

        let report =
            run_collection(&repo, &producer, &matcher, &handles(&["flaky", "trader"])).await;

        assert_eq!(report.handles_failed, 1);
        assert_eq!(report.inserted, 1);
        let posts = repo.query_posts(&PostFilter::default()).await.unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn empty_timelines_and_empty_handle_lists_are_no_ops() {
        let (_dir, repo) = repo().await;
        let producer = StubProducer::new().with_posts("quiet", Vec::new());
        let matcher = KeywordMatcher::compile(["TCS"]);

        let report = run_collection(&repo, &producer, &matcher, &handles(&["quiet"])).await;
        assert_eq!(report.fetched, 0);
        assert_eq!(report.inserted, 0);

        let report = run_collection(&repo, &producer, &matcher, &[]).await;
        assert_eq!(report, CollectReport::default());
    }

    #[tokio::test]
    async fn empty_keyword_set_stores_everything_as_awareness() {
        let (_dir, repo) = repo().await;
        let producer = StubProducer::new().with_posts("trader", vec![raw("1", "Buying $TCS today")]);
        let matcher = KeywordMatcher::compile(std::iter::empty::<&str>());

        run_collection(&repo, &producer, &matcher, &handles(&["trader"])).await;

        let posts = repo.query_posts(&PostFilter::default()).await.unwrap();
        assert_eq!(posts[0].category, Category::FinancialAwareness);
    }
}
