use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::classify::normalize_keyword;
use crate::error::Result;
use crate::models::{Category, NewPost, Post, PostFilter};

use super::schema::SCHEMA;

/// Outcome of storing one producer's batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Storage handle. Cheap to clone; every unit of work receives one
/// explicitly instead of reaching for process-wide state.
#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Post operations

    /// Store one batch of classified posts inside a single transaction.
    ///
    /// A post whose id already exists is silently ignored and counted as a
    /// duplicate. A per-record write failure is logged and counted without
    /// aborting the rest of the batch. Nothing becomes visible to readers
    /// until the transaction commits.
    pub async fn insert_posts(&self, posts: Vec<NewPost>) -> Result<BatchOutcome> {
        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut outcome = BatchOutcome::default();
                for post in &posts {
                    let result = tx.execute(
                        r#"INSERT OR IGNORE INTO posts (id, handle, content, category, matched_keyword, created_at)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                        params![
                            post.id,
                            post.handle,
                            post.content,
                            post.category.as_str(),
                            post.matched_keyword,
                            post.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                        ],
                    );
                    match result {
                        Ok(0) => outcome.duplicates += 1,
                        Ok(_) => outcome.inserted += 1,
                        Err(e) => {
                            tracing::warn!("Failed to store post {}: {}", post.id, e);
                            outcome.failed += 1;
                        }
                    }
                }
                tx.commit()?;
                Ok(outcome)
            })
            .await?;
        Ok(outcome)
    }

    /// Query stored posts, newest first by original post timestamp.
    ///
    /// The keyword filter is exact equality against the stored normalized
    /// `matched_keyword`; content is never re-scanned.
    pub async fn query_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let filter = filter.clone();
        let posts = self
            .conn
            .call(move |conn| {
                let mut sql = String::from(
                    "SELECT id, handle, content, category, matched_keyword, created_at, collected_at FROM posts",
                );
                let mut clauses: Vec<&str> = Vec::new();
                let mut args: Vec<String> = Vec::new();

                if let Some(category) = filter.category {
                    clauses.push("category = ?");
                    args.push(category.as_str().to_string());
                }
                if let Some(keyword) = filter.keyword {
                    clauses.push("matched_keyword = ?");
                    args.push(keyword);
                }
                if let Some(handle) = filter.handle {
                    clauses.push("handle = ?");
                    args.push(handle);
                }

                if !clauses.is_empty() {
                    sql.push_str(" WHERE ");
                    sql.push_str(&clauses.join(" AND "));
                }
                sql.push_str(" ORDER BY datetime(created_at) DESC");

                let mut stmt = conn.prepare(&sql)?;
                let posts = stmt
                    .query_map(rusqlite::params_from_iter(args.iter()), post_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(posts)
            })
            .await?;
        Ok(posts)
    }

    // Keyword operations

    /// Insert keywords, normalizing each and ignoring duplicates.
    /// Returns how many were actually added. Keywords that normalize to
    /// empty are skipped.
    pub async fn insert_keywords(&self, keywords: Vec<String>) -> Result<usize> {
        let added = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut added = 0;
                for raw in &keywords {
                    let keyword = normalize_keyword(raw);
                    if keyword.is_empty() {
                        continue;
                    }
                    added += tx.execute(
                        "INSERT OR IGNORE INTO keywords (keyword) VALUES (?1)",
                        params![keyword],
                    )?;
                }
                tx.commit()?;
                Ok(added)
            })
            .await?;
        Ok(added)
    }

    pub async fn insert_keyword(&self, keyword: &str) -> Result<usize> {
        self.insert_keywords(vec![keyword.to_string()]).await
    }

    /// The full current keyword set, alphabetical. Supplied-order priority
    /// for matching is the order this returns.
    pub async fn get_keywords(&self) -> Result<Vec<String>> {
        let keywords = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT keyword FROM keywords ORDER BY keyword ASC")?;
                let keywords = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(keywords)
            })
            .await?;
        Ok(keywords)
    }
}

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    let category: String = row.get(3)?;
    let category = Category::parse(&category).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown category {category:?}").into(),
        )
    })?;

    Ok(Post {
        id: row.get(0)?,
        handle: row.get(1)?,
        content: row.get(2)?,
        category,
        matched_keyword: row.get(4)?,
        created_at: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        collected_at: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56Z")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    fn new_post(id: &str, handle: &str, keyword: Option<&str>, created_at: &str) -> NewPost {
        NewPost {
            id: id.to_string(),
            handle: handle.to_string(),
            content: format!("post {id}"),
            category: match keyword {
                Some(_) => Category::StockSpecific,
                None => Category::FinancialAwareness,
            },
            matched_keyword: keyword.map(String::from),
            created_at: DateTime::parse_from_rfc3339(created_at)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[tokio::test]
    async fn reinserting_an_existing_id_is_a_counted_no_op() {
        let (_dir, repo) = repo().await;
        let post = new_post("1", "@trader", Some("TCS"), "2026-08-01T10:00:00Z");

        let first = repo.insert_posts(vec![post.clone()]).await.unwrap();
        assert_eq!(first, BatchOutcome { inserted: 1, duplicates: 0, failed: 0 });

        let second = repo.insert_posts(vec![post]).await.unwrap();
        assert_eq!(second, BatchOutcome { inserted: 0, duplicates: 1, failed: 0 });

        let posts = repo.query_posts(&PostFilter::default()).await.unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let (_dir, repo) = repo().await;
        let outcome = repo.insert_posts(Vec::new()).await.unwrap();
        assert_eq!(outcome, BatchOutcome::default());
    }

    #[tokio::test]
    async fn posts_come_back_newest_first() {
        let (_dir, repo) = repo().await;
        repo.insert_posts(vec![
            new_post("old", "@a", None, "2026-08-01T10:00:00Z"),
            new_post("new", "@a", None, "2026-08-03T10:00:00Z"),
            new_post("mid", "@a", None, "2026-08-02T10:00:00Z"),
        ])
        .await
        .unwrap();

        let posts = repo.query_posts(&PostFilter::default()).await.unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn filters_compose_and_keyword_filter_is_exact() {
        let (_dir, repo) = repo().await;
        repo.insert_posts(vec![
            new_post("1", "@a", Some("TCS"), "2026-08-01T10:00:00Z"),
            new_post("2", "@a", Some("TCSX"), "2026-08-01T11:00:00Z"),
            new_post("3", "@b", Some("TCS"), "2026-08-01T12:00:00Z"),
            new_post("4", "@a", None, "2026-08-01T13:00:00Z"),
        ])
        .await
        .unwrap();

        let filter = PostFilter {
            category: Some(Category::StockSpecific),
            keyword: Some("TCS".to_string()),
            handle: None,
        };
        let posts = repo.query_posts(&filter).await.unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);

        let filter = PostFilter {
            category: None,
            keyword: None,
            handle: Some("@a".to_string()),
        };
        let posts = repo.query_posts(&filter).await.unwrap();
        assert_eq!(posts.len(), 3);

        let filter = PostFilter {
            category: Some(Category::FinancialAwareness),
            keyword: None,
            handle: None,
        };
        let posts = repo.query_posts(&filter).await.unwrap();
        assert_eq!(posts[0].id, "4");
        assert!(posts[0].matched_keyword.is_none());
    }

    #[tokio::test]
    async fn no_match_returns_empty_vec() {
        let (_dir, repo) = repo().await;
        let filter = PostFilter {
            keyword: Some("TCS".to_string()),
            ..Default::default()
        };
        let posts = repo.query_posts(&filter).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn stored_timestamps_round_trip() {
        let (_dir, repo) = repo().await;
        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 10, 30, 0).unwrap();
        let mut post = new_post("1", "@a", None, "2026-08-01T10:00:00Z");
        post.created_at = ts;
        repo.insert_posts(vec![post]).await.unwrap();

        let posts = repo.query_posts(&PostFilter::default()).await.unwrap();
        assert_eq!(posts[0].created_at, ts);
    }

    #[tokio::test]
    async fn keyword_variants_dedup_to_one_row() {
        let (_dir, repo) = repo().await;
        let added = repo
            .insert_keywords(vec![
                "tcs".to_string(),
                " TCS ".to_string(),
                "Tcs".to_string(),
                "bajaj\u{2013}auto".to_string(),
                "   ".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let keywords = repo.get_keywords().await.unwrap();
        assert_eq!(keywords, vec!["BAJAJ-AUTO".to_string(), "TCS".to_string()]);
    }

    #[tokio::test]
    async fn keywords_are_never_deleted_by_reinsertion() {
        let (_dir, repo) = repo().await;
        repo.insert_keyword("TCS").await.unwrap();
        let added = repo.insert_keyword("TCS").await.unwrap();
        assert_eq!(added, 0);
        assert_eq!(repo.get_keywords().await.unwrap().len(), 1);
    }
}
