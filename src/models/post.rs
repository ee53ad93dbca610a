use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post category. Stored in the database as the display strings below;
/// `matched_keyword` is present exactly when the category is `StockSpecific`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    StockSpecific,
    FinancialAwareness,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::StockSpecific => "Stock-Specific",
            Category::FinancialAwareness => "Financial Awareness",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "Stock-Specific" => Some(Category::StockSpecific),
            "Financial Awareness" => Some(Category::FinancialAwareness),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw post as yielded by a producer, before classification.
#[derive(Debug, Clone)]
pub struct RawPost {
    /// Platform-native post id.
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A classified post ready for insertion.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: String,
    /// Author handle including the leading `@`.
    pub handle: String,
    pub content: String,
    pub category: Category,
    pub matched_keyword: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A stored post as read back from the database.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub handle: String,
    pub content: String,
    pub category: Category,
    pub matched_keyword: Option<String>,
    pub created_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
}

impl Post {
    /// Web URL of the post on x.com.
    pub fn url(&self) -> String {
        let handle = self.handle.trim_start_matches('@');
        format!("https://x.com/{}/status/{}", handle, self.id)
    }
}

/// Query-layer filter. `None` means no restriction on that field.
/// The keyword filter is exact equality against the stored normalized
/// `matched_keyword`, never a re-scan of the content.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub category: Option<Category>,
    pub keyword: Option<String>,
    pub handle: Option<String>,
}

/// Category filter state for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    StockSpecific,
    FinancialAwareness,
}

impl CategoryFilter {
    pub fn cycle(&self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::StockSpecific,
            CategoryFilter::StockSpecific => CategoryFilter::FinancialAwareness,
            CategoryFilter::FinancialAwareness => CategoryFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::StockSpecific => "Stock-Specific",
            CategoryFilter::FinancialAwareness => "Financial Awareness",
        }
    }

    pub fn as_category(&self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::StockSpecific => Some(Category::StockSpecific),
            CategoryFilter::FinancialAwareness => Some(Category::FinancialAwareness),
        }
    }
}

/// Aggregate counts over a set of posts, as shown in the dashboard header.
#[derive(Debug, Clone, Default)]
pub struct PostStats {
    pub total: usize,
    pub stock_specific: usize,
    pub awareness: usize,
    /// Keyword frequencies among Stock-Specific posts, most frequent first.
    /// Ties break alphabetically so the display is stable.
    pub top_keywords: Vec<(String, usize)>,
}

impl PostStats {
    pub fn from_posts(posts: &[Post], top_n: usize) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut stock_specific = 0;
        for post in posts {
            if post.category == Category::StockSpecific {
                stock_specific += 1;
                if let Some(keyword) = post.matched_keyword.as_deref() {
                    *counts.entry(keyword).or_insert(0) += 1;
                }
            }
        }

        let mut top_keywords: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(k, c)| (k.to_string(), c))
            .collect();
        top_keywords.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_keywords.truncate(top_n);

        Self {
            total: posts.len(),
            stock_specific,
            awareness: posts.len() - stock_specific,
            top_keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, category: Category, keyword: Option<&str>) -> Post {
        Post {
            id: id.to_string(),
            handle: "@trader".to_string(),
            content: "text".to_string(),
            category,
            matched_keyword: keyword.map(String::from),
            created_at: Utc::now(),
            collected_at: Utc::now(),
        }
    }

    #[test]
    fn category_roundtrips_through_db_strings() {
        for category in [Category::StockSpecific, Category::FinancialAwareness] {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("stock-specific"), None);
    }

    #[test]
    fn stats_count_categories_and_rank_keywords() {
        let posts = vec![
            post("1", Category::StockSpecific, Some("TCS")),
            post("2", Category::StockSpecific, Some("TCS")),
            post("3", Category::StockSpecific, Some("BAJAJ-AUTO")),
            post("4", Category::FinancialAwareness, None),
        ];

        let stats = PostStats::from_posts(&posts, 10);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.stock_specific, 3);
        assert_eq!(stats.awareness, 1);
        assert_eq!(
            stats.top_keywords,
            vec![("TCS".to_string(), 2), ("BAJAJ-AUTO".to_string(), 1)]
        );
    }

    #[test]
    fn stats_truncate_to_top_n() {
        let posts = vec![
            post("1", Category::StockSpecific, Some("TCS")),
            post("2", Category::StockSpecific, Some("INFY")),
            post("3", Category::StockSpecific, Some("WIPRO")),
        ];

        let stats = PostStats::from_posts(&posts, 2);
        assert_eq!(stats.top_keywords.len(), 2);
    }

    #[test]
    fn post_url_strips_handle_marker() {
        let p = post("123456", Category::FinancialAwareness, None);
        assert_eq!(p.url(), "https://x.com/trader/status/123456");
    }

    #[test]
    fn category_filter_cycles_through_all_states() {
        let start = CategoryFilter::All;
        assert_eq!(start.cycle().cycle().cycle(), start);
        assert_eq!(CategoryFilter::All.as_category(), None);
        assert_eq!(
            CategoryFilter::StockSpecific.as_category(),
            Some(Category::StockSpecific)
        );
    }
}
