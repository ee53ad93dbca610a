use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::classify::{normalize_keyword, KeywordMatcher};
use crate::collector::{run_collection, CollectReport, XTimelineClient};
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::keywords::parse_keyword_upload;
use crate::models::{CategoryFilter, Post, PostFilter};
use crate::tui::AppAction;

pub struct App {
    // Data
    pub posts: Vec<Post>,
    pub keywords: Vec<String>,
    pub handles: Vec<String>,

    // UI State
    pub selected_index: usize,
    pub category_filter: CategoryFilter,
    pub keyword_filter: Option<usize>,
    pub handle_filter: Option<usize>,
    pub show_help: bool,
    pub keyword_input_active: bool,
    pub keyword_input: String,
    pub import_input_active: bool,
    pub import_input: String,
    pub status: Option<String>,

    // Async state
    pub is_collecting: bool,
    collect_rx: mpsc::Receiver<CollectReport>,
    collect_tx: mpsc::Sender<CollectReport>,

    // Services
    pub repository: Repository,
    producer: Option<Arc<XTimelineClient>>,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;

        let producer = config
            .bearer_token
            .as_ref()
            .map(|token| Arc::new(XTimelineClient::new(token.clone(), config.max_posts_per_handle)));

        let keywords = repository.get_keywords().await?;
        let posts = repository.query_posts(&PostFilter::default()).await?;

        let (collect_tx, collect_rx) = mpsc::channel(1);

        Ok(Self {
            posts,
            keywords,
            handles: config.handles.clone(),
            selected_index: 0,
            category_filter: CategoryFilter::All,
            keyword_filter: None,
            handle_filter: None,
            show_help: false,
            keyword_input_active: false,
            keyword_input: String::new(),
            import_input_active: false,
            import_input: String::new(),
            status: None,
            is_collecting: false,
            collect_rx,
            collect_tx,
            repository,
            producer,
        })
    }

    /// The query-layer filter for the current UI filter state.
    pub fn current_filter(&self) -> PostFilter {
        PostFilter {
            category: self.category_filter.as_category(),
            keyword: self
                .keyword_filter
                .and_then(|i| self.keywords.get(i).cloned()),
            handle: self
                .handle_filter
                .and_then(|i| self.handles.get(i))
                .map(|h| format!("@{h}")),
        }
    }

    pub fn keyword_filter_label(&self) -> String {
        self.keyword_filter
            .and_then(|i| self.keywords.get(i).cloned())
            .unwrap_or_else(|| "All".to_string())
    }

    pub fn handle_filter_label(&self) -> String {
        self.handle_filter
            .and_then(|i| self.handles.get(i))
            .map(|h| format!("@{h}"))
            .unwrap_or_else(|| "All".to_string())
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.posts.get(self.selected_index)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                if !self.posts.is_empty() && self.selected_index < self.posts.len() - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::MoveToTop => {
                self.selected_index = 0;
            }

            AppAction::MoveToBottom => {
                self.selected_index = self.posts.len().saturating_sub(1);
            }

            AppAction::Collect => {
                self.start_collection();
            }

            AppAction::OpenInBrowser => {
                if let Some(post) = self.selected_post() {
                    let url = post.url();
                    let _ = open::that(&url);
                }
            }

            AppAction::CycleCategoryFilter => {
                self.category_filter = self.category_filter.cycle();
                self.selected_index = 0;
                self.reload_posts().await?;
            }

            AppAction::CycleKeywordFilter => {
                self.keyword_filter = cycle_index(self.keyword_filter, self.keywords.len());
                self.selected_index = 0;
                self.reload_posts().await?;
            }

            AppAction::CycleHandleFilter => {
                self.handle_filter = cycle_index(self.handle_filter, self.handles.len());
                self.selected_index = 0;
                self.reload_posts().await?;
            }

            AppAction::ClearFilters => {
                self.category_filter = CategoryFilter::All;
                self.keyword_filter = None;
                self.handle_filter = None;
                self.selected_index = 0;
                self.reload_posts().await?;
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::AddKeywordStart => {
                self.keyword_input_active = true;
                self.keyword_input.clear();
            }

            AppAction::KeywordInputChar(c) => {
                self.keyword_input.push(c);
            }

            AppAction::KeywordInputBackspace => {
                self.keyword_input.pop();
            }

            AppAction::KeywordInputConfirm => {
                self.add_keyword_from_input().await?;
                self.keyword_input_active = false;
                self.keyword_input.clear();
            }

            AppAction::KeywordInputCancel => {
                self.keyword_input_active = false;
                self.keyword_input.clear();
            }

            AppAction::ImportStart => {
                self.import_input_active = true;
                self.import_input.clear();
            }

            AppAction::ImportInputChar(c) => {
                self.import_input.push(c);
            }

            AppAction::ImportInputBackspace => {
                self.import_input.pop();
            }

            AppAction::ImportInputConfirm => {
                let path = self.import_input.trim().to_string();
                self.import_input_active = false;
                self.import_input.clear();
                match self.import_keywords_from(Path::new(&path)).await {
                    Ok(added) => {
                        self.status = Some(format!("Added {added} keywords (duplicates ignored)"));
                    }
                    Err(e) => {
                        tracing::warn!("Keyword import failed: {e}");
                        self.status = Some(format!("Import failed: {e}"));
                    }
                }
            }

            AppAction::ImportInputCancel => {
                self.import_input_active = false;
                self.import_input.clear();
            }
        }

        Ok(false)
    }

    /// Hand a collection run to a background task. At most one run is in
    /// flight at a time; collection is refused outright when no keywords
    /// are configured, since every post would silently land in Financial
    /// Awareness.
    fn start_collection(&mut self) {
        if self.is_collecting {
            self.status = Some("Collection already running".to_string());
            return;
        }
        if self.keywords.is_empty() {
            self.status = Some("No keywords configured — add keywords first (a/i)".to_string());
            return;
        }
        if self.handles.is_empty() {
            self.status = Some("No handles configured — edit the config file".to_string());
            return;
        }
        let Some(producer) = &self.producer else {
            self.status = Some("No bearer_token configured — edit the config file".to_string());
            return;
        };

        // Keyword snapshot compiled once per cycle.
        let matcher = KeywordMatcher::compile(&self.keywords);
        let repo = self.repository.clone();
        let producer = Arc::clone(producer);
        let handles = self.handles.clone();
        let tx = self.collect_tx.clone();

        self.is_collecting = true;
        self.status = Some("Collecting...".to_string());

        tokio::spawn(async move {
            let report = run_collection(&repo, producer.as_ref(), &matcher, &handles).await;
            let _ = tx.send(report).await;
        });
    }

    /// Poll for a completed collection run (non-blocking).
    pub async fn poll_collect_result(&mut self) -> Result<()> {
        if let Ok(report) = self.collect_rx.try_recv() {
            self.is_collecting = false;
            self.status = Some(format!("Collected: {report}"));
            self.reload_posts().await?;
        }
        Ok(())
    }

    /// Run one collection cycle synchronously (headless modes).
    pub async fn collect_blocking(&mut self) -> Result<CollectReport> {
        if self.keywords.is_empty() {
            return Err(AppError::Config(
                "no keywords configured; import keywords before collecting".to_string(),
            ));
        }
        if self.handles.is_empty() {
            return Err(AppError::Config(
                "no handles configured; add handles to the config file".to_string(),
            ));
        }
        let Some(producer) = &self.producer else {
            return Err(AppError::Config(
                "no bearer_token configured; add one to the config file".to_string(),
            ));
        };

        let matcher = KeywordMatcher::compile(&self.keywords);
        let report = run_collection(&self.repository, producer.as_ref(), &matcher, &self.handles).await;
        self.reload_posts().await?;
        Ok(report)
    }

    pub async fn import_keywords_from(&mut self, path: &Path) -> Result<usize> {
        let payload = std::fs::read_to_string(path)?;
        let keywords = parse_keyword_upload(&payload)?;
        let added = self.repository.insert_keywords(keywords).await?;
        self.reload_keywords().await?;
        Ok(added)
    }

    async fn add_keyword_from_input(&mut self) -> Result<()> {
        let keyword = normalize_keyword(&self.keyword_input);
        if keyword.is_empty() {
            self.status = Some("Empty keyword ignored".to_string());
            return Ok(());
        }
        let added = self.repository.insert_keyword(&keyword).await?;
        self.reload_keywords().await?;
        self.status = Some(if added > 0 {
            format!("Added keyword {keyword}")
        } else {
            format!("Keyword {keyword} already present")
        });
        Ok(())
    }

    async fn reload_posts(&mut self) -> Result<()> {
        self.posts = self.repository.query_posts(&self.current_filter()).await?;
        if self.selected_index >= self.posts.len() {
            self.selected_index = self.posts.len().saturating_sub(1);
        }
        Ok(())
    }

    async fn reload_keywords(&mut self) -> Result<()> {
        self.keywords = self.repository.get_keywords().await?;
        // An active keyword filter may now point past the end.
        if let Some(i) = self.keyword_filter {
            if i >= self.keywords.len() {
                self.keyword_filter = None;
                self.reload_posts().await?;
            }
        }
        Ok(())
    }
}

/// Advance an optional index through `None -> 0 -> 1 -> ... -> len-1 -> None`.
fn cycle_index(current: Option<usize>, len: usize) -> Option<usize> {
    match current {
        None if len > 0 => Some(0),
        Some(i) if i + 1 < len => Some(i + 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_index_walks_the_range_and_wraps_to_none() {
        assert_eq!(cycle_index(None, 0), None);
        assert_eq!(cycle_index(None, 2), Some(0));
        assert_eq!(cycle_index(Some(0), 2), Some(1));
        assert_eq!(cycle_index(Some(1), 2), None);
        // Shrunk list: out-of-range index wraps back to None.
        assert_eq!(cycle_index(Some(5), 2), None);
    }
}
