use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::article::{Article, ManualArticle};
use crate::fetcher::{FetchError, Fetcher};
use crate::merge::merge;
use crate::store::{Store, Theme};

/// Outcome of a manual submission.
#[derive(Debug, Clone, Serialize)]
pub struct ManualOutcome {
    pub article: Article,
    /// False when the article was only added locally because no backend
    /// endpoint accepts manual articles.
    pub submitted: bool,
    /// False when an article with the same id was already in the feed. The
    /// feed's copy is returned in that case.
    pub added: bool,
}

/// Owns the feed for the lifetime of the process.
pub struct FeedSession {
    articles: RwLock<Vec<Article>>,
    fetcher: Fetcher,
    store: Store,
    keyword: Option<String>,
    /// Sync cycles currently in flight.
    syncing: AtomicUsize,
}

/// Counts a sync cycle as in flight until dropped.
struct SyncGuard<'a>(&'a AtomicUsize);

impl<'a> SyncGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FeedSession {
    pub fn new(fetcher: Fetcher, store: Store, keyword: Option<String>) -> Self {
        Self {
            articles: RwLock::new(Vec::new()),
            fetcher,
            store,
            keyword,
            syncing: AtomicUsize::new(0),
        }
    }

    /// Seed the feed from the store. Returns the number of articles loaded.
    pub async fn hydrate(&self) -> anyhow::Result<usize> {
        let loaded = self.store.load().await?.unwrap_or_default();
        let count = loaded.len();
        *self.articles.write().await = loaded;
        info!("Hydrated feed with {} stored articles", count);
        Ok(count)
    }

    pub async fn articles(&self) -> Vec<Article> {
        self.articles.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.articles.read().await.is_empty()
    }

    pub async fn find(&self, id: &str) -> Option<Article> {
        self.articles
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Articles whose title or summary contains `query`, ignoring case.
    pub async fn search(&self, query: &str) -> Vec<Article> {
        let query = query.trim();
        let articles = self.articles.read().await;
        if query.is_empty() {
            return articles.clone();
        }
        articles.iter().filter(|a| a.matches(query)).cloned().collect()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst) > 0
    }

    /// Fetch, merge and persist once. Returns how many articles were added.
    pub async fn sync_once(&self) -> usize {
        let _guard = SyncGuard::enter(&self.syncing);
        let incoming = self.fetcher.fetch_articles(self.keyword.as_deref()).await;
        self.absorb(incoming).await
    }

    async fn absorb(&self, incoming: Vec<Article>) -> usize {
        if incoming.is_empty() {
            return 0;
        }

        // Held through the save: the store always matches the latest merge
        let mut articles = self.articles.write().await;
        let merged = merge(std::mem::take(&mut *articles), incoming);
        let added = merged.added;
        *articles = merged.articles;
        if added == 0 {
            return 0;
        }
        info!("Merged {} new articles into feed", added);

        if let Err(e) = self.store.save(&articles).await {
            warn!("Failed to persist feed: {}", e);
        }
        added
    }

    /// Submit a manually entered article. Without a manual endpoint the
    /// article is kept locally as a placeholder.
    pub async fn add_manual(&self, manual: ManualArticle) -> Result<ManualOutcome, FetchError> {
        let (article, submitted) = if self.fetcher.accepts_manual() {
            (self.fetcher.submit_manual(&manual).await?, true)
        } else {
            info!("No manual endpoint configured, adding article locally");
            (manual.placeholder(Local::now()), false)
        };

        if self.absorb(vec![article.clone()]).await > 0 {
            return Ok(ManualOutcome {
                article,
                submitted,
                added: true,
            });
        }

        warn!("Article {} is already in the feed", article.id);
        let article = self.find(&article.id).await.unwrap_or(article);
        Ok(ManualOutcome {
            article,
            submitted,
            added: false,
        })
    }

    /// Empty both the in-memory feed and its persisted copy. Memory is only
    /// emptied once the store is cleared.
    pub async fn clear(&self) -> anyhow::Result<()> {
        let mut articles = self.articles.write().await;
        self.store.clear().await?;
        articles.clear();
        info!("Feed cleared");
        Ok(())
    }

    pub async fn theme(&self) -> anyhow::Result<Theme> {
        self.store.load_theme().await
    }

    pub async fn set_theme(&self, theme: Theme) -> anyhow::Result<()> {
        self.store.save_theme(theme).await
    }
}

/// Re-run [`FeedSession::sync_once`] every `interval` until `cancel` turns
/// true or its sender goes away. The first cycle runs immediately.
pub async fn start_polling(
    session: Arc<FeedSession>,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Polling every {:?}", interval);
    loop {
        if *cancel.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                session.sync_once().await;
            }
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
        }
    }
    info!("Polling stopped");
}
